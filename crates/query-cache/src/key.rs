//! Keys that scope cached fetches and their subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one cached fetch: a resource name plus parameters.
///
/// Parameter values are canonicalized to JSON when the key is built, so
/// two keys constructed from logically equal values compare equal no
/// matter what types produced them. Parameters are kept sorted by name;
/// setting a name twice replaces the earlier value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    resource: String,
    params: Vec<(String, String)>,
}

impl QueryKey {
    /// Key for a resource with no parameters.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: Vec::new(),
        }
    }

    /// Add (or replace) a parameter.
    ///
    /// Values that fail to serialize are recorded as JSON `null`; keys
    /// are identifiers, so this never aborts key construction.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        let value = serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string());
        match self.params.binary_search_by(|(n, _)| n.as_str().cmp(&name)) {
            Ok(idx) => self.params[idx].1 = value,
            Err(idx) => self.params.insert(idx, (name, value)),
        }
        self
    }

    /// The resource name this key scopes.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Canonicalized parameters, sorted by name.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::QueryKey;

    #[test]
    fn param_order_does_not_matter() {
        let a = QueryKey::new("students").with_param("group", 3).with_param("active", true);
        let b = QueryKey::new("students").with_param("active", true).with_param("group", 3);
        assert_eq!(a, b);
    }

    #[test]
    fn later_params_replace_earlier_ones() {
        let key = QueryKey::new("students").with_param("group", 3).with_param("group", 9);
        assert_eq!(key.params(), &[("group".to_string(), "9".to_string())]);
    }

    #[test]
    fn keys_with_different_params_differ() {
        let a = QueryKey::new("students").with_param("group", "a");
        let b = QueryKey::new("students").with_param("group", "b");
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_log_friendly() {
        let key = QueryKey::new("students").with_param("group", 3).with_param("name", "ada");
        assert_eq!(key.to_string(), r#"students?group=3&name="ada""#);
        assert_eq!(QueryKey::new("students").to_string(), "students");
    }
}
