//! The tagged union describing one fetch's lifecycle.

use crate::FetchError;

/// Lifecycle of a single cached fetch at a point in time.
///
/// `Idle` means no fetch has been issued for the key yet. `Loading`
/// covers both the first fetch and any refetch in flight. Exactly one
/// variant is ever active; consumers that also need the previous
/// success payload during a refetch get it through
/// [`Snapshot`](crate::Snapshot), not through this union.
#[derive(Debug, Clone)]
pub enum ResourceState<T> {
    /// No fetch has been initiated for this key.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The most recent fetch attempt failed.
    Error(FetchError),
    /// The most recent fetch succeeded.
    Success(T),
}

impl<T> ResourceState<T> {
    /// Returns `true` if no fetch has been initiated.
    pub fn is_idle(&self) -> bool {
        matches!(self, ResourceState::Idle)
    }

    /// Returns `true` if a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, ResourceState::Loading)
    }

    /// Returns `true` if the most recent fetch failed.
    pub fn is_error(&self) -> bool {
        matches!(self, ResourceState::Error(_))
    }

    /// Returns `true` if the most recent fetch succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, ResourceState::Success(_))
    }

    /// The success payload, if this state holds one.
    pub fn success(&self) -> Option<&T> {
        match self {
            ResourceState::Success(value) => Some(value),
            _ => None,
        }
    }

    /// The error, if this state holds one.
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            ResourceState::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Map the success payload, leaving the other variants untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResourceState<U> {
        match self {
            ResourceState::Idle => ResourceState::Idle,
            ResourceState::Loading => ResourceState::Loading,
            ResourceState::Error(err) => ResourceState::Error(err),
            ResourceState::Success(value) => ResourceState::Success(f(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceState;
    use crate::FetchError;

    #[test]
    fn predicates_match_variants() {
        assert!(ResourceState::<i32>::Idle.is_idle());
        assert!(ResourceState::<i32>::Loading.is_loading());
        assert!(ResourceState::<i32>::Error(FetchError::new("x")).is_error());
        assert!(ResourceState::Success(5).is_success());
    }

    #[test]
    fn accessors_only_yield_their_variant() {
        let ok = ResourceState::Success(vec![1, 2]);
        assert_eq!(ok.success(), Some(&vec![1, 2]));
        assert!(ok.error().is_none());

        let failed = ResourceState::<Vec<i32>>::Error(FetchError::new("nope"));
        assert!(failed.success().is_none());
        assert_eq!(failed.error().map(FetchError::message), Some("nope"));
    }

    #[test]
    fn map_transforms_success_only() {
        let doubled = ResourceState::Success(21).map(|n| n * 2);
        assert_eq!(doubled.success(), Some(&42));

        let still_loading = ResourceState::<i32>::Loading.map(|n| n * 2);
        assert!(still_loading.is_loading());
    }
}
