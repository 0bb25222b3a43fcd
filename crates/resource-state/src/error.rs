//! The error shape surfaced by failed fetches.

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Shared, cloneable cause attached to a [`FetchError`].
///
/// Causes are reference-counted so an error can fan out to every
/// subscriber of a key without requiring the underlying error to be
/// `Clone`.
pub type DynCause = Arc<dyn StdError + Send + Sync + 'static>;

/// Error carried by the `Error` branch of a resource state.
///
/// Holds a human-readable message and, optionally, the underlying error
/// that produced it. The message is what default error views display;
/// the cause is preserved for logs and `source()` chains.
///
/// Implemented by hand rather than via a `thiserror` derive because the
/// cause is a shared trait object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchError {
    message: String,
    #[serde(skip)]
    cause: Option<DynCause>,
}

impl FetchError {
    /// Create an error from a message alone.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_cause(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// The human-readable message, surfaced verbatim by error views.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying cause, if one was attached.
    pub fn cause(&self) -> Option<&DynCause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for FetchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl From<&str> for FetchError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for FetchError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
