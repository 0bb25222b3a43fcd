//! Error types for the query cache.

use crate::QueryKey;
use thiserror::Error;

/// Errors that can occur when interacting with the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A key's payload type is fixed by its first subscriber; a later
    /// subscriber asked for a different one.
    #[error("payload type mismatch for key '{key}': entry holds {entry_type}, subscriber requested {requested_type}")]
    TypeMismatch {
        key: QueryKey,
        entry_type: &'static str,
        requested_type: &'static str,
    },
}
