//! Read-only view of one resource for a single render pass.

use crate::{FetchError, MaybeEmpty};
use std::sync::Arc;

/// What a subscriber sees when it asks "what should I render right now".
///
/// The cache keeps the canonical [`ResourceState`](crate::ResourceState)
/// and additionally retains the last success payload across refetches
/// and errors, so `data` and `error` can both be populated here. Branch
/// selection (which one wins) belongs to the renderer, not to this type.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Last successfully fetched payload, shared with every subscriber.
    pub data: Option<Arc<T>>,
    /// Error from the most recent settled fetch, if it failed.
    pub error: Option<FetchError>,
    /// A fetch is in flight for this key.
    pub is_loading: bool,
    /// A fetch is in flight while a previous success payload exists.
    pub is_refetching: bool,
}

impl<T> Snapshot<T> {
    /// Snapshot of a key nothing has been fetched for.
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_refetching: false,
        }
    }

    /// Returns `true` if a non-empty payload is available.
    pub fn has_content(&self) -> bool
    where
        T: MaybeEmpty,
    {
        self.data.as_deref().is_some_and(|data| !data.is_empty())
    }
}

// Hand-written so cloning never requires `T: Clone`; the payload is
// behind an `Arc`.
impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
            is_refetching: self.is_refetching,
        }
    }
}
