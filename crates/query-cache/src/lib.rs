//! # query-cache
//!
//! Keyed asynchronous query cache for remote data.
//!
//! The cache executes a caller-supplied fetch function per key,
//! de-duplicates concurrent requests for the same key, retains the last
//! settled value, and notifies subscribers on every state change.
//!
//! Guarantees:
//!
//! - At most one in-flight request per key from concurrent subscribers.
//! - Newest request wins: a slow stale response never clobbers the
//!   result of a later-issued fetch.
//! - Settlements for entries whose subscribers have all left are dropped
//!   without notifying anyone.
//! - The cache is an explicit value, not a process-wide singleton; clone
//!   the [`QueryCache`] handle to share one instance across an app, or
//!   build isolated instances in tests.
//!
//! ```ignore
//! let cache = QueryCache::new(QueryCacheConfig::default());
//! let mut students = cache.subscribe(QueryKey::new("students"), || async {
//!     api.list_students().await.map_err(|e| FetchError::with_cause("listing students failed", e))
//! })?;
//!
//! let snapshot = students.settled().await;
//! ```

mod cache;
mod config;
mod error;
mod handle;
mod key;

pub use cache::QueryCache;
pub use config::QueryCacheConfig;
pub use error::CacheError;
pub use handle::{QueryHandle, Refetcher};
pub use key::QueryKey;
