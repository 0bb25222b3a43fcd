//! Configuration for the query cache.

use serde::{Deserialize, Serialize};

/// Query cache tuning knobs.
///
/// # Fields
///
/// - `retained_capacity`: how many settled values are kept after their
///   last subscriber unsubscribes (default: 64). A later subscribe to
///   the same key warms from this store instead of refetching. Values
///   are evicted least-recently-used; `0` disables retention entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCacheConfig {
    pub retained_capacity: usize,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            retained_capacity: 64,
        }
    }
}
