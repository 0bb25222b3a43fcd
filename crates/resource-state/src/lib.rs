//! Shared types for the remote-data lifecycle.
//!
//! One asynchronous fetch moves through the [`ResourceState`] tagged union
//! (`Idle -> Loading -> Success | Error`, back to `Loading` on refetch).
//! The cache owns the canonical state; consumers only ever borrow a
//! [`Snapshot`] of it for a single render pass.
//!
//! [`MaybeEmpty`] is how sequence payloads report the "loaded but empty"
//! condition, which renders differently from loaded content.

mod empty;
mod error;
mod snapshot;
mod state;

pub use empty::MaybeEmpty;
pub use error::{DynCause, FetchError};
pub use snapshot::Snapshot;
pub use state::ResourceState;
