//! # state-renderer
//!
//! Turns one remote-data [`Snapshot`](resource_state::Snapshot) into
//! exactly one of four render branches: Loading, Error, Empty, or
//! Content.
//!
//! Hand-written conditional rendering of fetch state tends to drift
//! between screens: empty-state flicker before the first load, error and
//! stale content shown together, and so on. This crate centralizes the
//! branch choice behind a fixed priority order
//! (Loading > Error > Empty > Content) so every caller gets the same
//! behavior, and exposes default Loading/Error/Empty views so callers
//! only have to write the content branch.
//!
//! Branch selection is a pure function: no I/O, no suspension, no
//! internal state. Retry is always user-initiated: the default error
//! view carries an [`Action`] whose callback the caller wires to its
//! data layer (for example `query_cache::Refetcher::trigger`).

mod branch;
mod defaults;
mod strategies;

pub use branch::{plan, RefetchPolicy, RenderBranch, RenderPlan};
pub use defaults::{default_strategies, Action, DefaultView};
pub use strategies::{RenderStrategies, StateRenderer};
