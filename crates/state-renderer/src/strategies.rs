//! The renderer and its caller-supplied strategies.

use crate::branch::{plan, RefetchPolicy, RenderBranch, RenderPlan};
use resource_state::{FetchError, MaybeEmpty, Snapshot};

/// One render strategy per branch, all producing the same output type.
///
/// All four slots are mandatory: a screen that cannot render one of the
/// branches has a bug waiting for the first slow network or empty list.
/// The `content` strategy is only ever invoked with non-empty data.
pub struct RenderStrategies<T, Out> {
    loading: Box<dyn Fn() -> Out + Send + Sync>,
    error: Box<dyn Fn(&FetchError) -> Out + Send + Sync>,
    empty: Box<dyn Fn() -> Out + Send + Sync>,
    content: Box<dyn Fn(&T) -> Out + Send + Sync>,
}

impl<T, Out> RenderStrategies<T, Out> {
    pub fn new(
        loading: impl Fn() -> Out + Send + Sync + 'static,
        error: impl Fn(&FetchError) -> Out + Send + Sync + 'static,
        empty: impl Fn() -> Out + Send + Sync + 'static,
        content: impl Fn(&T) -> Out + Send + Sync + 'static,
    ) -> Self {
        Self {
            loading: Box::new(loading),
            error: Box::new(error),
            empty: Box::new(empty),
            content: Box::new(content),
        }
    }
}

/// Renders snapshots through a fixed branch-priority order.
///
/// Carries only the [`RefetchPolicy`]; rendering itself is pure and
/// infallible: under partial or inconsistent inputs it still picks
/// exactly one branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateRenderer {
    policy: RefetchPolicy,
}

impl StateRenderer {
    /// Renderer with the default strict policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RefetchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RefetchPolicy {
        self.policy
    }

    /// Branch selection without rendering, for callers that drive their
    /// own output (in-place refetch indicators, background error
    /// toasts).
    pub fn plan<T: MaybeEmpty>(&self, snapshot: &Snapshot<T>) -> RenderPlan {
        plan(snapshot, self.policy)
    }

    /// Produce exactly one output for the snapshot.
    pub fn render<T, Out>(
        &self,
        snapshot: &Snapshot<T>,
        strategies: &RenderStrategies<T, Out>,
    ) -> Out
    where
        T: MaybeEmpty,
    {
        match self.plan(snapshot).branch {
            RenderBranch::Loading => (strategies.loading)(),
            RenderBranch::Error => match &snapshot.error {
                Some(error) => (strategies.error)(error),
                // The Error branch is only selected when an error is set.
                None => (strategies.empty)(),
            },
            RenderBranch::Empty => (strategies.empty)(),
            RenderBranch::Content => match snapshot.data.as_deref() {
                Some(data) => (strategies.content)(data),
                // The Content branch is only selected with non-empty data.
                None => (strategies.empty)(),
            },
        }
    }
}
