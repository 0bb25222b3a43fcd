//! Branch selection: the priority order and the refetch policy.

use resource_state::{FetchError, MaybeEmpty, Snapshot};

/// The four mutually exclusive render branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderBranch {
    Loading,
    Error,
    Empty,
    Content,
}

/// What a refetch of an already-loaded resource looks like.
///
/// The two behaviors both exist in the wild; which one a screen gets
/// must be an explicit choice, not an accident of how its conditionals
/// were written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchPolicy {
    /// Strict priority order: Loading > Error > Empty > Content. A
    /// refetch replaces visible content with the loading branch.
    #[default]
    ReplaceWithLoading,
    /// Keep non-empty content on screen while a refetch is in flight
    /// ([`RenderPlan::refetching`] is set for an in-place indicator),
    /// and keep it on a settled error too; the error is then surfaced
    /// through [`RenderPlan::background_error`] instead of a blocking
    /// error branch.
    PreserveContent,
}

/// Outcome of branch selection for one snapshot.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub branch: RenderBranch,
    /// A fetch is in flight behind the content currently on screen.
    /// Only ever set under [`RefetchPolicy::PreserveContent`].
    pub refetching: bool,
    /// Error kept non-blocking because content is preserved. Never
    /// dropped: if an error exists and the Error branch is not selected,
    /// it is surfaced here.
    pub background_error: Option<FetchError>,
}

impl RenderPlan {
    fn branch_only(branch: RenderBranch) -> Self {
        Self {
            branch,
            refetching: false,
            background_error: None,
        }
    }
}

/// Select exactly one branch for a snapshot. First match wins:
///
/// 1. a fetch in flight selects Loading (under
///    [`RefetchPolicy::PreserveContent`], non-empty content suppresses
///    this and stays up with `refetching` set);
/// 2. an error selects Error (under `PreserveContent` with non-empty
///    content, the content stays up and the error moves to
///    `background_error`);
/// 3. missing or empty data selects Empty;
/// 4. otherwise Content.
///
/// Pure: the same snapshot and policy always produce the same plan, and
/// inconsistent inputs (loading and error set simultaneously) are
/// resolved by the order above rather than rejected.
pub fn plan<T: MaybeEmpty>(snapshot: &Snapshot<T>, policy: RefetchPolicy) -> RenderPlan {
    let preserve = policy == RefetchPolicy::PreserveContent && snapshot.has_content();

    if snapshot.is_loading {
        if preserve {
            return RenderPlan {
                branch: RenderBranch::Content,
                refetching: true,
                background_error: snapshot.error.clone(),
            };
        }
        return RenderPlan::branch_only(RenderBranch::Loading);
    }

    if let Some(error) = &snapshot.error {
        if preserve {
            return RenderPlan {
                branch: RenderBranch::Content,
                refetching: false,
                background_error: Some(error.clone()),
            };
        }
        return RenderPlan::branch_only(RenderBranch::Error);
    }

    if !snapshot.has_content() {
        return RenderPlan::branch_only(RenderBranch::Empty);
    }
    RenderPlan::branch_only(RenderBranch::Content)
}
