//! Default branch views, for screens that only customize content.

use crate::strategies::RenderStrategies;
use resource_state::MaybeEmpty;
use std::fmt;
use std::sync::Arc;

/// A labelled, pressable affordance carried inside a view.
///
/// Pressing runs the caller-supplied callback exactly once per press and
/// performs no I/O of its own; retry buttons should be wired to a
/// trigger in the data layer (for example
/// `query_cache::Refetcher::trigger`).
#[derive(Clone)]
pub struct Action {
    label: String,
    callback: Arc<dyn Fn() + Send + Sync>,
}

impl Action {
    pub fn new(label: impl Into<String>, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            callback: Arc::new(callback),
        }
    }

    /// The conventional retry affordance.
    pub fn retry(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self::new("Retry", callback)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn press(&self) {
        (self.callback)();
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("label", &self.label).finish()
    }
}

/// Minimal view model produced by the built-in branch views.
///
/// Every error view carries a retry affordance, because an error screen the
/// user cannot act on is a dead end.
#[derive(Debug, Clone)]
pub enum DefaultView {
    /// Indeterminate progress.
    Spinner,
    /// The error's message plus a retry affordance.
    ErrorPanel { message: String, retry: Action },
    /// Nothing to show, with an optional description and action.
    EmptyPanel {
        message: Option<String>,
        action: Option<Action>,
    },
    /// Caller-rendered content, carried as text in this minimal model.
    Text(String),
}

/// Strategies using the built-in Loading/Error/Empty views; only the
/// content view is caller-supplied.
///
/// `retry` is cloned into every error view rendered by these
/// strategies.
pub fn default_strategies<T, F>(retry: Action, content: F) -> RenderStrategies<T, DefaultView>
where
    T: MaybeEmpty + 'static,
    F: Fn(&T) -> DefaultView + Send + Sync + 'static,
{
    RenderStrategies::new(
        || DefaultView::Spinner,
        move |err| DefaultView::ErrorPanel {
            message: err.message().to_string(),
            retry: retry.clone(),
        },
        || DefaultView::EmptyPanel {
            message: None,
            action: None,
        },
        content,
    )
}
