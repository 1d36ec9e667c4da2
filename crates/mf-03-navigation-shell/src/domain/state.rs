//! Navigation state and outcomes.

use serde::{Deserialize, Serialize};

use super::errors::NavigationError;
use super::pattern::RouteParams;

/// A committed (or about to be committed) route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMatch {
    /// Path as navigated to.
    pub path: String,
    /// Pattern of the matched route.
    pub route: String,
    pub params: RouteParams,
    pub title: Option<String>,
}

/// Shell-wide navigation state.
///
/// Replaced as a whole on every commit; readers never see a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub current_route: Option<RouteMatch>,
    /// Committed routes, oldest first. Appended on every navigation except
    /// `replace`, which only moves `current_route`; back walks pop it.
    pub history: Vec<RouteMatch>,
    pub is_navigating: bool,
}

impl NavigationState {
    /// Path of the current route.
    #[must_use]
    pub fn current_path(&self) -> Option<&str> {
        self.current_route.as_ref().map(|r| r.path.as_str())
    }
}

/// Options for `navigate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Do not append to history; the browser entry is replaced.
    pub replace: bool,
    /// Skip every guard (initial bootstrap).
    pub skip_guards: bool,
}

impl NavigateOptions {
    #[must_use]
    pub fn replace() -> Self {
        Self {
            replace: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn bootstrap() -> Self {
        Self {
            replace: false,
            skip_guards: true,
        }
    }
}

/// Result of one `navigate` call.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// Route resolved, guards passed, state committed.
    Committed(RouteMatch),
    /// No route matched; nothing changed.
    NotFound,
    /// A guard vetoed or failed; nothing changed.
    Rejected(NavigationError),
    /// A later navigation started while this one was in its guards.
    Superseded,
}

impl NavigationOutcome {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}
