//! Error types for the Navigation Shell.

use thiserror::Error;

use mf_02_remote_loader::LoadError;

/// Errors reported by the shell.
///
/// None of these propagate out of `navigate`: guard errors and mount
/// failures go to the `on_error` callback, route-not-found is logged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NavigationError {
    /// No route matches the path.
    #[error("No route matches {path}")]
    RouteNotFound { path: String },

    /// A guard returned `false`.
    #[error("Navigation to {path} rejected by guard #{guard}")]
    GuardRejected { path: String, guard: usize },

    /// A guard returned an error.
    #[error("Guard #{guard} failed for {path}: {reason}")]
    GuardFailed {
        path: String,
        guard: usize,
        reason: String,
    },

    /// A route path could not be compiled.
    #[error("Invalid route pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The route's remote module could not be mounted.
    #[error("Mounting {path} failed: {source}")]
    MountFailed {
        path: String,
        #[source]
        source: LoadError,
    },
}

impl NavigationError {
    /// True for guard vetoes and guard failures.
    #[must_use]
    pub fn is_guard(&self) -> bool {
        matches!(self, Self::GuardRejected { .. } | Self::GuardFailed { .. })
    }
}
