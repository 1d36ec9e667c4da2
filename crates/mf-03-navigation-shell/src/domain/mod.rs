//! # Domain Layer
//!
//! Route tree, path patterns, guards, navigation state and configuration.

pub mod config;
pub mod errors;
pub mod guard;
pub mod pattern;
pub mod route;
pub mod state;

pub use config::ShellConfig;
pub use errors::NavigationError;
pub use guard::{constant_guard, guard_fn, GuardContext, NavigationGuard, SharedGuard};
pub use pattern::{join_paths, normalize_path, PathPattern, RouteParams};
pub use route::{RouteMeta, RouteNode, RouteTarget};
pub use state::{NavigateOptions, NavigationOutcome, NavigationState, RouteMatch};
