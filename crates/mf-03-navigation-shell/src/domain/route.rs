//! # Route Tree
//!
//! Static tree supplied at configuration time. Immutable once handed to the
//! shell; ad-hoc guards are registered on the shell, not on the tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use mf_shared_types::{Component, LoadConfig};

use super::guard::SharedGuard;

/// Per-route metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteMeta {
    /// Page title set on commit.
    pub title: Option<String>,
    /// Informational; enforcement is up to the guards.
    pub requires_auth: bool,
    /// Fetch the remote entry ahead of navigation.
    pub preload: bool,
}

impl RouteMeta {
    /// Meta with a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// What a route mounts.
#[derive(Clone)]
pub enum RouteTarget {
    /// Load through the remote loader.
    Remote(LoadConfig),
    /// Render a component supplied directly.
    Component(Arc<dyn Component>),
    /// Grouping node; not navigable by itself.
    None,
}

impl RouteTarget {
    /// True unless this is a grouping node.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(config) => f.debug_tuple("Remote").field(&config.remote_name).finish(),
            Self::Component(component) => f.debug_tuple("Component").field(&component.name()).finish(),
            Self::None => f.write_str("None"),
        }
    }
}

/// One node in the route tree.
#[derive(Clone)]
pub struct RouteNode {
    /// Path pattern; relative paths are joined onto the parent.
    pub path: String,
    pub target: RouteTarget,
    pub meta: RouteMeta,
    pub children: Vec<RouteNode>,
    /// Evaluated in order before any globally registered guard.
    pub guards: Vec<SharedGuard>,
}

impl RouteNode {
    fn with_target(path: impl Into<String>, target: RouteTarget) -> Self {
        Self {
            path: path.into(),
            target,
            meta: RouteMeta::default(),
            children: Vec::new(),
            guards: Vec::new(),
        }
    }

    /// Route that mounts a remote module.
    pub fn remote(path: impl Into<String>, config: LoadConfig) -> Self {
        Self::with_target(path, RouteTarget::Remote(config))
    }

    /// Route that mounts `component` directly.
    pub fn component(path: impl Into<String>, component: Arc<dyn Component>) -> Self {
        Self::with_target(path, RouteTarget::Component(component))
    }

    /// Grouping node for nested routes.
    pub fn group(path: impl Into<String>) -> Self {
        Self::with_target(path, RouteTarget::None)
    }

    #[must_use]
    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn preload(mut self) -> Self {
        self.meta.preload = true;
        self
    }

    #[must_use]
    pub fn child(mut self, child: RouteNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn guard(mut self, guard: SharedGuard) -> Self {
        self.guards.push(guard);
        self
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("path", &self.path)
            .field("target", &self.target)
            .field("meta", &self.meta)
            .field("guards", &self.guards.len())
            .field("children", &self.children)
            .finish()
    }
}
