use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, warn};

use mf_02_remote_loader::RemoteLoader;
use mf_shared_bus::SharedStateBus;
use mf_shared_types::LoadConfig;

use super::mount::Outlet;
use crate::adapters::InMemoryBrowserHistory;
use crate::domain::{
    join_paths, NavigationError, NavigationState, PathPattern, RouteMatch, RouteMeta, RouteNode,
    RouteTarget, SharedGuard, ShellConfig,
};
use crate::ports::BrowserHistory;

/// Callback receiving guard rejections and mount failures.
pub type ErrorCallback = Arc<dyn Fn(&NavigationError) + Send + Sync>;

pub(crate) type GuardList = RwLock<Vec<(u64, SharedGuard)>>;
pub(crate) type ErrorCallbacks = RwLock<Vec<ErrorCallback>>;

// =============================================================================
// COMPILED ROUTES
// =============================================================================

/// A navigable node flattened out of the tree.
pub(crate) struct CompiledRoute {
    pub pattern: PathPattern,
    pub target: RouteTarget,
    pub meta: RouteMeta,
    /// Ancestor guards (outermost first), then the node's own.
    pub guards: Vec<SharedGuard>,
}

/// Flatten in depth-first pre-order so that a linear scan is first-match.
fn compile_tree(
    nodes: &[RouteNode],
    parent: &str,
    inherited: &[SharedGuard],
    out: &mut Vec<Arc<CompiledRoute>>,
) -> Result<(), NavigationError> {
    for node in nodes {
        let full_path = join_paths(parent, &node.path);
        let mut guards = inherited.to_vec();
        guards.extend(node.guards.iter().cloned());

        if node.target.is_navigable() {
            out.push(Arc::new(CompiledRoute {
                pattern: PathPattern::compile(&full_path)?,
                target: node.target.clone(),
                meta: node.meta.clone(),
                guards: guards.clone(),
            }));
        }
        compile_tree(&node.children, &full_path, &guards, out)?;
    }
    Ok(())
}

// =============================================================================
// COUNTERS
// =============================================================================

#[derive(Default)]
pub(crate) struct ShellCounters {
    pub committed: AtomicU64,
    pub not_found: AtomicU64,
    pub rejected: AtomicU64,
    pub superseded: AtomicU64,
    pub mount_failures: AtomicU64,
}

impl ShellCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Navigation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationStats {
    pub committed: u64,
    pub not_found: u64,
    pub rejected: u64,
    pub superseded: u64,
    pub mount_failures: u64,
}

// =============================================================================
// SHELL
// =============================================================================

/// Navigation Shell.
///
/// Resolves paths against the route tree (first match in tree order wins),
/// runs guard chains, commits navigation state and mounts the route.
pub struct NavigationShell {
    pub(crate) config: ShellConfig,
    tree: Vec<RouteNode>,
    pub(crate) routes: Vec<Arc<CompiledRoute>>,
    pub(crate) guards: Arc<GuardList>,
    next_guard: AtomicU64,
    pub(crate) error_callbacks: Arc<ErrorCallbacks>,
    pub(crate) state: watch::Sender<NavigationState>,
    pub(crate) forward: Mutex<Vec<RouteMatch>>,
    pub(crate) nav_seq: AtomicU64,
    /// Highest `nav_seq` ticket whose guards passed.
    pub(crate) passed_seq: AtomicU64,
    pub(crate) in_flight: AtomicU64,
    pub(crate) browser: Arc<dyn BrowserHistory>,
    pub(crate) bus: Option<SharedStateBus>,
    pub(crate) loader: Option<Arc<RemoteLoader>>,
    pub(crate) outlet: Arc<Outlet>,
    pub(crate) counters: Arc<ShellCounters>,
}

/// Builder for [`NavigationShell`].
pub struct NavigationShellBuilder {
    config: ShellConfig,
    routes: Vec<RouteNode>,
    bus: Option<SharedStateBus>,
    loader: Option<Arc<RemoteLoader>>,
    browser: Option<Arc<dyn BrowserHistory>>,
}

impl NavigationShellBuilder {
    /// Replace the route tree.
    #[must_use]
    pub fn routes(mut self, routes: Vec<RouteNode>) -> Self {
        self.routes = routes;
        self
    }

    /// Append a top-level route.
    #[must_use]
    pub fn route(mut self, route: RouteNode) -> Self {
        self.routes.push(route);
        self
    }

    /// Announce commits on this bus.
    #[must_use]
    pub fn bus(mut self, bus: SharedStateBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Loader used to mount remote routes.
    #[must_use]
    pub fn loader(mut self, loader: Arc<RemoteLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Browser history integration. Defaults to `InMemoryBrowserHistory`.
    #[must_use]
    pub fn browser_history(mut self, browser: Arc<dyn BrowserHistory>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Compile the route tree and build the shell.
    ///
    /// # Errors
    /// `NavigationError::InvalidPattern` if any route path fails to compile.
    pub fn build(self) -> Result<NavigationShell, NavigationError> {
        let mut routes = Vec::new();
        compile_tree(&self.routes, "/", &[], &mut routes)?;
        debug!(routes = routes.len(), "Route tree compiled");

        let (state, _) = watch::channel(NavigationState::default());
        Ok(NavigationShell {
            config: self.config,
            tree: self.routes,
            routes,
            guards: Arc::new(RwLock::new(Vec::new())),
            next_guard: AtomicU64::new(0),
            error_callbacks: Arc::new(RwLock::new(Vec::new())),
            state,
            forward: Mutex::new(Vec::new()),
            nav_seq: AtomicU64::new(0),
            passed_seq: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            browser: self
                .browser
                .unwrap_or_else(|| Arc::new(InMemoryBrowserHistory::new())),
            bus: self.bus,
            loader: self.loader,
            outlet: Arc::new(Outlet::new()),
            counters: Arc::new(ShellCounters::default()),
        })
    }
}

impl NavigationShell {
    /// Start building a shell.
    #[must_use]
    pub fn builder(config: ShellConfig) -> NavigationShellBuilder {
        NavigationShellBuilder {
            config,
            routes: Vec::new(),
            bus: None,
            loader: None,
            browser: None,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// The route tree as configured.
    #[must_use]
    pub fn routes(&self) -> &[RouteNode] {
        &self.tree
    }

    /// Snapshot of the navigation state.
    #[must_use]
    pub fn state(&self) -> NavigationState {
        self.state.borrow().clone()
    }

    /// Observe navigation state changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<NavigationState> {
        self.state.subscribe()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> NavigationStats {
        let c = &self.counters;
        NavigationStats {
            committed: c.committed.load(Ordering::Relaxed),
            not_found: c.not_found.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            superseded: c.superseded.load(Ordering::Relaxed),
            mount_failures: c.mount_failures.load(Ordering::Relaxed),
        }
    }

    /// Load configuration of the remote route `path` resolves to.
    #[must_use]
    pub fn remote_for(&self, path: &str) -> Option<LoadConfig> {
        match &self.resolve(path)?.0.target {
            RouteTarget::Remote(config) => Some(config.clone()),
            _ => None,
        }
    }

    /// First route in tree order whose pattern matches `path`.
    pub(crate) fn resolve(&self, path: &str) -> Option<(Arc<CompiledRoute>, RouteMatch)> {
        self.routes.iter().find_map(|route| {
            let params = route.pattern.match_path(path)?;
            Some((
                Arc::clone(route),
                RouteMatch {
                    path: path.to_string(),
                    route: route.pattern.as_str().to_string(),
                    params,
                    title: route.meta.title.clone(),
                },
            ))
        })
    }

    // =========================================================================
    // GUARDS AND ERRORS
    // =========================================================================

    /// Register a guard evaluated after every route's own guards.
    pub fn add_guard(&self, guard: SharedGuard) -> GuardHandle {
        let id = self.next_guard.fetch_add(1, Ordering::Relaxed);
        self.guards.write().push((id, guard));
        GuardHandle {
            id,
            guards: Arc::downgrade(&self.guards),
        }
    }

    /// Number of global guards.
    #[must_use]
    pub fn guard_count(&self) -> usize {
        self.guards.read().len()
    }

    /// Receive guard rejections and mount failures.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&NavigationError) + Send + Sync + 'static,
    {
        self.error_callbacks.write().push(Arc::new(callback));
    }

    pub(crate) fn report(&self, error: &NavigationError) {
        report_error(&self.error_callbacks, error);
    }
}

pub(crate) fn report_error(callbacks: &ErrorCallbacks, error: &NavigationError) {
    let callbacks: Vec<ErrorCallback> = callbacks.read().iter().cloned().collect();
    for callback in callbacks {
        if catch_unwind(AssertUnwindSafe(|| callback(error))).is_err() {
            warn!("Navigation error callback panicked");
        }
    }
}

/// Handle to a global guard. Dropping it removes the guard.
#[must_use = "dropping a GuardHandle removes the guard"]
pub struct GuardHandle {
    id: u64,
    guards: Weak<GuardList>,
}

impl GuardHandle {
    /// Remove the guard now.
    pub fn remove(self) {}

    /// Keep the guard for the lifetime of the shell.
    pub fn detach(mut self) {
        self.guards = Weak::new();
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        if let Some(guards) = self.guards.upgrade() {
            guards.write().retain(|(id, _)| *id != self.id);
        }
    }
}
