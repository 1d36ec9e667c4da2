//! # Mounting
//!
//! The outlet is what the host renders. Every commit starts a new mount
//! generation; a remote load that settles after a newer commit is dropped.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use mf_02_remote_loader::LoadError;
use mf_shared_types::Component;

use super::core::{report_error, CompiledRoute, NavigationShell, ShellCounters};
use crate::domain::{NavigationError, RouteTarget};

/// What the outlet is showing.
#[derive(Clone, Default)]
pub enum OutletView {
    /// Nothing mounted yet.
    #[default]
    Idle,
    /// Remote module load in progress.
    Loading { path: String, remote: String },
    /// Mounted component.
    Ready {
        path: String,
        component: Arc<dyn Component>,
    },
    /// Remote module could not be loaded.
    Failed { path: String, error: LoadError },
}

impl OutletView {
    /// Path this view belongs to.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Loading { path, .. } | Self::Ready { path, .. } | Self::Failed { path, .. } => {
                Some(path)
            }
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

impl fmt::Debug for OutletView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Loading { path, remote } => f
                .debug_struct("Loading")
                .field("path", path)
                .field("remote", remote)
                .finish(),
            Self::Ready { path, component } => f
                .debug_struct("Ready")
                .field("path", path)
                .field("component", &component.name())
                .finish(),
            Self::Failed { path, error } => f
                .debug_struct("Failed")
                .field("path", path)
                .field("error", error)
                .finish(),
        }
    }
}

pub(crate) struct Outlet {
    view: watch::Sender<OutletView>,
    generation: Mutex<u64>,
}

impl Outlet {
    pub fn new() -> Self {
        let (view, _) = watch::channel(OutletView::Idle);
        Self {
            view,
            generation: Mutex::new(0),
        }
    }

    /// Start a new generation showing `view`.
    fn begin(&self, view: OutletView) -> u64 {
        let mut generation = self.generation.lock();
        *generation += 1;
        self.view.send_replace(view);
        *generation
    }

    /// Publish `view` if `generation` is still current.
    fn settle(&self, generation: u64, view: OutletView) -> bool {
        let current = self.generation.lock();
        if *current != generation {
            return false;
        }
        self.view.send_replace(view);
        true
    }
}

impl NavigationShell {
    /// What the outlet currently shows.
    #[must_use]
    pub fn outlet(&self) -> OutletView {
        self.outlet.view.borrow().clone()
    }

    /// Observe outlet changes.
    #[must_use]
    pub fn watch_outlet(&self) -> watch::Receiver<OutletView> {
        self.outlet.view.subscribe()
    }

    /// Fetch the remote entries of every route marked `preload`.
    ///
    /// Returns the number of entries warmed. Failures are logged.
    pub async fn preload_routes(&self) -> usize {
        let Some(loader) = &self.loader else {
            return 0;
        };
        let mut warmed = 0;
        for route in &self.routes {
            let RouteTarget::Remote(config) = &route.target else {
                continue;
            };
            if !route.meta.preload {
                continue;
            }
            match loader.preload(config).await {
                Ok(()) => warmed += 1,
                Err(e) => warn!(route = %route.pattern.as_str(), error = %e, "Route preload failed"),
            }
        }
        warmed
    }

    pub(crate) fn mount(&self, route: &CompiledRoute, path: &str) {
        match &route.target {
            RouteTarget::Component(component) => {
                self.outlet.begin(OutletView::Ready {
                    path: path.to_string(),
                    component: Arc::clone(component),
                });
            }
            RouteTarget::Remote(config) => {
                let generation = self.outlet.begin(OutletView::Loading {
                    path: path.to_string(),
                    remote: config.remote_name.clone(),
                });
                let Some(loader) = self.loader.clone() else {
                    let error = LoadError::InvalidConfig("no remote loader configured".into());
                    settle_failure(
                        &self.outlet,
                        generation,
                        path,
                        error,
                        &self.counters,
                        |e| self.report(e),
                    );
                    return;
                };

                let outlet = Arc::clone(&self.outlet);
                let callbacks = Arc::clone(&self.error_callbacks);
                let counters = Arc::clone(&self.counters);
                let config = config.clone();
                let path = path.to_string();
                let timeout = self.config.load_timeout();
                tokio::spawn(async move {
                    match loader.load_with_fallback(&config, timeout).await {
                        Ok(component) => {
                            let view = OutletView::Ready {
                                path: path.clone(),
                                component,
                            };
                            if !outlet.settle(generation, view) {
                                debug!(path = %path, "Stale mount discarded");
                            }
                        }
                        Err(error) => settle_failure(
                            &outlet,
                            generation,
                            &path,
                            error,
                            &counters,
                            |e| report_error(&callbacks, e),
                        ),
                    }
                });
            }
            RouteTarget::None => {}
        }
    }
}

fn settle_failure(
    outlet: &Outlet,
    generation: u64,
    path: &str,
    error: LoadError,
    counters: &ShellCounters,
    report: impl Fn(&NavigationError),
) {
    let view = OutletView::Failed {
        path: path.to_string(),
        error: error.clone(),
    };
    if !outlet.settle(generation, view) {
        debug!(path = %path, "Stale mount failure discarded");
        return;
    }
    ShellCounters::bump(&counters.mount_failures);
    report(&NavigationError::MountFailed {
        path: path.to_string(),
        source: error,
    });
}
