//! # Microfrontend Host
//!
//! Owns the four runtime components and the tasks that connect them.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use mf_01_registry::{
    DiscoverySource, HealthProbe, MicrofrontendRegistry, RegistryError, RegistryTasks,
};
use mf_02_remote_loader::{
    HostModuleResolver, InMemoryScriptTransport, RemoteLoader, ScriptTransport,
    StaticHostResolver,
};
use mf_03_navigation_shell::{
    BrowserHistory, NavigateOptions, NavigationError, NavigationOutcome, NavigationShell,
    SharedGuard,
};
use mf_shared_bus::{KeyValueStorage, ListenerHandle, SharedStateBus};
use mf_shared_types::Component;

use crate::config::{ConfigError, HostConfig};
use crate::routes::{build_routes, ComponentCatalog};
use crate::wiring;

/// Host startup errors.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Registry setup failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Navigation shell setup failed: {0}")]
    Navigation(#[from] NavigationError),
}

/// Adapters and extension points supplied by the embedding application.
///
/// Everything defaults to in-process implementations: remote entries are
/// served from an empty in-memory transport, probes and discovery follow
/// the registry configuration.
pub struct HostPorts {
    pub transport: Arc<dyn ScriptTransport>,
    pub host_resolver: Arc<dyn HostModuleResolver>,
    pub browser_history: Option<Arc<dyn BrowserHistory>>,
    pub health_probe: Option<Arc<dyn HealthProbe>>,
    pub discovery: Option<Arc<dyn DiscoverySource>>,
    pub state_storage: Option<Arc<dyn KeyValueStorage>>,
    pub relay_storage: Option<Arc<dyn KeyValueStorage>>,
    pub components: ComponentCatalog,
    /// Installed as global guards, in order.
    pub guards: Vec<SharedGuard>,
}

impl Default for HostPorts {
    fn default() -> Self {
        Self {
            transport: Arc::new(InMemoryScriptTransport::new()),
            host_resolver: Arc::new(StaticHostResolver::new()),
            browser_history: None,
            health_probe: None,
            discovery: None,
            state_storage: None,
            relay_storage: None,
            components: HashMap::new(),
            guards: Vec::new(),
        }
    }
}

impl HostPorts {
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn ScriptTransport>) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn host_resolver(mut self, resolver: Arc<dyn HostModuleResolver>) -> Self {
        self.host_resolver = resolver;
        self
    }

    #[must_use]
    pub fn browser_history(mut self, browser: Arc<dyn BrowserHistory>) -> Self {
        self.browser_history = Some(browser);
        self
    }

    #[must_use]
    pub fn health_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.health_probe = Some(probe);
        self
    }

    #[must_use]
    pub fn discovery(mut self, discovery: Arc<dyn DiscoverySource>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Storage for state snapshots and the event relay.
    #[must_use]
    pub fn storage(
        mut self,
        state: Arc<dyn KeyValueStorage>,
        relay: Arc<dyn KeyValueStorage>,
    ) -> Self {
        self.state_storage = Some(state);
        self.relay_storage = Some(relay);
        self
    }

    /// Make `component` available to routes as `name`.
    #[must_use]
    pub fn component(mut self, name: impl Into<String>, component: Arc<dyn Component>) -> Self {
        self.components.insert(name.into(), component);
        self
    }

    #[must_use]
    pub fn guard(mut self, guard: SharedGuard) -> Self {
        self.guards.push(guard);
        self
    }
}

/// The running host.
///
/// Dropping it stops the registry loops, the bridges and the metrics task.
pub struct MicrofrontendHost {
    config: HostConfig,
    bus: SharedStateBus,
    registry: Arc<MicrofrontendRegistry>,
    loader: Arc<RemoteLoader>,
    shell: Arc<NavigationShell>,
    bootstrap: NavigationOutcome,
    registry_tasks: Mutex<Option<RegistryTasks>>,
    activity_bridge: Mutex<Option<ListenerHandle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MicrofrontendHost {
    /// Build and start every component.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Validate configuration
    /// 2. Shared bus (restores snapshots when persistence is on)
    /// 3. Registry, seeded from the configured records
    /// 4. Remote loader with the load metrics observer
    /// 5. Navigation shell with the configured route table
    /// 6. Bridges: activity and metrics
    /// 7. Initial discovery sync, background loops, route preloading
    /// 8. Bootstrap navigation to `initial_path`, skipping guards
    pub async fn start(config: HostConfig, ports: HostPorts) -> Result<Self, HostError> {
        config.validate()?;
        info!(context = %config.bus.context_id, "Starting microfrontend host");

        let mut bus_builder = SharedStateBus::builder(config.bus.clone());
        if let Some(storage) = ports.state_storage {
            bus_builder = bus_builder.state_storage(storage);
        }
        if let Some(storage) = ports.relay_storage {
            bus_builder = bus_builder.relay_storage(storage);
        }
        let bus = bus_builder.build();

        let mut registry_builder =
            MicrofrontendRegistry::builder(config.registry.clone()).bus(bus.clone());
        if let Some(probe) = ports.health_probe {
            registry_builder = registry_builder.health_probe(probe);
        }
        if let Some(discovery) = ports.discovery {
            registry_builder = registry_builder.discovery(discovery);
        }
        let registry = Arc::new(registry_builder.build()?);
        for record in &config.microfrontends {
            registry.register(record.clone())?;
        }

        let loader = Arc::new(RemoteLoader::new(
            config.loader.clone(),
            ports.transport,
            ports.host_resolver,
        ));
        loader.observe(wiring::load_metrics_observer());

        let routes = build_routes(&config.routes, &ports.components)?;
        let mut shell_builder = NavigationShell::builder(config.shell.clone())
            .routes(routes)
            .bus(bus.clone())
            .loader(Arc::clone(&loader));
        if let Some(browser) = ports.browser_history {
            shell_builder = shell_builder.browser_history(browser);
        }
        let shell = Arc::new(shell_builder.build()?);
        for guard in ports.guards {
            shell.add_guard(guard).detach();
        }
        shell.on_error(|error| warn!(error = %error, "Navigation error"));

        let activity_bridge =
            wiring::spawn_activity_bridge(&bus, Arc::clone(&shell), Arc::clone(&registry));
        let tasks = vec![
            wiring::spawn_metrics_bridge(&bus),
            wiring::spawn_metrics_refresher(
                bus.clone(),
                Arc::clone(&registry),
                Arc::clone(&shell),
                config.metrics_refresh(),
            ),
        ];

        if registry.has_discovery() {
            if let Err(e) = registry.refresh_from_remote().await {
                warn!(error = %e, "Initial discovery sync failed");
            }
        }
        let registry_tasks = config
            .background_tasks
            .then(|| registry.spawn_background_tasks());

        let preloaded = shell.preload_routes().await;

        let bootstrap = shell
            .navigate(&config.initial_path, NavigateOptions::bootstrap())
            .await;
        if !bootstrap.is_committed() {
            warn!(path = %config.initial_path, outcome = ?bootstrap, "Initial navigation did not commit");
        }

        info!(
            records = registry.len(),
            routes = config.routes.len(),
            preloaded,
            "Microfrontend host started"
        );

        Ok(Self {
            config,
            bus,
            registry,
            loader,
            shell,
            bootstrap,
            registry_tasks: Mutex::new(registry_tasks),
            activity_bridge: Mutex::new(Some(activity_bridge)),
            tasks: Mutex::new(tasks),
        })
    }

    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    #[must_use]
    pub fn bus(&self) -> &SharedStateBus {
        &self.bus
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<MicrofrontendRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn loader(&self) -> &Arc<RemoteLoader> {
        &self.loader
    }

    #[must_use]
    pub fn shell(&self) -> &Arc<NavigationShell> {
        &self.shell
    }

    /// Outcome of the startup navigation.
    #[must_use]
    pub fn bootstrap_outcome(&self) -> &NavigationOutcome {
        &self.bootstrap
    }

    /// Navigate with default options.
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        self.shell.navigate(path, NavigateOptions::default()).await
    }

    /// Update metric gauges now instead of waiting for the refresher.
    pub fn refresh_metrics(&self) {
        wiring::refresh_metrics(&self.bus, &self.registry, &self.shell);
    }

    /// True until [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.activity_bridge.lock().is_some()
    }

    /// Stop background loops and bridges. Idempotent.
    pub fn shutdown(&self) {
        if let Some(tasks) = self.registry_tasks.lock().take() {
            tasks.shutdown();
        }
        if let Some(bridge) = self.activity_bridge.lock().take() {
            bridge.unsubscribe();
        }
        let tasks = std::mem::take(&mut *self.tasks.lock());
        if tasks.is_empty() {
            return;
        }
        for task in tasks {
            task.abort();
        }
        info!(context = %self.config.bus.context_id, "Microfrontend host stopped");
    }
}

impl Drop for MicrofrontendHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}
