//! # Remote Loader Service
//!
//! Drives one load attempt through the state machine in
//! [`LoadPhase`](crate::domain::LoadPhase):
//!
//! 1. Host-linked remotes (no URL) are handed to the host resolver
//! 2. Otherwise the remote entry is fetched, at most once per URL
//! 3. The container it registered is looked up by remote name
//! 4. The container is initialized, at most once per (share scope, container)
//! 5. The exposed module's factory is fetched and invoked
//! 6. The default export (or the module itself) is returned
//!
//! The caller's deadline is an explicit `tokio::time::timeout` around the
//! whole sequence: when it fires, the caller gets `LoadError::LoadTimeout`.
//! A dropped script fetch leaves the cache untouched, so the next load
//! retries it. A container init in flight keeps running on its own task and
//! the next load reuses its outcome.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use mf_shared_types::{Component, LoadConfig, RemoteModule};

use crate::domain::{ContainerScope, LoadError, LoadPhase, LoaderConfig, SharedScope};
use crate::ports::{HostModuleResolver, ScriptTransport};

use super::cache::RemoteLoadCache;

/// Summary of one finished `load` call, handed to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Logical remote name.
    pub remote: String,
    /// Exposed module requested.
    pub module: String,
    /// Wall time of the attempt.
    pub duration: Duration,
    /// `LoadError::kind()` on failure.
    pub error_kind: Option<&'static str>,
}

impl LoadReport {
    /// True if the load produced a component.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error_kind.is_none()
    }
}

/// Callback invoked after every `load`.
pub type LoadObserver = Arc<dyn Fn(&LoadReport) + Send + Sync>;

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    pub loads_started: u64,
    pub loads_succeeded: u64,
    pub loads_failed: u64,
    pub timeouts: u64,
    pub fallbacks_used: u64,
    pub scripts_loaded: u64,
    pub containers_initialized: u64,
}

#[derive(Default)]
struct LoaderCounters {
    loads_started: AtomicU64,
    loads_succeeded: AtomicU64,
    loads_failed: AtomicU64,
    timeouts: AtomicU64,
    fallbacks_used: AtomicU64,
    scripts_loaded: AtomicU64,
}

impl LoaderCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LoaderStats {
        LoaderStats {
            loads_started: self.loads_started.load(Ordering::Relaxed),
            loads_succeeded: self.loads_succeeded.load(Ordering::Relaxed),
            loads_failed: self.loads_failed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            fallbacks_used: self.fallbacks_used.load(Ordering::Relaxed),
            scripts_loaded: self.scripts_loaded.load(Ordering::Relaxed),
            containers_initialized: 0,
        }
    }
}

/// Loads remote modules and returns mountable components.
pub struct RemoteLoader {
    config: LoaderConfig,
    transport: Arc<dyn ScriptTransport>,
    host_resolver: Arc<dyn HostModuleResolver>,
    containers: Arc<ContainerScope>,
    cache: RemoteLoadCache,
    share_scopes: RwLock<HashMap<String, Arc<SharedScope>>>,
    observers: RwLock<Vec<LoadObserver>>,
    counters: LoaderCounters,
}

impl RemoteLoader {
    /// Create a loader with its own container scope.
    pub fn new(
        config: LoaderConfig,
        transport: Arc<dyn ScriptTransport>,
        host_resolver: Arc<dyn HostModuleResolver>,
    ) -> Self {
        Self {
            config,
            transport,
            host_resolver,
            containers: Arc::new(ContainerScope::new()),
            cache: RemoteLoadCache::new(),
            share_scopes: RwLock::new(HashMap::new()),
            observers: RwLock::new(Vec::new()),
            counters: LoaderCounters::default(),
        }
    }

    /// Use an existing container scope (e.g. one with pre-registered containers).
    #[must_use]
    pub fn with_container_scope(mut self, containers: Arc<ContainerScope>) -> Self {
        self.containers = containers;
        self
    }

    /// The container scope remote entries register into.
    #[must_use]
    pub fn containers(&self) -> &Arc<ContainerScope> {
        &self.containers
    }

    /// Session cache.
    #[must_use]
    pub fn cache(&self) -> &RemoteLoadCache {
        &self.cache
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Register a callback run after every load.
    pub fn observe(&self, observer: LoadObserver) {
        self.observers.write().push(observer);
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            containers_initialized: self.cache.initialized_containers() as u64,
            ..self.counters.snapshot()
        }
    }

    /// Load with `LoaderConfig::default_timeout`.
    pub async fn load_default(&self, config: &LoadConfig) -> Result<Arc<dyn Component>, LoadError> {
        self.load(config, self.config.default_timeout()).await
    }

    /// Load the module described by `config`, giving up after `timeout`.
    ///
    /// # Errors
    /// One `LoadError` variant per failure kind; no implicit retry.
    pub async fn load(
        &self,
        config: &LoadConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn Component>, LoadError> {
        config
            .validate()
            .map_err(|e| LoadError::InvalidConfig(e.to_string()))?;
        LoaderCounters::bump(&self.counters.loads_started);

        let started = Instant::now();
        let phase = Mutex::new(LoadPhase::Pending);
        let result = match tokio::time::timeout(timeout, self.run(config, &phase)).await {
            Ok(result) => result,
            Err(_) => {
                let at = *phase.lock();
                *phase.lock() = LoadPhase::TimedOut;
                LoaderCounters::bump(&self.counters.timeouts);
                Err(LoadError::LoadTimeout {
                    remote: config.remote_name.clone(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    phase: at,
                })
            }
        };
        let duration = started.elapsed();

        match &result {
            Ok(component) => {
                *phase.lock() = LoadPhase::Resolved;
                LoaderCounters::bump(&self.counters.loads_succeeded);
                info!(
                    remote = %config.remote_name,
                    module = %config.exposed_module,
                    component = component.name(),
                    elapsed_ms = duration.as_millis() as u64,
                    "Remote module loaded"
                );
            }
            Err(e) => {
                if *phase.lock() != LoadPhase::TimedOut {
                    *phase.lock() = LoadPhase::Errored;
                }
                LoaderCounters::bump(&self.counters.loads_failed);
                warn!(
                    remote = %config.remote_name,
                    module = %config.exposed_module,
                    phase = %*phase.lock(),
                    error = %e,
                    "Remote module load failed"
                );
            }
        }

        self.notify(LoadReport {
            remote: config.remote_name.clone(),
            module: config.exposed_module.clone(),
            duration,
            error_kind: result.as_ref().err().map(LoadError::kind),
        });
        result
    }

    /// Load, and on a network-class failure retry once against `fallback_url`.
    pub async fn load_with_fallback(
        &self,
        config: &LoadConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn Component>, LoadError> {
        let primary_error = match self.load(config, timeout).await {
            Ok(component) => return Ok(component),
            Err(e) => e,
        };
        let Some(fallback_url) = config.fallback_url.as_ref() else {
            return Err(primary_error);
        };
        if !primary_error.is_network() {
            return Err(primary_error);
        }

        warn!(
            remote = %config.remote_name,
            fallback = %fallback_url,
            error = %primary_error,
            "Primary remote entry unavailable, trying fallback"
        );
        LoaderCounters::bump(&self.counters.fallbacks_used);
        let fallback = LoadConfig {
            remote_entry_url: Some(fallback_url.clone()),
            fallback_url: None,
            ..config.clone()
        };
        self.load(&fallback, timeout).await
    }

    /// Fetch the remote entry ahead of time without instantiating anything.
    pub async fn preload(&self, config: &LoadConfig) -> Result<(), LoadError> {
        match config.remote_entry_url.as_deref() {
            Some(url) => self.ensure_script(url).await,
            None => Ok(()),
        }
    }

    // =========================================================================
    // STATE MACHINE
    // =========================================================================

    async fn run(
        &self,
        config: &LoadConfig,
        phase: &Mutex<LoadPhase>,
    ) -> Result<Arc<dyn Component>, LoadError> {
        let module = match config.remote_entry_url.as_deref() {
            None => {
                enter(phase, LoadPhase::ResolvingHostModule, config);
                self.host_resolver
                    .resolve(&config.remote_name, &config.exposed_module)
                    .await?
            }
            Some(url) => self.load_from_container(config, url, phase).await?,
        };
        Ok(module.into_component())
    }

    async fn load_from_container(
        &self,
        config: &LoadConfig,
        url: &str,
        phase: &Mutex<LoadPhase>,
    ) -> Result<RemoteModule, LoadError> {
        enter(phase, LoadPhase::FetchingScript, config);
        self.ensure_script(url).await?;

        enter(phase, LoadPhase::LookingUpContainer, config);
        let (generation, container) =
            self.containers
                .lookup(&config.remote_name)
                .ok_or_else(|| LoadError::ContainerNotFound {
                    name: config.remote_name.clone(),
                    url: url.to_string(),
                })?;

        enter(phase, LoadPhase::InitializingContainer, config);
        let scope = self.share_scope(config.share_scope());
        let target = Arc::clone(&container);
        let share_scope = Arc::clone(&scope);
        self.cache
            .ensure_init(scope.name(), container.name(), generation, move || async move {
                target.init(&share_scope).await?;
                info!(
                    container = target.name(),
                    scope = share_scope.name(),
                    "Container initialized"
                );
                Ok(())
            })
            .await?;

        enter(phase, LoadPhase::LookingUpFactory, config);
        let factory =
            container
                .get(&config.exposed_module)
                .await
                .ok_or_else(|| LoadError::ModuleNotFound {
                    container: config.remote_name.clone(),
                    module: config.exposed_module.clone(),
                })?;

        enter(phase, LoadPhase::Instantiating, config);
        Ok(factory())
    }

    async fn ensure_script(&self, url: &str) -> Result<(), LoadError> {
        let transport = &self.transport;
        let containers = &self.containers;
        let fetched = self
            .cache
            .ensure_script(url, || transport.load_script(url, containers))
            .await?;
        if fetched {
            LoaderCounters::bump(&self.counters.scripts_loaded);
            info!(url, "Remote entry loaded");
        }
        Ok(())
    }

    fn share_scope(&self, name: &str) -> Arc<SharedScope> {
        if let Some(scope) = self.share_scopes.read().get(name) {
            return Arc::clone(scope);
        }
        let mut scopes = self.share_scopes.write();
        Arc::clone(
            scopes
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(self.config.shared_scope(name))),
        )
    }

    fn notify(&self, report: LoadReport) {
        for observer in self.observers.read().iter() {
            observer(&report);
        }
    }
}

fn enter(phase: &Mutex<LoadPhase>, next: LoadPhase, config: &LoadConfig) {
    *phase.lock() = next;
    debug!(remote = %config.remote_name, phase = %next, "Load phase");
}
