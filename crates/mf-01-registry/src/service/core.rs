use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::warn;

use mf_shared_bus::{BusEvent, SharedStateBus};
use mf_shared_types::{MicrofrontendRecord, Timestamp};

use crate::adapters::{HttpDiscoveryClient, HttpHealthProbe, SystemTimeSource};
use crate::domain::{RecordTable, RegistryConfig, RegistryError};
use crate::ports::{DiscoverySource, HealthProbe, TimeSource};

/// Callback receiving the full record list after every mutation.
pub type RegistryListener = Arc<dyn Fn(&[MicrofrontendRecord]) + Send + Sync>;

type ListenerList = RwLock<Vec<(u64, RegistryListener)>>;

/// Microfrontend Registry service.
///
/// Owns the record table exclusively. Callers get owned snapshots and mutate
/// only through the registry's operations.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Arc::new(
///     MicrofrontendRegistry::builder(RegistryConfig::default())
///         .bus(bus.clone())
///         .build()?,
/// );
/// registry.register(record)?;
/// let _tasks = registry.spawn_background_tasks();
/// ```
pub struct MicrofrontendRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) table: RwLock<RecordTable>,
    pub(crate) probe: Arc<dyn HealthProbe>,
    pub(crate) discovery: Option<Arc<dyn DiscoverySource>>,
    pub(crate) time_source: Arc<dyn TimeSource>,
    pub(crate) bus: Option<SharedStateBus>,
    pub(crate) last_error: RwLock<Option<RegistryError>>,
    listeners: Arc<ListenerList>,
    next_listener: AtomicU64,
}

/// Builder for [`MicrofrontendRegistry`].
pub struct RegistryBuilder {
    config: RegistryConfig,
    probe: Option<Arc<dyn HealthProbe>>,
    discovery: Option<Arc<dyn DiscoverySource>>,
    time_source: Option<Arc<dyn TimeSource>>,
    bus: Option<SharedStateBus>,
}

impl RegistryBuilder {
    /// Probe used for health checks. Defaults to `HttpHealthProbe`.
    #[must_use]
    pub fn health_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Discovery source. Defaults to `HttpDiscoveryClient` when
    /// `service_url` is configured, otherwise sync is disabled.
    #[must_use]
    pub fn discovery(mut self, discovery: Arc<dyn DiscoverySource>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Clock. Defaults to `SystemTimeSource`.
    #[must_use]
    pub fn time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Publish registry events on this bus.
    #[must_use]
    pub fn bus(mut self, bus: SharedStateBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Build the registry.
    ///
    /// # Errors
    /// `RegistryError::HttpClient` if a default HTTP adapter cannot be built.
    pub fn build(self) -> Result<MicrofrontendRegistry, RegistryError> {
        let probe: Arc<dyn HealthProbe> = match self.probe {
            Some(probe) => probe,
            None => Arc::new(HttpHealthProbe::new()?),
        };
        let discovery: Option<Arc<dyn DiscoverySource>> =
            match (self.discovery, &self.config.service_url) {
                (Some(discovery), _) => Some(discovery),
                (None, Some(url)) => Some(Arc::new(HttpDiscoveryClient::new(
                    url,
                    self.config.auth_token.as_deref(),
                    self.config.health_check_timeout(),
                )?)),
                (None, None) => None,
            };

        Ok(MicrofrontendRegistry {
            config: self.config,
            table: RwLock::new(RecordTable::new()),
            probe,
            discovery,
            time_source: self
                .time_source
                .unwrap_or_else(|| Arc::new(SystemTimeSource)),
            bus: self.bus,
            last_error: RwLock::new(None),
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener: AtomicU64::new(0),
        })
    }
}

impl MicrofrontendRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder(config: RegistryConfig) -> RegistryBuilder {
        RegistryBuilder {
            config,
            probe: None,
            discovery: None,
            time_source: None,
            bus: None,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// True when a discovery source is configured.
    #[must_use]
    pub fn has_discovery(&self) -> bool {
        self.discovery.is_some()
    }

    /// Current timestamp from the time source.
    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Call `listener` with the full list after every mutation.
    pub fn subscribe<F>(&self, listener: F) -> RegistrySubscription
    where
        F: Fn(&[MicrofrontendRecord]) + Send + Sync + 'static,
    {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, Arc::new(listener)));
        RegistrySubscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver the current snapshot to every listener.
    pub(crate) fn notify(&self) {
        let snapshot = self.table.read().snapshot();
        let listeners: Vec<RegistryListener> =
            self.listeners.read().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&snapshot))).is_err() {
                warn!("Registry listener panicked");
            }
        }
    }

    pub(crate) fn emit(&self, event: BusEvent) {
        if let Some(bus) = &self.bus {
            bus.emit(event);
        }
    }
}

/// Handle to a registry subscription. Dropping it unsubscribes.
#[must_use = "dropping a RegistrySubscription unsubscribes the listener"]
pub struct RegistrySubscription {
    id: u64,
    listeners: Weak<ListenerList>,
}

impl RegistrySubscription {
    /// Stop receiving updates.
    pub fn unsubscribe(self) {
        // Drop removes the listener.
    }
}

impl Drop for RegistrySubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.write().retain(|(id, _)| *id != self.id);
        }
    }
}
