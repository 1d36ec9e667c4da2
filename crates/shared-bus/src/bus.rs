//! # Shared State Bus
//!
//! The single communication fabric between independently deployed modules:
//! a keyed state store, an in-process event channel, and (optionally) a
//! relay to other browsing contexts.
//!
//! ## Delivery Rules
//!
//! - State listeners see only the latest value for their key; rapid writes
//!   collapse (last write wins)
//! - Event listeners of one type see events in emission order
//! - A failing listener is logged and skipped; it never breaks the others
//! - Relayed events from other contexts are replayed locally but never
//!   re-relayed, and a context never receives its own relayed events

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BusConfig;
use crate::error::BusError;
use crate::events::{BusEvent, EventFilter, EventType, SharedStateEvent};
use crate::relay::{publish_to_relay, spawn_relay_listener};
use crate::state::StateStore;
use crate::storage::{InMemoryStorage, KeyValueStorage};
use crate::subscriber::{invoke_listener, ListenerHandle, Subscription};
use crate::STATE_KEY_PREFIX;

/// Value delivered to state listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// Key the listener subscribed to.
    pub key: String,
    /// Latest value, `None` once cleared.
    pub value: Option<Value>,
}

/// Running counters for one bus instance.
#[derive(Debug, Default)]
pub(crate) struct BusStats {
    pub(crate) events_emitted: AtomicU64,
    pub(crate) state_writes: AtomicU64,
    pub(crate) relayed_out: AtomicU64,
    pub(crate) relayed_in: AtomicU64,
    pub(crate) echoes_dropped: AtomicU64,
    pub(crate) duplicates_dropped: AtomicU64,
}

/// Point-in-time copy of the bus counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStatsSnapshot {
    pub events_emitted: u64,
    pub state_writes: u64,
    pub relayed_out: u64,
    pub relayed_in: u64,
    pub echoes_dropped: u64,
    pub duplicates_dropped: u64,
}

impl BusStats {
    fn snapshot(&self) -> BusStatsSnapshot {
        BusStatsSnapshot {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            state_writes: self.state_writes.load(Ordering::Relaxed),
            relayed_out: self.relayed_out.load(Ordering::Relaxed),
            relayed_in: self.relayed_in.load(Ordering::Relaxed),
            echoes_dropped: self.echoes_dropped.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
        }
    }
}

struct BusInner {
    config: BusConfig,
    store: StateStore,
    sender: broadcast::Sender<SharedStateEvent>,
    state_storage: Arc<dyn KeyValueStorage>,
    relay_storage: Arc<dyn KeyValueStorage>,
    stats: Arc<BusStats>,
    relay_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for BusInner {
    fn drop(&mut self) {
        if let Some(task) = self.relay_task.lock().take() {
            task.abort();
        }
    }
}

/// Builder for [`SharedStateBus`].
pub struct SharedStateBusBuilder {
    config: BusConfig,
    state_storage: Option<Arc<dyn KeyValueStorage>>,
    relay_storage: Option<Arc<dyn KeyValueStorage>>,
}

impl SharedStateBusBuilder {
    /// Storage used for state snapshots.
    #[must_use]
    pub fn state_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.state_storage = Some(storage);
        self
    }

    /// Storage shared with other contexts for the event relay.
    #[must_use]
    pub fn relay_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.relay_storage = Some(storage);
        self
    }

    /// Build the bus.
    ///
    /// With persistence enabled, snapshots already in the state storage are
    /// restored before this returns. With the relay enabled this must be
    /// called inside a Tokio runtime.
    pub fn build(self) -> SharedStateBus {
        let (sender, _) = broadcast::channel(self.config.channel_capacity.max(1));
        let state_storage = self
            .state_storage
            .unwrap_or_else(|| Arc::new(InMemoryStorage::new()));
        let relay_storage = self
            .relay_storage
            .unwrap_or_else(|| Arc::new(InMemoryStorage::new()));
        let stats = Arc::new(BusStats::default());

        let relay_task = self.config.cross_window.then(|| {
            spawn_relay_listener(
                &relay_storage,
                self.config.context_id.clone(),
                sender.clone(),
                Arc::clone(&stats),
            )
        });

        let bus = SharedStateBus {
            inner: Arc::new(BusInner {
                config: self.config,
                store: StateStore::new(),
                sender,
                state_storage,
                relay_storage,
                stats,
                relay_task: Mutex::new(relay_task),
            }),
        };

        if bus.inner.config.persist_state {
            bus.restore_snapshots();
        }

        info!(
            context = %bus.inner.config.context_id,
            persist = bus.inner.config.persist_state,
            cross_window = bus.inner.config.cross_window,
            "Shared state bus ready"
        );
        bus
    }
}

/// Shared state store plus event bus. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SharedStateBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for SharedStateBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStateBus")
            .field("context_id", &self.inner.config.context_id)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl SharedStateBus {
    /// Bus with in-memory storage.
    pub fn new(config: BusConfig) -> Self {
        Self::builder(config).build()
    }

    /// Start building a bus with custom storage.
    #[must_use]
    pub fn builder(config: BusConfig) -> SharedStateBusBuilder {
        SharedStateBusBuilder {
            config,
            state_storage: None,
            relay_storage: None,
        }
    }

    /// This context's identity.
    #[must_use]
    pub fn context_id(&self) -> &str {
        &self.inner.config.context_id
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Read the value at `owner.path`.
    #[must_use]
    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.inner.store.get(key)
    }

    /// Write `value` at `key`, notify watchers and emit `state:change`.
    ///
    /// Snapshot failures are logged; the in-memory write still stands.
    pub fn set_state(&self, key: &str, value: Value) -> Result<(), BusError> {
        let owner = self.inner.store.set(key, value.clone())?;
        self.inner.stats.state_writes.fetch_add(1, Ordering::Relaxed);

        if self.inner.config.persist_state {
            if let Err(e) = self.persist_owner(&owner) {
                warn!(owner = %owner, error = %e, "Failed to persist state snapshot");
            }
        }

        self.emit(BusEvent::StateChanged {
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    /// Every owner's blob.
    #[must_use]
    pub fn get_all_states(&self) -> BTreeMap<String, Value> {
        self.inner.store.snapshot()
    }

    /// Remove an owner's state and its snapshot, then emit `state:clear`.
    pub fn clear_state(&self, owner: &str) {
        let had_state = self.inner.store.clear(owner);
        if self.inner.config.persist_state {
            let key = format!("{STATE_KEY_PREFIX}{owner}");
            if let Err(e) = self.inner.state_storage.remove(&key) {
                warn!(owner = %owner, error = %e, "Failed to remove state snapshot");
            }
        }
        debug!(owner = %owner, had_state, "State cleared");
        self.emit(BusEvent::StateCleared {
            owner: owner.to_string(),
        });
    }

    /// Observe a key directly. Reads always return the newest value.
    pub fn watch(&self, key: &str) -> watch::Receiver<Option<Value>> {
        self.inner.store.watch(key)
    }

    /// Call `listener` with the latest value whenever `key` (or an ancestor
    /// or descendant of it) changes.
    ///
    /// Writes that land while a previous delivery is still pending collapse,
    /// so intermediate values may be skipped but the final one never is.
    /// Must be called inside a Tokio runtime.
    pub fn subscribe<F>(&self, key: &str, listener: F) -> ListenerHandle
    where
        F: Fn(&StateChange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut rx = self.inner.store.watch(key);
        rx.mark_unchanged();
        let key = key.to_string();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let change = StateChange {
                    key: key.clone(),
                    value: rx.borrow_and_update().clone(),
                };
                invoke_listener("state", &key, &listener, &change);
            }
        });
        ListenerHandle::new(task)
    }

    fn persist_owner(&self, owner: &str) -> Result<(), BusError> {
        let Some(blob) = self.inner.store.owner_blob(owner) else {
            return Ok(());
        };
        let encoded = serde_json::to_string(&blob)?;
        self.inner
            .state_storage
            .set(&format!("{STATE_KEY_PREFIX}{owner}"), &encoded)
    }

    fn restore_snapshots(&self) {
        let keys = match self.inner.state_storage.keys_with_prefix(STATE_KEY_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to list state snapshots");
                return;
            }
        };

        let mut restored = 0usize;
        for key in keys {
            let Some(owner) = key.strip_prefix(STATE_KEY_PREFIX) else {
                continue;
            };
            let blob = match self.inner.state_storage.get(&key) {
                Ok(Some(raw)) => serde_json::from_str::<Value>(&raw).map_err(BusError::from),
                Ok(None) => continue,
                Err(e) => Err(e),
            };
            match blob {
                Ok(blob) => {
                    self.inner.store.restore_owner(owner, blob);
                    restored += 1;
                }
                Err(e) => warn!(owner = %owner, error = %e, "Skipping unreadable state snapshot"),
            }
        }
        if restored > 0 {
            info!(restored, "Restored state snapshots");
        }
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Publish an event locally and, if enabled, to other contexts.
    ///
    /// Returns the envelope that was delivered.
    pub fn emit(&self, event: BusEvent) -> SharedStateEvent {
        let envelope = SharedStateEvent::new(self.inner.config.context_id.clone(), event);
        self.inner.stats.events_emitted.fetch_add(1, Ordering::Relaxed);

        // No receivers is fine.
        let receivers = self.inner.sender.send(envelope.clone()).unwrap_or(0);
        debug!(
            id = %envelope.id,
            event_type = %envelope.event_type(),
            receivers,
            "Event emitted"
        );

        if self.inner.config.cross_window
            && publish_to_relay(
                &self.inner.relay_storage,
                &envelope,
                self.inner.config.relay_retention(),
            )
        {
            self.inner.stats.relayed_out.fetch_add(1, Ordering::Relaxed);
        }
        envelope
    }

    /// Call `listener` for every event of `event_type`, in emission order.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn listen<F>(&self, event_type: EventType, listener: F) -> ListenerHandle
    where
        F: Fn(&SharedStateEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let label = event_type.to_string();
        let mut subscription = self.events(EventFilter::types(vec![event_type]));
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                invoke_listener("event", &label, &listener, &event);
            }
        });
        ListenerHandle::new(task)
    }

    /// Pull subscription for events matching `filter`.
    #[must_use]
    pub fn events(&self, filter: EventFilter) -> Subscription {
        Subscription::new(self.inner.sender.subscribe(), filter)
    }

    /// Number of live event receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.inner.sender.receiver_count()
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> BusStatsSnapshot {
        self.inner.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::sleep;

    fn bus(context: &str) -> SharedStateBus {
        SharedStateBus::new(BusConfig::for_context(context))
    }

    #[tokio::test]
    async fn test_set_and_get_state() {
        let bus = bus("host");
        bus.set_state("cart.items.count", json!(2)).unwrap();

        assert_eq!(bus.get_state("cart.items.count"), Some(json!(2)));
        assert_eq!(bus.get_all_states().get("cart"), Some(&json!({"items": {"count": 2}})));
        assert!(bus.set_state("", json!(1)).is_err());
    }

    #[tokio::test]
    async fn test_set_state_emits_state_change() {
        let bus = bus("host");
        let mut sub = bus.events(EventFilter::types(vec![EventType::StateChange]));

        bus.set_state("cart.count", json!(5)).unwrap();

        let event = sub.try_recv().unwrap().expect("event");
        assert_eq!(event.source, "host");
        assert_eq!(
            event.event,
            BusEvent::StateChanged { key: "cart.count".into(), value: json!(5) }
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_subscriber_sees_only_last_write() {
        let bus = bus("host");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = bus.subscribe("cart.count", move |change| {
            sink.lock().push(change.value.clone());
            Ok(())
        });

        // No await between writes: the listener task cannot run in between.
        bus.set_state("cart.count", json!(1)).unwrap();
        bus.set_state("cart.count", json!(2)).unwrap();
        bus.set_state("cart.count", json!(3)).unwrap();

        sleep(Duration::from_millis(20)).await;
        assert_eq!(*seen.lock(), vec![Some(json!(3))]);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_block_others() {
        let bus = bus("host");
        let calls = Arc::new(AtomicUsize::new(0));

        let _bad = bus.listen(EventType::Custom("ping".into()), |_| anyhow::bail!("broken"));
        let _panics = bus.listen(EventType::Custom("ping".into()), |_| panic!("bug"));
        let counter = Arc::clone(&calls);
        let _good = bus.listen(EventType::Custom("ping".into()), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit(BusEvent::custom("ping", Value::Null));
        bus.emit(BusEvent::custom("ping", Value::Null));
        sleep(Duration::from_millis(50)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_listen_preserves_order() {
        let bus = bus("host");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _handle = bus.listen(EventType::Custom("n".into()), move |event| {
            if let BusEvent::Custom { payload, .. } = &event.event {
                sink.lock().push(payload.clone());
            }
            Ok(())
        });

        for i in 0..5 {
            bus.emit(BusEvent::custom("n", json!(i)));
        }
        sleep(Duration::from_millis(50)).await;
        assert_eq!(*seen.lock(), (0..5).map(|i| json!(i)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = bus("host");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = bus.listen(EventType::Custom("x".into()), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit(BusEvent::custom("x", Value::Null));
        sleep(Duration::from_millis(20)).await;
        handle.unsubscribe();
        bus.emit(BusEvent::custom("x", Value::Null));
        sleep(Duration::from_millis(20)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_state_removes_snapshot_and_notifies() {
        let storage = Arc::new(InMemoryStorage::new());
        let bus = SharedStateBus::builder(BusConfig::for_context("host").with_persistence())
            .state_storage(storage.clone())
            .build();
        let mut sub = bus.events(EventFilter::types(vec![EventType::StateClear]));

        bus.set_state("cart.count", json!(1)).unwrap();
        assert!(storage.get("mf-state:cart").unwrap().is_some());

        bus.clear_state("cart");
        assert_eq!(bus.get_state("cart.count"), None);
        assert_eq!(storage.get("mf-state:cart").unwrap(), None);
        assert_eq!(
            sub.try_recv().unwrap().map(|e| e.event),
            Some(BusEvent::StateCleared { owner: "cart".into() })
        );
    }

    #[tokio::test]
    async fn test_persisted_state_is_restored() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(InMemoryStorage::new());
        {
            let bus = SharedStateBus::builder(BusConfig::default().with_persistence())
                .state_storage(Arc::clone(&storage))
                .build();
            bus.set_state("user.profile.name", json!("ada")).unwrap();
        }
        storage.set("mf-state:broken", "not json").unwrap();

        let bus = SharedStateBus::builder(BusConfig::default().with_persistence())
            .state_storage(storage)
            .build();
        assert_eq!(bus.get_state("user.profile.name"), Some(json!("ada")));
        assert_eq!(bus.get_state("broken"), None);
    }

    #[tokio::test]
    async fn test_relay_reaches_other_context_without_echo() {
        let shared = Arc::new(InMemoryStorage::new());
        let tab_a = SharedStateBus::builder(BusConfig::for_context("A").with_cross_window())
            .relay_storage(shared.clone())
            .build();
        let tab_b = SharedStateBus::builder(BusConfig::for_context("B").with_cross_window())
            .relay_storage(shared.clone())
            .build();

        let mut on_a = tab_a.events(EventFilter::all());
        let mut on_b = tab_b.events(EventFilter::all());

        let sent = tab_a.emit(BusEvent::custom("cart:checkout", json!({"total": 3})));
        sleep(Duration::from_millis(20)).await;

        // A sees its own event once, locally; the relay echo is dropped.
        assert_eq!(on_a.try_recv().unwrap().map(|e| e.id), Some(sent.id));
        assert!(matches!(on_a.try_recv(), Ok(None)));
        assert_eq!(tab_a.stats().echoes_dropped, 1);

        // B replays it with the original source, exactly once.
        let received = on_b.try_recv().unwrap().expect("relayed event");
        assert_eq!(received.id, sent.id);
        assert_eq!(received.source, "A");
        assert!(matches!(on_b.try_recv(), Ok(None)));
        assert_eq!(tab_b.stats().relayed_in, 1);
        // Replayed events are not relayed again.
        assert_eq!(tab_b.stats().relayed_out, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_records_expire() {
        let shared = Arc::new(InMemoryStorage::new());
        let bus = SharedStateBus::builder(BusConfig::for_context("A").with_cross_window())
            .relay_storage(shared.clone())
            .build();

        bus.emit(BusEvent::custom("ping", Value::Null));
        assert_eq!(shared.len(), 1);

        sleep(Duration::from_millis(150)).await;
        assert!(shared.is_empty());
    }

    #[tokio::test]
    async fn test_same_context_id_suppresses_delivery() {
        let shared = Arc::new(InMemoryStorage::new());
        let first = SharedStateBus::builder(BusConfig::for_context("A").with_cross_window())
            .relay_storage(shared.clone())
            .build();
        let twin = SharedStateBus::builder(BusConfig::for_context("A").with_cross_window())
            .relay_storage(shared.clone())
            .build();
        let mut on_twin = twin.events(EventFilter::all());

        first.emit(BusEvent::custom("ping", Value::Null));
        sleep(Duration::from_millis(20)).await;

        assert!(matches!(on_twin.try_recv(), Ok(None)));
    }
}
