//! # Cross-Window Relay
//!
//! Mirrors emitted events into a storage shared with other browsing contexts.
//!
//! ```text
//! ┌──────────────┐  emit()   ┌───────────────────────┐  change   ┌──────────────┐
//! │  Context A   │ ────────► │ relay storage         │ ────────► │  Context B   │
//! │              │           │ mf-event:<id> = {...} │           │  listen()    │
//! └──────────────┘           └───────────────────────┘           └──────────────┘
//!                               deleted after retention
//! ```
//!
//! Delivery is best-effort and at-most-once: a context that is not observing
//! when the record is written never sees the event, and there is no replay
//! log. Records whose `source` is this context's own id are dropped, as are
//! repeat sightings of an id already delivered.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::BusStats;
use crate::events::SharedStateEvent;
use crate::seen_cache::SeenEventCache;
use crate::storage::{KeyValueStorage, StorageChange};
use crate::RELAY_KEY_PREFIX;

/// What to do with one storage change notification.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RelayDecision {
    /// Not a relay key.
    Ignore,
    /// Relay record was deleted.
    Removal,
    /// Record could not be parsed.
    Malformed,
    /// Produced by this context.
    Echo,
    /// Already delivered.
    Duplicate,
    /// Replay to local listeners.
    Deliver(SharedStateEvent),
}

/// Storage key for a relayed event.
pub(crate) fn relay_key(event: &SharedStateEvent) -> String {
    format!("{RELAY_KEY_PREFIX}{}", event.id)
}

/// Classify an inbound storage change.
pub(crate) fn classify_change(
    change: &StorageChange,
    context_id: &str,
    seen: &mut SeenEventCache,
) -> RelayDecision {
    if !change.key.starts_with(RELAY_KEY_PREFIX) {
        return RelayDecision::Ignore;
    }
    let Some(record) = change.new_value.as_deref() else {
        return RelayDecision::Removal;
    };
    let event: SharedStateEvent = match serde_json::from_str(record) {
        Ok(event) => event,
        Err(e) => {
            warn!(key = %change.key, error = %e, "Malformed relay record");
            return RelayDecision::Malformed;
        }
    };
    if event.source == context_id {
        return RelayDecision::Echo;
    }
    if !seen.first_sighting(event.id) {
        return RelayDecision::Duplicate;
    }
    RelayDecision::Deliver(event)
}

/// Write an event to the relay storage and schedule its deletion.
pub(crate) fn publish_to_relay(
    storage: &Arc<dyn KeyValueStorage>,
    event: &SharedStateEvent,
    retention: Duration,
) -> bool {
    let key = relay_key(event);
    let record = match serde_json::to_string(event) {
        Ok(record) => record,
        Err(e) => {
            warn!(id = %event.id, error = %e, "Failed to encode relay record");
            return false;
        }
    };
    if let Err(e) = storage.set(&key, &record) {
        warn!(id = %event.id, error = %e, "Failed to write relay record");
        return false;
    }

    // Deleted whether or not anyone observed it.
    let storage = Arc::clone(storage);
    tokio::spawn(async move {
        tokio::time::sleep(retention).await;
        if let Err(e) = storage.remove(&key) {
            warn!(key = %key, error = %e, "Failed to delete relay record");
        }
    });
    true
}

/// Start replaying relay records from other contexts into `sender`.
pub(crate) fn spawn_relay_listener(
    storage: &Arc<dyn KeyValueStorage>,
    context_id: String,
    sender: broadcast::Sender<SharedStateEvent>,
    stats: Arc<BusStats>,
) -> JoinHandle<()> {
    // Subscribe before spawning so nothing written after build() is missed.
    let mut changes = storage.changes();
    tokio::spawn(async move {
        let mut seen = SeenEventCache::new();
        loop {
            let change = match changes.recv().await {
                Ok(change) => change,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Relay listener lagged, events missed");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match classify_change(&change, &context_id, &mut seen) {
                RelayDecision::Deliver(event) => {
                    debug!(id = %event.id, source = %event.source, event_type = %event.event_type(), "Relayed event received");
                    stats.relayed_in.fetch_add(1, Ordering::Relaxed);
                    let _ = sender.send(event);
                }
                RelayDecision::Echo => {
                    stats.echoes_dropped.fetch_add(1, Ordering::Relaxed);
                }
                RelayDecision::Duplicate => {
                    stats.duplicates_dropped.fetch_add(1, Ordering::Relaxed);
                }
                RelayDecision::Ignore | RelayDecision::Removal | RelayDecision::Malformed => {}
            }
        }
        debug!(context = %context_id, "Relay listener stopped");
    })
}
