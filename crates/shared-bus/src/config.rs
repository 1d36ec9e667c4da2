//! # Bus Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_RELAY_RETENTION_MS};

/// Configuration for a `SharedStateBus` instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Identity of this browsing context. Stamped as `source` on every
    /// emitted event and used to suppress relay echoes.
    pub context_id: String,

    /// Snapshot each owner's state blob to storage on every write.
    pub persist_state: bool,

    /// Mirror emitted events to other contexts through the relay storage.
    pub cross_window: bool,

    /// How long a relay record stays in storage before it is deleted.
    pub relay_retention_ms: u64,

    /// Events buffered per local listener before it starts lagging.
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            context_id: "host".to_string(),
            persist_state: false,
            cross_window: false,
            relay_retention_ms: DEFAULT_RELAY_RETENTION_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl BusConfig {
    /// Default configuration for a named context.
    pub fn for_context(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            ..Self::default()
        }
    }

    /// Enable state snapshots.
    #[must_use]
    pub fn with_persistence(mut self) -> Self {
        self.persist_state = true;
        self
    }

    /// Enable the cross-window relay.
    #[must_use]
    pub fn with_cross_window(mut self) -> Self {
        self.cross_window = true;
        self
    }

    /// Relay retention as a `Duration`.
    #[must_use]
    pub fn relay_retention(&self) -> Duration {
        Duration::from_millis(self.relay_retention_ms)
    }
}
