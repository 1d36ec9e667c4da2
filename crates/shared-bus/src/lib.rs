//! # Shared Bus - State Store and Event Bus for Microfrontends
//!
//! The only sanctioned channel between independently deployed modules and
//! the host. Modules never call each other directly.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Module A    │  set_state()       │  Module B    │
//! │              │  emit()            │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │ subscribe()
//!                  │ SharedState  │ ─────────┘ listen()
//!                  │     Bus      │
//!                  └──────┬───────┘
//!                         │ relay (optional)
//!                         ▼
//!                  other browsing contexts
//! ```
//!
//! ## Guarantees
//!
//! - **Last write wins:** state listeners always end on the newest value
//! - **Ordered events:** per-type listeners see emission order
//! - **Isolation:** listener failures are logged, never propagated
//! - **No echoes:** a context never receives its own relayed events

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod config;
pub mod error;
pub mod events;
mod relay;
pub mod seen_cache;
pub mod state;
pub mod storage;
pub mod subscriber;

// Re-export main types
pub use bus::{BusStatsSnapshot, SharedStateBus, SharedStateBusBuilder, StateChange};
pub use config::BusConfig;
pub use error::BusError;
pub use events::{BusEvent, EventFilter, EventType, SharedStateEvent};
pub use seen_cache::SeenEventCache;
pub use state::StateStore;
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage, StorageChange};
pub use subscriber::{EventStream, ListenerHandle, Subscription, SubscriptionError};

/// Maximum events to buffer per listener before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// How long a relay record stays in storage.
pub const DEFAULT_RELAY_RETENTION_MS: u64 = 100;

/// Storage key prefix for per-owner state snapshots.
pub const STATE_KEY_PREFIX: &str = "mf-state:";

/// Storage key prefix for relayed events.
pub const RELAY_KEY_PREFIX: &str = "mf-event:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }

    #[test]
    fn test_prefixes_are_distinct() {
        assert!(!STATE_KEY_PREFIX.starts_with(RELAY_KEY_PREFIX));
        assert!(!RELAY_KEY_PREFIX.starts_with(STATE_KEY_PREFIX));
    }
}
