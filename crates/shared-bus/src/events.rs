//! # Bus Events
//!
//! Defines every event that flows through the shared bus. Each event type
//! carries its own payload shape; there is no untyped channel apart from
//! `Custom`, which microfrontends use for their own application events.

use mf_shared_types::{MicrofrontendStatus, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// All events that can be emitted on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BusEvent {
    // =========================================================================
    // SHARED STATE
    // =========================================================================
    /// A state key was written.
    #[serde(rename = "state:change")]
    StateChanged {
        /// Full key (`owner.a.b`).
        key: String,
        /// New value at that key.
        value: Value,
    },

    /// An owner's entire state was cleared.
    #[serde(rename = "state:clear")]
    StateCleared {
        /// Owning module id.
        owner: String,
    },

    // =========================================================================
    // NAVIGATION
    // =========================================================================
    /// The navigation shell committed a new route.
    #[serde(rename = "navigation:changed")]
    NavigationChanged {
        /// Path navigated to.
        to: String,
        /// Previously active path.
        from: Option<String>,
    },

    // =========================================================================
    // REGISTRY
    // =========================================================================
    /// A microfrontend was registered (or re-registered).
    #[serde(rename = "registry:registered")]
    MicrofrontendRegistered {
        /// Record id.
        id: String,
    },

    /// A microfrontend was removed.
    #[serde(rename = "registry:unregistered")]
    MicrofrontendUnregistered {
        /// Record id.
        id: String,
    },

    /// A record was partially updated.
    #[serde(rename = "registry:updated")]
    MicrofrontendUpdated {
        /// Record id.
        id: String,
    },

    /// A health check changed a record's status.
    #[serde(rename = "registry:health")]
    HealthChanged {
        /// Record id.
        id: String,
        /// Status after the check.
        status: MicrofrontendStatus,
    },

    /// A remote discovery sync merged records.
    #[serde(rename = "registry:synced")]
    DiscoverySynced {
        /// Number of records merged.
        merged: usize,
    },

    // =========================================================================
    // APPLICATION
    // =========================================================================
    /// Application-defined event.
    #[serde(rename = "custom")]
    Custom {
        /// Event name chosen by the producer.
        name: String,
        /// Arbitrary payload.
        payload: Value,
    },
}

impl BusEvent {
    /// Application event helper.
    pub fn custom(name: impl Into<String>, payload: Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }

    /// The type used by `listen` to route this event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::StateChanged { .. } => EventType::StateChange,
            Self::StateCleared { .. } => EventType::StateClear,
            Self::NavigationChanged { .. } => EventType::NavigationChanged,
            Self::MicrofrontendRegistered { .. } => EventType::Registered,
            Self::MicrofrontendUnregistered { .. } => EventType::Unregistered,
            Self::MicrofrontendUpdated { .. } => EventType::Updated,
            Self::HealthChanged { .. } => EventType::HealthChanged,
            Self::DiscoverySynced { .. } => EventType::DiscoverySynced,
            Self::Custom { name, .. } => EventType::Custom(name.clone()),
        }
    }
}

/// Routing key for events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// `state:change`
    StateChange,
    /// `state:clear`
    StateClear,
    /// `navigation:changed`
    NavigationChanged,
    /// `registry:registered`
    Registered,
    /// `registry:unregistered`
    Unregistered,
    /// `registry:updated`
    Updated,
    /// `registry:health`
    HealthChanged,
    /// `registry:synced`
    DiscoverySynced,
    /// Application event by name.
    Custom(String),
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::StateChange => "state:change",
            Self::StateClear => "state:clear",
            Self::NavigationChanged => "navigation:changed",
            Self::Registered => "registry:registered",
            Self::Unregistered => "registry:unregistered",
            Self::Updated => "registry:updated",
            Self::HealthChanged => "registry:health",
            Self::DiscoverySynced => "registry:synced",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope for every event on the bus.
///
/// Created on `emit`, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedStateEvent {
    /// Globally unique id, used for relay de-duplication.
    pub id: Uuid,
    /// Producer context id.
    pub source: String,
    /// Emission time.
    pub timestamp: Timestamp,
    /// The event itself.
    pub event: BusEvent,
}

impl SharedStateEvent {
    /// Wrap an event with a fresh id and the current time.
    pub fn new(source: impl Into<String>, event: BusEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            timestamp: Timestamp::now(),
            event,
        }
    }

    /// Shorthand for `self.event.event_type()`.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event.event_type()
    }
}

/// Filter for pull subscriptions.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Event types to include. Empty means all types.
    pub types: Vec<EventType>,
    /// Sources to include. Empty means all sources.
    pub sources: Vec<String>,
}

impl EventFilter {
    /// Accept every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Accept only the given types.
    #[must_use]
    pub fn types(types: Vec<EventType>) -> Self {
        Self {
            types,
            sources: Vec::new(),
        }
    }

    /// Accept only events from the given sources.
    #[must_use]
    pub fn from_sources(sources: Vec<String>) -> Self {
        Self {
            types: Vec::new(),
            sources,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SharedStateEvent) -> bool {
        let type_match = self.types.is_empty() || self.types.contains(&event.event_type());
        let source_match = self.sources.is_empty() || self.sources.contains(&event.source);
        type_match && source_match
    }
}
