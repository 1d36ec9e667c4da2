//! Outbound (Driven) ports for the Microfrontend Registry.
//!
//! These traits define what the registry needs from the outside world:
//! reachability probes, a discovery endpoint and a clock.

use async_trait::async_trait;
use std::time::Duration;

use mf_shared_types::{MicrofrontendRecord, Timestamp};

use crate::domain::RegistryError;

/// Result of one reachability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthOutcome {
    /// Any non-error response.
    Healthy,
    /// Error response or transport failure.
    Unhealthy(String),
    /// No answer within the deadline.
    TimedOut,
}

impl HealthOutcome {
    /// True for `Healthy`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Lightweight reachability check against a remote-entry URL.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe `url`. Implementations should give up after `timeout`; the
    /// registry additionally cancels the probe when it overruns.
    async fn probe(&self, url: &str, timeout: Duration) -> HealthOutcome;
}

/// Source of remotely registered records.
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Fetch the current record list.
    ///
    /// # Errors
    /// `RegistryError::DiscoveryFetchFailed` on network or decode failure.
    async fn fetch(&self) -> Result<Vec<MicrofrontendRecord>, RegistryError>;
}

/// Time source for consistent timestamps.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}
