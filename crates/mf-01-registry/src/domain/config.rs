//! Registry configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the registry service and its background loops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Environment tag; discovery keeps only records carrying it.
    /// Empty disables the filter.
    pub environment: String,

    /// Discovery service base URL; `None` disables remote sync.
    pub service_url: Option<String>,

    /// Bearer credential for the discovery endpoint.
    pub auth_token: Option<String>,

    /// Interval between health sweeps (ms).
    pub health_check_interval_ms: u64,

    /// Deadline for one reachability probe (ms).
    pub health_check_timeout_ms: u64,

    /// Interval between discovery syncs (ms).
    pub sync_interval_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            environment: String::new(),
            service_url: None,
            auth_token: None,
            health_check_interval_ms: 30_000,
            health_check_timeout_ms: 5_000,
            sync_interval_ms: 60_000,
        }
    }
}

impl RegistryConfig {
    /// Set the environment tag.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Enable remote discovery.
    #[must_use]
    pub fn with_discovery(mut self, service_url: impl Into<String>, auth_token: Option<String>) -> Self {
        self.service_url = Some(service_url.into());
        self.auth_token = auth_token;
        self
    }

    #[must_use]
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    #[must_use]
    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }

    #[must_use]
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    /// True if `environment` passes the environment filter.
    #[must_use]
    pub fn accepts_environment(&self, environment: &str) -> bool {
        self.environment.is_empty() || self.environment == environment
    }
}
