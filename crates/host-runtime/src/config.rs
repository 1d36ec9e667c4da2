//! # Host Configuration
//!
//! One TOML document aggregating every component's configuration, the seed
//! registry records and the static route table.
//!
//! ```toml
//! initial_path = "/"
//!
//! [bus]
//! context_id = "host"
//!
//! [registry]
//! environment = "production"
//! service_url = "https://discovery.example.com"
//!
//! [[routes]]
//! path = "/"
//! component = "home"
//! title = "Home"
//!
//! [[routes]]
//! path = "/shop"
//!
//! [[routes.children]]
//! path = "cart"
//! preload = true
//! remote = { remoteName = "cart", exposedModule = "./Cart", remoteEntryUrl = "https://cdn.example.com/cart/remoteEntry.js" }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use mf_01_registry::RegistryConfig;
use mf_02_remote_loader::LoaderConfig;
use mf_03_navigation_shell::ShellConfig;
use mf_shared_bus::BusConfig;
use mf_shared_types::{LoadConfig, MicrofrontendRecord};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("bus.context_id must not be empty")]
    EmptyContextId,

    #[error("Route {path}: {reason}")]
    InvalidRoute { path: String, reason: String },

    #[error("Route {path} references unknown component {component}")]
    UnknownComponent { path: String, component: String },

    #[error("Invalid microfrontend record: {0}")]
    InvalidRecord(String),
}

/// Complete host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Path navigated to once everything is wired.
    pub initial_path: String,

    /// Start the registry's health and discovery loops.
    pub background_tasks: bool,

    /// Interval for mirroring component counters into metrics (ms).
    pub metrics_refresh_ms: u64,

    /// Shared bus configuration.
    pub bus: BusConfig,

    /// Registry configuration.
    pub registry: RegistryConfig,

    /// Remote loader configuration.
    pub loader: LoaderConfig,

    /// Navigation shell configuration.
    pub shell: ShellConfig,

    /// Records registered before the first discovery sync.
    pub microfrontends: Vec<MicrofrontendRecord>,

    /// Static route tree.
    pub routes: Vec<RouteConfig>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            initial_path: "/".to_string(),
            background_tasks: true,
            metrics_refresh_ms: 5_000,
            bus: BusConfig::default(),
            registry: RegistryConfig::default(),
            loader: LoaderConfig::default(),
            shell: ShellConfig::default(),
            microfrontends: Vec::new(),
            routes: Vec::new(),
        }
    }
}

/// One node of the configured route tree.
///
/// At most one of `remote` and `component` may be set; a node with neither
/// is a group that only contributes its path and children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub path: String,
    pub title: Option<String>,
    pub requires_auth: bool,
    pub preload: bool,
    pub remote: Option<LoadConfig>,
    /// Name of a component supplied through `HostPorts`.
    pub component: Option<String>,
    pub children: Vec<RouteConfig>,
}

impl HostConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check intervals, timeouts, identities and the route table shape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bus.context_id.trim().is_empty() {
            return Err(ConfigError::EmptyContextId);
        }

        let durations = [
            ("bus.relay_retention_ms", self.bus.relay_retention_ms),
            (
                "registry.health_check_interval_ms",
                self.registry.health_check_interval_ms,
            ),
            (
                "registry.health_check_timeout_ms",
                self.registry.health_check_timeout_ms,
            ),
            ("registry.sync_interval_ms", self.registry.sync_interval_ms),
            ("loader.default_timeout_ms", self.loader.default_timeout_ms),
            ("shell.load_timeout_ms", self.shell.load_timeout_ms),
            ("metrics_refresh_ms", self.metrics_refresh_ms),
        ];
        for (field, value) in durations {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { field });
            }
        }

        for record in &self.microfrontends {
            record
                .validate()
                .map_err(|e| ConfigError::InvalidRecord(format!("{}: {e}", record.id)))?;
        }

        self.routes.iter().try_for_each(RouteConfig::validate)
    }

    #[must_use]
    pub fn metrics_refresh(&self) -> Duration {
        Duration::from_millis(self.metrics_refresh_ms)
    }
}

impl RouteConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::InvalidRoute {
                path: self.path.clone(),
                reason: "empty path".to_string(),
            });
        }
        if self.remote.is_some() && self.component.is_some() {
            return Err(ConfigError::InvalidRoute {
                path: self.path.clone(),
                reason: "remote and component are mutually exclusive".to_string(),
            });
        }
        if let Some(remote) = &self.remote {
            remote.validate().map_err(|e| ConfigError::InvalidRoute {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        }
        self.children.iter().try_for_each(Self::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        initial_path = "/shop/cart"
        metrics_refresh_ms = 1000

        [bus]
        context_id = "tab-1"
        cross_window = true

        [registry]
        environment = "staging"
        health_check_interval_ms = 10000

        [loader.share_scopes.default]
        react = "18.2.0"

        [shell]
        browser_history = false

        [[microfrontends]]
        id = "cart"
        name = "Cart"
        version = "1.4.0"
        loadConfig = { remoteName = "cart", exposedModule = "./Cart", remoteEntryUrl = "https://cdn.example.com/cart.js" }

        [[routes]]
        path = "/"
        component = "home"
        title = "Home"

        [[routes]]
        path = "/shop"

        [[routes.children]]
        path = "cart"
        preload = true
        remote = { remoteName = "cart", exposedModule = "./Cart", remoteEntryUrl = "https://cdn.example.com/cart.js" }
    "#;

    #[test]
    fn test_parse_sample() {
        let config = HostConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.initial_path, "/shop/cart");
        assert_eq!(config.bus.context_id, "tab-1");
        assert!(config.bus.cross_window);
        assert_eq!(config.registry.environment, "staging");
        assert_eq!(config.registry.health_check_timeout_ms, 5_000);
        assert!(!config.shell.browser_history);
        assert_eq!(config.microfrontends.len(), 1);
        assert!(config.microfrontends[0].is_active);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[1].children[0].remote.as_ref().unwrap().remote_name, "cart");
        assert_eq!(
            config.loader.share_scopes["default"]["react"],
            "18.2.0".to_string()
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_validate() {
        HostConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = HostConfig::default();
        config.registry.sync_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration { field: "registry.sync_interval_ms" })
        ));
    }

    #[test]
    fn test_empty_context_rejected() {
        let mut config = HostConfig::default();
        config.bus.context_id = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyContextId)));
    }

    #[test]
    fn test_route_with_both_targets_rejected() {
        let mut config = HostConfig::default();
        config.routes.push(RouteConfig {
            path: "/x".to_string(),
            remote: Some(LoadConfig::host_linked("x", "./X")),
            component: Some("x".to_string()),
            ..RouteConfig::default()
        });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRoute { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = HostConfig::load(&path).unwrap();
        assert_eq!(config.routes[0].component.as_deref(), Some("home"));

        let missing = HostConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            HostConfig::from_toml_str("initial_path = ["),
            Err(ConfigError::Parse(_))
        ));
    }
}
