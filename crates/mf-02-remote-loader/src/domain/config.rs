//! Loader configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::container::SharedScope;

/// Default deadline for a whole load attempt.
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;

/// Configuration for a `RemoteLoader`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Deadline used by `load_default`.
    pub default_timeout_ms: u64,

    /// Packages the host shares, per share scope (`scope -> package -> version`).
    pub share_scopes: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            share_scopes: BTreeMap::new(),
        }
    }
}

impl LoaderConfig {
    /// `default_timeout_ms` as a `Duration`.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Offer `package` at `version` in `scope`.
    #[must_use]
    pub fn with_shared(
        mut self,
        scope: impl Into<String>,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.share_scopes
            .entry(scope.into())
            .or_default()
            .insert(package.into(), version.into());
        self
    }

    /// Build the shared scope object handed to containers.
    #[must_use]
    pub fn shared_scope(&self, name: &str) -> SharedScope {
        let mut scope = SharedScope::new(name);
        if let Some(packages) = self.share_scopes.get(name) {
            for (package, version) in packages {
                scope = scope.with_package(package.clone(), version.clone());
            }
        }
        scope
    }
}
