//! Host resolver for remotes compiled into the host.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use mf_shared_types::RemoteModule;

use crate::domain::{LoadError, ModuleConstructor};
use crate::ports::HostModuleResolver;

/// Resolves build-time-linked remotes from a fixed table.
#[derive(Default)]
pub struct StaticHostResolver {
    modules: HashMap<(String, String), ModuleConstructor>,
}

impl StaticHostResolver {
    /// Empty table; every lookup fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `remote`/`module` to a constructor.
    #[must_use]
    pub fn with_module<F>(
        mut self,
        remote: impl Into<String>,
        module: impl Into<String>,
        constructor: F,
    ) -> Self
    where
        F: Fn() -> RemoteModule + Send + Sync + 'static,
    {
        self.modules
            .insert((remote.into(), module.into()), Arc::new(constructor));
        self
    }

    /// Number of linked modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when nothing is linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl HostModuleResolver for StaticHostResolver {
    async fn resolve(&self, remote: &str, module: &str) -> Result<RemoteModule, LoadError> {
        self.modules
            .get(&(remote.to_string(), module.to_string()))
            .map(|constructor| constructor())
            .ok_or_else(|| LoadError::HostResolutionFailed {
                remote: remote.to_string(),
                module: module.to_string(),
                reason: "not linked into host".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_shared_types::Component;

    #[tokio::test]
    async fn test_resolves_linked_module() {
        let resolver =
            StaticHostResolver::new().with_module("shell", "./Header", || RemoteModule::new("Header"));

        let module = resolver.resolve("shell", "./Header").await.unwrap();
        assert_eq!(module.name(), "Header");

        let err = resolver.resolve("shell", "./Footer").await.unwrap_err();
        assert!(matches!(err, LoadError::HostResolutionFailed { .. }));
    }
}
