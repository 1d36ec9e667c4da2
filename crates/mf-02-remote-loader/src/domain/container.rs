//! # Container Protocol
//!
//! A remote entry, once executed, registers a named container in the
//! page-wide [`ContainerScope`]. Loading a module is then two steps:
//!
//! 1. `init(shared_scope)` - once per share scope; a second call is an error
//! 2. `get(module)` - returns a factory; invoking it yields the module

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use mf_shared_types::RemoteModule;

use super::errors::LoadError;

/// Produces a module instance. Invoked once per successful load.
pub type ModuleFactory = Box<dyn FnOnce() -> RemoteModule + Send>;

/// Builds fresh factories for one exposed module.
pub type ModuleConstructor = Arc<dyn Fn() -> RemoteModule + Send + Sync>;

/// Shared-dependency scope handed to `init`.
///
/// Maps package name to the version the host provides, so remotes can skip
/// bundling their own copy. The exact shape is a convention between host and
/// remotes; the loader only passes it through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedScope {
    name: String,
    packages: BTreeMap<String, String>,
}

impl SharedScope {
    /// Empty scope.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: BTreeMap::new(),
        }
    }

    /// Offer a package at a version.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>, version: impl Into<String>) -> Self {
        self.packages.insert(package.into(), version.into());
        self
    }

    /// Scope name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version offered for a package.
    #[must_use]
    pub fn version_of(&self, package: &str) -> Option<&str> {
        self.packages.get(package).map(String::as_str)
    }

    /// All offered packages.
    #[must_use]
    pub fn packages(&self) -> &BTreeMap<String, String> {
        &self.packages
    }
}

/// A container registered by a remote entry.
#[async_trait]
pub trait RemoteContainer: Send + Sync {
    /// Name the container registered under (the logical remote name).
    fn name(&self) -> &str;

    /// Hand the container its shared-dependency scope.
    ///
    /// Must be called at most once per scope; implementations report a
    /// repeated call as `ContainerAlreadyInitialized`.
    async fn init(&self, share_scope: &SharedScope) -> Result<(), LoadError>;

    /// Factory for an exposed module, `None` if it is not exposed.
    async fn get(&self, module: &str) -> Option<ModuleFactory>;
}

// =============================================================================
// STATIC CONTAINER
// =============================================================================

/// In-process container with a fixed set of exposed modules.
///
/// Native hosts use it to expose compiled-in modules through the same
/// protocol as fetched remotes.
pub struct StaticContainer {
    name: String,
    exposes: HashMap<String, ModuleConstructor>,
    initialized_scopes: RwLock<Vec<String>>,
    init_calls: AtomicU32,
}

impl StaticContainer {
    /// Container with nothing exposed.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exposes: HashMap::new(),
            initialized_scopes: RwLock::new(Vec::new()),
            init_calls: AtomicU32::new(0),
        }
    }

    /// Expose a module under `module` (e.g. `./App`).
    #[must_use]
    pub fn expose<F>(mut self, module: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> RemoteModule + Send + Sync + 'static,
    {
        self.exposes.insert(module.into(), Arc::new(constructor));
        self
    }

    /// Number of `init` calls received, including rejected ones.
    #[must_use]
    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// True once initialized for `scope`.
    #[must_use]
    pub fn is_initialized_for(&self, scope: &str) -> bool {
        self.initialized_scopes.read().iter().any(|s| s == scope)
    }
}

impl fmt::Debug for StaticContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exposes: Vec<_> = self.exposes.keys().collect();
        exposes.sort();
        f.debug_struct("StaticContainer")
            .field("name", &self.name)
            .field("exposes", &exposes)
            .finish()
    }
}

#[async_trait]
impl RemoteContainer for StaticContainer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self, share_scope: &SharedScope) -> Result<(), LoadError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let mut scopes = self.initialized_scopes.write();
        if scopes.iter().any(|s| s == share_scope.name()) {
            return Err(LoadError::ContainerAlreadyInitialized {
                name: self.name.clone(),
                scope: share_scope.name().to_string(),
            });
        }
        scopes.push(share_scope.name().to_string());
        Ok(())
    }

    async fn get(&self, module: &str) -> Option<ModuleFactory> {
        let constructor = Arc::clone(self.exposes.get(module)?);
        Some(Box::new(move || constructor()))
    }
}

// =============================================================================
// CONTAINER SCOPE
// =============================================================================

/// Page-wide table of registered containers, keyed by name.
///
/// Every registration gets a fresh generation, so a remote entry that
/// replaces a container under an existing name is told apart from the
/// instance it replaced.
#[derive(Default)]
pub struct ContainerScope {
    containers: RwLock<HashMap<String, (u64, Arc<dyn RemoteContainer>)>>,
    next_generation: AtomicU64,
}

impl ContainerScope {
    /// Empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a container under its own name.
    pub fn register(&self, container: Arc<dyn RemoteContainer>) {
        let name = container.name().to_string();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.containers.write().insert(name, (generation, container));
    }

    /// Look up a container.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn RemoteContainer>> {
        self.lookup(name).map(|(_, container)| container)
    }

    /// Look up a container together with its registration generation.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(u64, Arc<dyn RemoteContainer>)> {
        self.containers
            .read()
            .get(name)
            .map(|(generation, container)| (*generation, Arc::clone(container)))
    }

    /// True if a container is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.containers.read().contains_key(name)
    }

    /// Registered container names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ContainerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerScope")
            .field("containers", &self.names())
            .finish()
    }
}
