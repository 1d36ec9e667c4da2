//! Outbound (Driven) ports for the Remote Module Loader.
//!
//! The loader never fetches or executes code itself. A transport does that
//! and the host resolves remotes it linked at build time.

use async_trait::async_trait;

use mf_shared_types::RemoteModule;

use crate::domain::{ContainerScope, LoadError};

/// Fetches and executes a remote-entry script.
///
/// Executing the entry is expected to register one or more containers in
/// `scope`. The loader guarantees at most one in-flight or successful call
/// per URL; a failed call may be retried by a later load.
#[async_trait]
pub trait ScriptTransport: Send + Sync {
    /// Load the remote entry at `url`.
    ///
    /// # Errors
    /// `LoadError::RemoteScriptLoadFailed` on network or execution failure.
    async fn load_script(&self, url: &str, scope: &ContainerScope) -> Result<(), LoadError>;
}

/// Resolves remotes linked into the host at build time.
#[async_trait]
pub trait HostModuleResolver: Send + Sync {
    /// Resolve `module` of the remote named `remote`.
    ///
    /// # Errors
    /// `LoadError::HostResolutionFailed` if the host does not know it.
    async fn resolve(&self, remote: &str, module: &str) -> Result<RemoteModule, LoadError>;
}
