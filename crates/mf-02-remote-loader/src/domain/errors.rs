//! # Loader Errors
//!
//! Every failure mode of a load attempt is a distinct variant so callers can
//! pick a recovery strategy: network-class failures are worth a retry or a
//! static fallback, a missing container or module is a deployment mismatch.

use thiserror::Error;

use super::phase::LoadPhase;

/// Errors from loading a remote module.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The remote-entry script could not be fetched or executed.
    #[error("Failed to load remote entry {url}: {reason}")]
    RemoteScriptLoadFailed {
        /// Remote-entry URL.
        url: String,
        /// Transport-specific cause.
        reason: String,
    },

    /// The remote entry ran but did not register the expected container.
    #[error("Container {name:?} not found after loading {url}")]
    ContainerNotFound {
        /// Expected container (logical remote) name.
        name: String,
        /// Remote-entry URL that was loaded.
        url: String,
    },

    /// The container does not expose the requested module.
    #[error("Module {module:?} not exposed by container {container:?}")]
    ModuleNotFound {
        /// Container name.
        container: String,
        /// Requested exposed module.
        module: String,
    },

    /// The whole load did not finish within the caller's deadline.
    #[error("Loading {remote:?} timed out after {timeout_ms}ms during {phase}")]
    LoadTimeout {
        /// Logical remote name.
        remote: String,
        /// Deadline that expired.
        timeout_ms: u64,
        /// Step that was running when the deadline hit.
        phase: LoadPhase,
    },

    /// A container was initialized a second time for the same scope.
    #[error("Container {name:?} already initialized for share scope {scope:?}")]
    ContainerAlreadyInitialized {
        /// Container name.
        name: String,
        /// Share scope name.
        scope: String,
    },

    /// Container `init` failed.
    #[error("Container {name:?} failed to initialize: {reason}")]
    ContainerInitFailed {
        /// Container name.
        name: String,
        /// Cause reported by the container.
        reason: String,
    },

    /// The host could not resolve a build-time-linked remote.
    #[error("Host could not resolve {remote}/{module}: {reason}")]
    HostResolutionFailed {
        /// Logical remote name.
        remote: String,
        /// Requested exposed module.
        module: String,
        /// Cause.
        reason: String,
    },

    /// The load configuration is unusable.
    #[error("Invalid load configuration: {0}")]
    InvalidConfig(String),
}

impl LoadError {
    /// True for failures where retrying or switching to a fallback URL can help.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::RemoteScriptLoadFailed { .. } | Self::LoadTimeout { .. }
        )
    }

    /// Stable label used for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteScriptLoadFailed { .. } => "script_load_failed",
            Self::ContainerNotFound { .. } => "container_not_found",
            Self::ModuleNotFound { .. } => "module_not_found",
            Self::LoadTimeout { .. } => "timeout",
            Self::ContainerAlreadyInitialized { .. } => "already_initialized",
            Self::ContainerInitFailed { .. } => "init_failed",
            Self::HostResolutionFailed { .. } => "host_resolution_failed",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}
