//! # Core Domain Entities
//!
//! Defines the records exchanged between the runtime components.
//!
//! ## Clusters
//!
//! - **Time**: `Timestamp`
//! - **Loading**: `LoadConfig`
//! - **Registry**: `MicrofrontendRecord`, `MicrofrontendStatus`, `MicrofrontendMetadata`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::RecordError;

/// Share scope used when a load configuration does not name one.
pub const DEFAULT_SHARE_SCOPE: &str = "default";

// =============================================================================
// TIME
// =============================================================================

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a timestamp from raw milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Raw milliseconds.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// =============================================================================
// LOADING
// =============================================================================

/// How to obtain the code for a microfrontend.
///
/// A configuration without `remote_entry_url` names a remote that was linked
/// at build time; it is resolved by the host rather than fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfig {
    /// Logical remote name. Also the name of the container the remote entry registers.
    pub remote_name: String,
    /// Name of the module exposed by the container (e.g. `./App`).
    pub exposed_module: String,
    /// Remote-entry script URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_entry_url: Option<String>,
    /// Shared dependency scope handed to `init`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_scope: Option<String>,
    /// Static bundle to try when the remote entry cannot be loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_url: Option<String>,
}

impl LoadConfig {
    /// Configuration for a remote served from `url`.
    pub fn remote(
        remote_name: impl Into<String>,
        exposed_module: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            remote_name: remote_name.into(),
            exposed_module: exposed_module.into(),
            remote_entry_url: Some(url.into()),
            share_scope: None,
            fallback_url: None,
        }
    }

    /// Configuration for a remote linked at build time.
    pub fn host_linked(remote_name: impl Into<String>, exposed_module: impl Into<String>) -> Self {
        Self {
            remote_name: remote_name.into(),
            exposed_module: exposed_module.into(),
            remote_entry_url: None,
            share_scope: None,
            fallback_url: None,
        }
    }

    /// Set the shared dependency scope.
    #[must_use]
    pub fn with_share_scope(mut self, scope: impl Into<String>) -> Self {
        self.share_scope = Some(scope.into());
        self
    }

    /// Set the static fallback URL.
    #[must_use]
    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = Some(url.into());
        self
    }

    /// Effective share scope name.
    #[must_use]
    pub fn share_scope(&self) -> &str {
        self.share_scope.as_deref().unwrap_or(DEFAULT_SHARE_SCOPE)
    }

    /// True when there is no URL and the host resolves the remote by name.
    #[must_use]
    pub fn is_host_linked(&self) -> bool {
        self.remote_entry_url.is_none()
    }

    /// Validate required fields.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.remote_name.trim().is_empty() {
            return Err(RecordError::MissingField("remoteName"));
        }
        if self.exposed_module.trim().is_empty() {
            return Err(RecordError::MissingField("exposedModule"));
        }
        Ok(())
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Live health classification of a registered microfrontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MicrofrontendStatus {
    /// Last probe succeeded.
    Healthy,
    /// Last probe failed or timed out.
    Unhealthy,
    /// Code is being fetched.
    Loading,
    /// Never checked.
    #[default]
    Unknown,
}

impl MicrofrontendStatus {
    /// All statuses, in declaration order.
    pub const ALL: [MicrofrontendStatus; 4] = [
        MicrofrontendStatus::Healthy,
        MicrofrontendStatus::Unhealthy,
        MicrofrontendStatus::Loading,
        MicrofrontendStatus::Unknown,
    ];
}

impl fmt::Display for MicrofrontendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Loading => write!(f, "loading"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Free-form descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MicrofrontendMetadata {
    /// Human readable description.
    pub description: Option<String>,
    /// Search tags.
    pub tags: Vec<String>,
    /// Declared capabilities (e.g. `cart`, `checkout`).
    pub capabilities: Vec<String>,
    /// Route paths the microfrontend serves.
    pub routes: Vec<String>,
}

/// One registered remote module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrofrontendRecord {
    /// Unique id within the registry.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Deployed version.
    pub version: String,
    /// How to load the code.
    pub load_config: LoadConfig,
    /// Health classification.
    #[serde(default)]
    pub status: MicrofrontendStatus,
    /// When the last health check completed.
    #[serde(default)]
    pub last_health_check_at: Option<Timestamp>,
    /// Descriptive metadata.
    #[serde(default)]
    pub metadata: MicrofrontendMetadata,
    /// First registration time.
    #[serde(default)]
    pub registered_at: Timestamp,
    /// Last time the microfrontend was mounted or touched.
    #[serde(default)]
    pub last_activity_at: Option<Timestamp>,
    /// Deployment environment tag.
    #[serde(default)]
    pub environment: String,
    /// Inactive records are skipped by the health-check loop.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl MicrofrontendRecord {
    /// Create an active record with unknown status.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        load_config: LoadConfig,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            load_config,
            status: MicrofrontendStatus::Unknown,
            last_health_check_at: None,
            metadata: MicrofrontendMetadata::default(),
            registered_at: Timestamp::default(),
            last_activity_at: None,
            environment: String::new(),
            is_active: true,
        }
    }

    /// Set the environment tag.
    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: MicrofrontendMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Remote-entry URL used for reachability probes.
    #[must_use]
    pub fn remote_entry_url(&self) -> Option<&str> {
        self.load_config.remote_entry_url.as_deref()
    }

    /// Validate the record before it enters the registry.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.id.trim().is_empty() {
            return Err(RecordError::MissingField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(RecordError::MissingField("name"));
        }
        self.load_config.validate()
    }
}

/// Partial update applied by `update`.
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub version: Option<String>,
    pub load_config: Option<LoadConfig>,
    pub status: Option<MicrofrontendStatus>,
    pub metadata: Option<MicrofrontendMetadata>,
    pub environment: Option<String>,
    pub is_active: Option<bool>,
}

impl RecordPatch {
    /// Patch that only sets the status.
    #[must_use]
    pub fn status(status: MicrofrontendStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that only toggles activity.
    #[must_use]
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// Apply to a record in place.
    pub fn apply(self, record: &mut MicrofrontendRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(version) = self.version {
            record.version = version;
        }
        if let Some(load_config) = self.load_config {
            record.load_config = load_config;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(metadata) = self.metadata {
            record.metadata = metadata;
        }
        if let Some(environment) = self.environment {
            record.environment = environment;
        }
        if let Some(is_active) = self.is_active {
            record.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_scope_default() {
        let config = LoadConfig::remote("cart", "./Cart", "https://cdn/cart/remoteEntry.js");
        assert_eq!(config.share_scope(), DEFAULT_SHARE_SCOPE);
        assert!(!config.is_host_linked());

        let scoped = config.with_share_scope("checkout");
        assert_eq!(scoped.share_scope(), "checkout");
    }

    #[test]
    fn test_record_deserializes_discovery_payload() {
        let json = r#"{
            "id": "cart",
            "name": "Cart",
            "version": "1.2.0",
            "loadConfig": {
                "remoteName": "cart",
                "exposedModule": "./Cart",
                "remoteEntryUrl": "https://cdn/cart/remoteEntry.js"
            },
            "status": "healthy",
            "metadata": { "tags": ["commerce"], "capabilities": ["cart"] },
            "environment": "production"
        }"#;

        let record: MicrofrontendRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, MicrofrontendStatus::Healthy);
        assert_eq!(record.metadata.tags, vec!["commerce"]);
        assert!(record.is_active);
        assert_eq!(record.remote_entry_url(), Some("https://cdn/cart/remoteEntry.js"));
    }

    #[test]
    fn test_record_validation() {
        let record = MicrofrontendRecord::new("", "Cart", "1.0.0", LoadConfig::host_linked("cart", "./Cart"));
        assert_eq!(record.validate(), Err(RecordError::MissingField("id")));

        let record = MicrofrontendRecord::new("cart", "Cart", "1.0.0", LoadConfig::host_linked("cart", ""));
        assert_eq!(record.validate(), Err(RecordError::MissingField("exposedModule")));
    }

    #[test]
    fn test_patch_only_writes_some_fields() {
        let mut record =
            MicrofrontendRecord::new("cart", "Cart", "1.0.0", LoadConfig::host_linked("cart", "./Cart"));
        RecordPatch {
            version: Some("2.0.0".into()),
            ..RecordPatch::default()
        }
        .apply(&mut record);

        assert_eq!(record.version, "2.0.0");
        assert_eq!(record.name, "Cart");
        assert_eq!(record.status, MicrofrontendStatus::Unknown);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(MicrofrontendStatus::Unhealthy.to_string(), "unhealthy");
    }
}
