//! Error types for the Microfrontend Registry.

use thiserror::Error;

use mf_shared_types::RecordError;

/// Errors from registry operations.
///
/// Health probe failures are not errors: they are a normal `unhealthy`
/// outcome recorded on the record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The discovery endpoint could not be fetched or parsed.
    ///
    /// Surfaced through `last_error()` and retried on the next sync tick.
    #[error("Discovery fetch failed: {0}")]
    DiscoveryFetchFailed(String),

    /// No record with this id.
    #[error("Microfrontend not found: {0}")]
    NotFound(String),

    /// The record failed validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// An HTTP adapter could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}

impl From<RecordError> for RegistryError {
    fn from(err: RecordError) -> Self {
        Self::InvalidRecord(err.to_string())
    }
}
