//! # Bus Errors

use thiserror::Error;

/// Errors from state and storage operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// A state key was empty or had an empty segment.
    #[error("Invalid state key: {0:?}")]
    InvalidKey(String),

    /// A stored snapshot or relay record could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for BusError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
