//! # Error Types
//!
//! Validation errors for shared records.

use thiserror::Error;

/// A record or load configuration failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A required field is empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
