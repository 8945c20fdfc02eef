//! Error types for the runner domain model

use thiserror::Error;

/// Errors raised by domain values before any network activity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// The trace patch has no unsent bytes, or its offset lies past the buffer
    #[error("Invalid trace range: offset {offset} is not below limit {limit}")]
    InvalidRange { offset: usize, limit: usize },

    /// A `Range` header that is not `<start>-<end>`
    #[error("Malformed range: {0:?}")]
    MalformedRange(String),
}

/// Result type for trace operations
pub type Result<T> = std::result::Result<T, TraceError>;
