//! Error types for runner-network

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reaching the coordination server
///
/// These never escape a protocol operation; each operation folds them into
/// its outcome enum. `is_config` separates errors that no retry can fix.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Server URL is not an absolute http(s) URL
    #[error("Invalid server URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Custom trust root could not be loaded
    #[error("Cannot load trust root {}: {reason}", path.display())]
    TrustRoot { path: PathBuf, reason: String },

    /// HTTP client construction failed
    #[error("HTTP client construction failed: {0}")]
    Build(String),

    /// Request did not produce a response (connect error, timeout, reset)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetworkError {
    /// Is this a configuration problem rather than a transient failure?
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            NetworkError::InvalidUrl { .. } | NetworkError::TrustRoot { .. } | NetworkError::Build(_)
        )
    }
}

/// Result type for network operations
pub type Result<T> = std::result::Result<T, NetworkError>;
