//! Error types for code-space storage

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by a [`crate::CodeStore`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Insert-if-absent found the key already taken
    #[error("Code already exists: {code}")]
    AlreadyExists {
        /// The contested code
        code: String,
    },

    /// Point read or update on an absent key
    #[error("Code not found: {code}")]
    NotFound {
        /// The missing code
        code: String,
    },

    /// Backend could not serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Snapshot could not be encoded or decoded
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    /// Snapshot file I/O failed
    #[error("IO error: {0}")]
    Io(String),
}

impl StoreError {
    /// Create an already-exists error
    pub fn already_exists(code: impl Into<String>) -> Self {
        StoreError::AlreadyExists { code: code.into() }
    }

    /// Create a not-found error
    pub fn not_found(code: impl Into<String>) -> Self {
        StoreError::NotFound { code: code.into() }
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        StoreError::Unavailable(msg.into())
    }

    /// Check if this is an insert conflict
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }

    /// Check if this reports an absent key
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
