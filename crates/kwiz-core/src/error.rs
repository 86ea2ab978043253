//! Error types for kwiz-core

use crate::store::StoreSide;

/// Result type for kwiz-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in kwiz-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad input: unknown operation type, stale preview, invalid snapshot
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Execution attempted while manual conflicts are unresolved
    #[error("Manual resolution required for: {}", fields.join(", "))]
    ConflictBlocked { fields: Vec<String> },

    /// A store could not be read or written
    #[error("{side} store unavailable: {message}")]
    StoreUnavailable { side: StoreSide, message: String },

    /// Persisted history references state that no longer exists
    #[error("Sync history corrupted: {message}")]
    Corruption { message: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem error from kwiz-fs
    #[error(transparent)]
    Fs(#[from] kwiz_fs::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn store(side: StoreSide, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            side,
            message: message.into(),
        }
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }
}
