use thiserror::Error;

use crate::access::DenyReason;
use crate::types::AssetStatus;

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// Errors that can occur during asset operations
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {id}")]
    NotFound { id: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Invalid range: {message}")]
    InvalidRange { message: String },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: DenyReason },

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidStatus { from: AssetStatus, to: AssetStatus },

    #[error("Storage backend unavailable: {source}")]
    StorageUnavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl AssetError {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an invalid range error
    pub fn invalid_range<S: Into<String>>(message: S) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Create an access denied error
    pub fn denied(reason: DenyReason) -> Self {
        Self::AccessDenied { reason }
    }

    /// Create a storage error from any backend error type
    pub fn storage<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StorageUnavailable {
            source: Box::new(error),
        }
    }

    /// Create a storage error from a plain message
    pub fn storage_msg<S: Into<String>>(message: S) -> Self {
        Self::StorageUnavailable {
            source: message.into().into(),
        }
    }
}
