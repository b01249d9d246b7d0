//! Storage error types.

use thiserror::Error;
use uuid::Uuid;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Blob not found in storage.
    #[error("blob not found: {id}")]
    NotFound {
        /// Identifier that was not found.
        id: Uuid,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backing medium unreachable or erroring.
    #[error("storage operation failed: {0}")]
    Fault(String),

    /// Stored descriptor could not be decoded.
    #[error("corrupt blob descriptor for {id}: {reason}")]
    CorruptDescriptor {
        /// Identifier whose descriptor failed to decode.
        id: Uuid,
        /// Decode failure detail.
        reason: String,
    },
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a fault error.
    #[must_use]
    pub fn fault(msg: impl Into<String>) -> Self {
        Self::Fault(msg.into())
    }

    /// Whether this error means the blob does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Map an OpenDAL error for an operation on `id`.
    pub(crate) fn from_opendal(id: Uuid, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound { id },
            _ => Self::Fault(err.to_string()),
        }
    }
}
