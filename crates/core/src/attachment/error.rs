//! Attachment error types.

use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Upload carried no payload.
    #[error("no file provided")]
    EmptyUpload,

    /// Content type outside the accepted policy.
    #[error("content type '{content_type}' is not allowed")]
    UnsupportedContentType {
        /// The rejected content type.
        content_type: String,
    },

    /// Payload exceeds the configured ceiling.
    #[error("payload of {size} bytes exceeds maximum {max} bytes")]
    PayloadTooLarge {
        /// Actual payload size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Identifier not syntactically valid for the store's scheme.
    #[error("invalid blob identifier: {0}")]
    InvalidIdentifier(String),

    /// Blob not found.
    #[error("blob not found: {0}")]
    NotFound(Uuid),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AttachmentError {
    /// Create an unsupported content type error.
    #[must_use]
    pub fn unsupported_content_type(content_type: impl Into<String>) -> Self {
        Self::UnsupportedContentType {
            content_type: content_type.into(),
        }
    }

    /// Create a payload too large error.
    #[must_use]
    pub fn payload_too_large(size: u64, max: u64) -> Self {
        Self::PayloadTooLarge { size, max }
    }

    /// Create an invalid identifier error.
    #[must_use]
    pub fn invalid_identifier(raw: impl Into<String>) -> Self {
        Self::InvalidIdentifier(raw.into())
    }

    /// Whether this error should surface as a client error.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyUpload
                | Self::UnsupportedContentType { .. }
                | Self::PayloadTooLarge { .. }
                | Self::InvalidIdentifier(_)
                | Self::NotFound(_)
        )
    }
}
