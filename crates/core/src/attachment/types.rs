//! Attachment types and upload policy.

use bytes::Bytes;
use uuid::Uuid;

/// Upload acceptance policy.
///
/// Enforced by the attachment manager before any store write.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum accepted payload size in bytes.
    pub max_bytes: u64,
    /// Required content-type prefix.
    pub allowed_content_type_prefix: String,
}

impl UploadPolicy {
    /// Default payload ceiling: 8 MiB.
    pub const DEFAULT_MAX_BYTES: u64 = 8 * 1024 * 1024;
    /// Default content-type prefix.
    pub const DEFAULT_CONTENT_TYPE_PREFIX: &'static str = "image/";

    /// Set the payload ceiling.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the required content-type prefix.
    #[must_use]
    pub fn with_content_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allowed_content_type_prefix = prefix.into();
        self
    }

    /// Check whether a content type is accepted.
    #[must_use]
    pub fn allows_content_type(&self, content_type: &str) -> bool {
        content_type.starts_with(&self.allowed_content_type_prefix)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            allowed_content_type_prefix: Self::DEFAULT_CONTENT_TYPE_PREFIX.to_string(),
        }
    }
}

/// Input for an upload-and-swap operation.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// Payload bytes.
    pub bytes: Bytes,
    /// MIME type of the payload.
    pub content_type: String,
    /// Original filename.
    pub filename: String,
    /// Reference to the blob this upload supersedes, if any.
    pub previous: Option<String>,
}

/// Result of an upload-and-swap operation.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// Identifier of the newly stored blob.
    pub file_id: Uuid,
    /// Server-built retrieval path for the new blob.
    pub url: String,
    /// Whether the superseded blob was actually removed.
    pub deleted_previous: bool,
}

/// Result of reconciling a record's reference list replacement.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Orphans no longer present in the store.
    pub removed: Vec<Uuid>,
    /// Orphans whose removal failed; they persist until a later cleanup.
    pub failed: Vec<Uuid>,
}
