//! Attachment manager implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::AttachmentError;
use super::reference::extract_reference_id;
use super::types::{ReconcileOutcome, SwapOutcome, UploadInput, UploadPolicy};
use crate::storage::{BlobDownload, BlobStore};

/// Default public path under which blobs are served.
const DEFAULT_ROUTE_PREFIX: &str = "/api/photos";

/// Mediates between upload requests, the blob store, and an owning record's
/// reference list.
///
/// The manager owns the replace-and-cleanup policy. It never mutates owning
/// records; callers persist the returned reference in a separate step.
pub struct AttachmentManager<S: BlobStore> {
    store: Arc<S>,
    policy: UploadPolicy,
    route_prefix: String,
}

impl<S: BlobStore> AttachmentManager<S> {
    /// Create a new attachment manager.
    #[must_use]
    pub fn new(store: Arc<S>, policy: UploadPolicy) -> Self {
        Self {
            store,
            policy,
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
        }
    }

    /// Set the public path prefix used when building retrieval URLs.
    #[must_use]
    pub fn with_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    /// Get the upload policy.
    #[must_use]
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Store a new blob and attempt to remove the one it supersedes.
    ///
    /// The new blob's write is strictly ordered before any delete of the
    /// previous one. Cleanup trouble never fails the request: a superseded
    /// blob that cannot be removed is logged and left as an orphan, and the
    /// outcome reports `deleted_previous: false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload violates the upload policy or the
    /// store write fails. No identifier is produced on failure.
    pub async fn upload_and_swap(
        &self,
        input: UploadInput,
    ) -> Result<SwapOutcome, AttachmentError> {
        self.validate(&input)?;

        let metadata = HashMap::from([("source".to_string(), "pet-photo".to_string())]);
        let file_id = self
            .store
            .put(input.bytes, &input.content_type, &input.filename, metadata)
            .await?;

        info!(
            blob_id = %file_id,
            content_type = %input.content_type,
            filename = %input.filename,
            "blob stored"
        );

        let deleted_previous = match input.previous.as_deref() {
            Some(previous) => self.cleanup_previous(previous, file_id).await,
            None => false,
        };

        Ok(SwapOutcome {
            file_id,
            url: format!("{}/{file_id}", self.route_prefix),
            deleted_previous,
        })
    }

    /// Validate an upload against the policy before touching the store.
    fn validate(&self, input: &UploadInput) -> Result<(), AttachmentError> {
        if input.bytes.is_empty() {
            return Err(AttachmentError::EmptyUpload);
        }
        if !self.policy.allows_content_type(&input.content_type) {
            return Err(AttachmentError::unsupported_content_type(
                input.content_type.clone(),
            ));
        }
        let size = input.bytes.len() as u64;
        if size > self.policy.max_bytes {
            return Err(AttachmentError::payload_too_large(
                size,
                self.policy.max_bytes,
            ));
        }
        Ok(())
    }

    /// Best-effort removal of a superseded blob.
    ///
    /// Returns whether the blob was actually removed. Never fails the
    /// surrounding request.
    async fn cleanup_previous(&self, previous: &str, new_id: Uuid) -> bool {
        let normalized = extract_reference_id(previous);
        let Ok(previous_id) = Uuid::parse_str(&normalized) else {
            warn!(
                reference = %previous,
                "previous reference does not normalize to an identifier, skipping cleanup"
            );
            return false;
        };

        if previous_id == new_id {
            debug!(blob_id = %new_id, "previous reference equals new blob, skipping cleanup");
            return false;
        }

        match self.store.delete(previous_id).await {
            Ok(true) => {
                info!(blob_id = %previous_id, "superseded blob removed");
                true
            }
            Ok(false) => {
                debug!(blob_id = %previous_id, "superseded blob already gone");
                false
            }
            Err(e) => {
                warn!(
                    blob_id = %previous_id,
                    error = %e,
                    "failed to remove superseded blob, orphan left in store"
                );
                false
            }
        }
    }

    /// Remove blobs dropped by a full replacement of a record's reference
    /// list.
    ///
    /// Computes the normalized set difference between the old and new lists
    /// and attempts to delete each orphan. Failures are logged per id and do
    /// not abort the remaining deletions.
    pub async fn reconcile_on_record_replace(
        &self,
        old_references: &[String],
        new_references: &[String],
    ) -> ReconcileOutcome {
        let kept: HashSet<Uuid> = new_references
            .iter()
            .filter_map(|reference| Uuid::parse_str(&extract_reference_id(reference)).ok())
            .collect();

        let mut outcome = ReconcileOutcome::default();
        let mut seen = HashSet::new();

        for reference in old_references {
            let normalized = extract_reference_id(reference);
            let Ok(id) = Uuid::parse_str(&normalized) else {
                warn!(reference = %reference, "skipping reference that does not normalize to an identifier");
                continue;
            };
            if kept.contains(&id) || !seen.insert(id) {
                continue;
            }

            match self.store.delete(id).await {
                Ok(true) => {
                    info!(blob_id = %id, "orphaned blob removed");
                    outcome.removed.push(id);
                }
                Ok(false) => {
                    debug!(blob_id = %id, "orphaned blob already gone");
                    outcome.removed.push(id);
                }
                Err(e) => {
                    warn!(blob_id = %id, error = %e, "failed to remove orphaned blob");
                    outcome.failed.push(id);
                }
            }
        }

        outcome
    }

    /// Open a blob for download.
    ///
    /// Validates the identifier syntactically, probes the descriptor, then
    /// reads the payload.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentError::InvalidIdentifier`] for malformed input
    /// and [`AttachmentError::NotFound`] when no blob exists under the id.
    pub async fn open_download(&self, raw_id: &str) -> Result<BlobDownload, AttachmentError> {
        let id = Uuid::parse_str(raw_id.trim())
            .map_err(|_| AttachmentError::invalid_identifier(raw_id))?;

        if self.store.exists_metadata(id).await?.is_none() {
            return Err(AttachmentError::NotFound(id));
        }

        self.store.get(id).await.map_err(|e| {
            if e.is_not_found() {
                AttachmentError::NotFound(id)
            } else {
                AttachmentError::Storage(e)
            }
        })
    }
}
