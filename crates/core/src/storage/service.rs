//! Blob store implementation using Apache OpenDAL.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Descriptor stored alongside every blob.
///
/// The payload object and this descriptor live under the same identifier;
/// the descriptor alone answers existence probes and header lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMeta {
    /// MIME type recorded at upload time.
    pub content_type: String,
    /// Payload size in bytes.
    pub size: u64,
    /// Original filename supplied by the uploader.
    pub filename: String,
    /// When the blob was stored.
    pub created_at: DateTime<Utc>,
    /// Small free-form key-value metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A retrieved blob: descriptor plus payload.
#[derive(Debug, Clone)]
pub struct BlobDownload {
    /// Blob descriptor.
    pub meta: BlobMeta,
    /// Payload bytes.
    pub bytes: Bytes,
}

/// Durable blob storage keyed by store-generated identifiers.
///
/// Implemented over object storage in production and by in-memory doubles
/// in tests.
pub trait BlobStore: Send + Sync {
    /// Store a payload and return a fresh identifier.
    ///
    /// No identifier is produced unless the payload is durably stored.
    fn put(
        &self,
        bytes: Bytes,
        content_type: &str,
        filename: &str,
        metadata: HashMap<String, String>,
    ) -> impl std::future::Future<Output = Result<Uuid, StorageError>> + Send;

    /// Retrieve a blob's descriptor and payload.
    fn get(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<BlobDownload, StorageError>> + Send;

    /// Remove a blob.
    ///
    /// Returns `Ok(true)` when the blob was removed and `Ok(false)` when it
    /// was already gone. Transport-level failures surface as
    /// [`StorageError::Fault`], never silently.
    fn delete(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, StorageError>> + Send;

    /// Cheap existence probe returning the descriptor without opening the
    /// payload object.
    fn exists_metadata(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<BlobMeta>, StorageError>> + Send;
}

/// OpenDAL-backed blob store.
pub struct ObjectBlobStore {
    operator: Operator,
    config: StorageConfig,
}

impl ObjectBlobStore {
    /// Create a new blob store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
        };
        Ok(operator)
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Key of the payload object for `id`.
    fn data_key(&self, id: Uuid) -> String {
        format!("{}/{id}", self.config.key_prefix)
    }

    /// Key of the descriptor object for `id`.
    fn meta_key(&self, id: Uuid) -> String {
        format!("{}/{id}.meta", self.config.key_prefix)
    }

    async fn read_descriptor(&self, id: Uuid) -> Result<BlobMeta, StorageError> {
        let raw = self
            .operator
            .read(&self.meta_key(id))
            .await
            .map_err(|e| StorageError::from_opendal(id, &e))?;

        serde_json::from_slice(&raw.to_bytes()).map_err(|e| StorageError::CorruptDescriptor {
            id,
            reason: e.to_string(),
        })
    }
}

impl BlobStore for ObjectBlobStore {
    async fn put(
        &self,
        bytes: Bytes,
        content_type: &str,
        filename: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Uuid, StorageError> {
        let id = Uuid::new_v4();
        let descriptor = BlobMeta {
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            filename: filename.to_string(),
            created_at: Utc::now(),
            metadata,
        };

        let data_key = self.data_key(id);
        self.operator
            .write_with(&data_key, bytes)
            .content_type(content_type)
            .await
            .map_err(|e| StorageError::from_opendal(id, &e))?;

        let raw = serde_json::to_vec(&descriptor)
            .map_err(|e| StorageError::fault(format!("descriptor encoding failed: {e}")))?;

        if let Err(e) = self.operator.write(&self.meta_key(id), raw).await {
            // Unwind the payload so a half-written blob cannot be observed.
            if let Err(cleanup) = self.operator.delete(&data_key).await {
                warn!(blob_id = %id, error = %cleanup, "failed to unwind payload after descriptor write failure");
            }
            return Err(StorageError::from_opendal(id, &e));
        }

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<BlobDownload, StorageError> {
        let meta = self.read_descriptor(id).await?;

        let buffer = self
            .operator
            .read(&self.data_key(id))
            .await
            .map_err(|e| StorageError::from_opendal(id, &e))?;

        Ok(BlobDownload {
            meta,
            bytes: buffer.to_bytes(),
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        // Probe the descriptor so "already gone" is distinguishable from a
        // transport fault.
        match self.operator.stat(&self.meta_key(id)).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StorageError::fault(e.to_string())),
        }

        self.operator
            .delete(&self.data_key(id))
            .await
            .map_err(|e| StorageError::fault(e.to_string()))?;
        self.operator
            .delete(&self.meta_key(id))
            .await
            .map_err(|e| StorageError::fault(e.to_string()))?;

        Ok(true)
    }

    async fn exists_metadata(&self, id: Uuid) -> Result<Option<BlobMeta>, StorageError> {
        match self.read_descriptor(id).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ObjectBlobStore {
        let root = std::env::temp_dir().join(format!("pawtrait-store-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("should create temp root");
        let config = StorageConfig::new(StorageProvider::local_fs(root));
        ObjectBlobStore::from_config(config).expect("should create store")
    }

    fn sample_metadata() -> HashMap<String, String> {
        HashMap::from([("source".to_string(), "pet-photo".to_string())])
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let store = temp_store();
        let payload = Bytes::from_static(b"not actually a png");

        let id = store
            .put(payload.clone(), "image/png", "rex.png", sample_metadata())
            .await
            .expect("put should succeed");

        let download = store.get(id).await.expect("get should succeed");
        assert_eq!(download.bytes, payload);
        assert_eq!(download.meta.content_type, "image/png");
        assert_eq!(download.meta.filename, "rex.png");
        assert_eq!(download.meta.size, payload.len() as u64);
        assert_eq!(
            download.meta.metadata.get("source").map(String::as_str),
            Some("pet-photo")
        );
    }

    #[tokio::test]
    async fn test_get_missing_blob_is_not_found() {
        let store = temp_store();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_exists_metadata_probe() {
        let store = temp_store();
        assert!(
            store
                .exists_metadata(Uuid::new_v4())
                .await
                .expect("probe should succeed")
                .is_none()
        );

        let id = store
            .put(
                Bytes::from_static(b"x"),
                "image/jpeg",
                "upload",
                HashMap::new(),
            )
            .await
            .expect("put should succeed");

        let meta = store
            .exists_metadata(id)
            .await
            .expect("probe should succeed")
            .expect("blob should exist");
        assert_eq!(meta.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = temp_store();
        let id = store
            .put(
                Bytes::from_static(b"x"),
                "image/png",
                "upload",
                HashMap::new(),
            )
            .await
            .expect("put should succeed");

        assert!(store.delete(id).await.expect("first delete should succeed"));
        assert!(
            !store
                .delete(id)
                .await
                .expect("second delete should also succeed")
        );
        assert!(store.get(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_unknown_blob_reports_already_gone() {
        let store = temp_store();
        assert!(!store.delete(Uuid::new_v4()).await.expect("should succeed"));
    }
}
