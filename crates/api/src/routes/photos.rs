//! Photo attachment routes.

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;
use pawtrait_core::attachment::{AttachmentError, UploadInput};
use pawtrait_shared::AppError;

/// Filename recorded when the client supplies none.
const DEFAULT_FILENAME: &str = "upload";

/// Cache directive for served blobs; content under an identifier never
/// changes once stored.
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Creates the photo routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/photos/upload", post(upload_photo))
        .route("/photos/reconcile", post(reconcile_references))
        .route("/photos/{id}", get(download_photo))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a successful upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Identifier of the stored blob.
    pub file_id: Uuid,
    /// Same-origin retrieval path.
    pub url: String,
    /// Whether the superseded blob was removed.
    pub deleted_previous: bool,
}

/// Request body for reference-list reconciliation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    /// The record's reference list before the update.
    #[serde(default)]
    pub previous: Vec<String>,
    /// The record's reference list after the update.
    #[serde(default)]
    pub current: Vec<String>,
}

/// Response for reference-list reconciliation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    /// Orphans no longer present in the store.
    pub removed: Vec<Uuid>,
    /// Orphans whose removal failed.
    pub failed: Vec<Uuid>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Build the JSON error payload for an application error.
fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

/// Map a domain error to the boundary taxonomy.
fn to_app_error(err: &AttachmentError) -> AppError {
    match err {
        AttachmentError::NotFound(id) => AppError::NotFound(format!("photo {id}")),
        AttachmentError::Storage(_) => AppError::Storage("storage operation failed".to_string()),
        other => AppError::Validation(other.to_string()),
    }
}

/// Collected multipart form fields for an upload.
#[derive(Default)]
struct UploadForm {
    file: Option<(Bytes, String)>,
    part_filename: Option<String>,
    filename: Option<String>,
    previous: Option<String>,
}

/// Drain the multipart body into an upload form.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(AppError::Validation(format!("malformed upload body: {e}"))),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .map_or_else(|| "application/octet-stream".to_string(), str::to_string);
                form.part_filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read file: {e}")))?;
                form.file = Some((bytes, content_type));
            }
            Some("filename") => {
                form.filename = field.text().await.ok().filter(|s| !s.is_empty());
            }
            Some("previousId") => {
                form.previous = field.text().await.ok().filter(|s| !s.is_empty());
            }
            _ => {
                // Unknown fields are drained and ignored.
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/api/photos/upload`
/// Store a photo and attempt to remove the one it supersedes.
async fn upload_photo(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(e) => return error_response(&e),
    };

    let Some((bytes, content_type)) = form.file else {
        return error_response(&AppError::Validation("no file provided".to_string()));
    };

    let filename = form
        .filename
        .or(form.part_filename)
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    let input = UploadInput {
        bytes,
        content_type,
        filename,
        previous: form.previous,
    };

    match state.attachments.upload_and_swap(input).await {
        Ok(outcome) => {
            info!(
                blob_id = %outcome.file_id,
                deleted_previous = outcome.deleted_previous,
                "photo uploaded"
            );
            (
                StatusCode::CREATED,
                Json(UploadResponse {
                    file_id: outcome.file_id,
                    url: outcome.url,
                    deleted_previous: outcome.deleted_previous,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "photo upload failed");
            error_response(&to_app_error(&e))
        }
    }
}

/// GET `/api/photos/{id}`
/// Serve a stored photo.
async fn download_photo(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.attachments.open_download(&id).await {
        Ok(download) => {
            let content_type = HeaderValue::from_str(&download.meta.content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CACHE_CONTROL,
                        HeaderValue::from_static(IMMUTABLE_CACHE),
                    ),
                ],
                Body::from(download.bytes),
            )
                .into_response()
        }
        Err(e) => {
            warn!(photo_id = %id, error = %e, "photo download failed");
            error_response(&to_app_error(&e))
        }
    }
}

/// POST `/api/photos/reconcile`
/// Remove blobs dropped by a full replacement of a record's reference list.
async fn reconcile_references(
    State(state): State<AppState>,
    Json(payload): Json<ReconcileRequest>,
) -> Response {
    let outcome = state
        .attachments
        .reconcile_on_record_replace(&payload.previous, &payload.current)
        .await;

    info!(
        removed = outcome.removed.len(),
        failed = outcome.failed.len(),
        "reference list reconciled"
    );

    (
        StatusCode::OK,
        Json(ReconcileResponse {
            removed: outcome.removed,
            failed: outcome.failed,
        }),
    )
        .into_response()
}
