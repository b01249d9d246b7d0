//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Photo upload, download, and reconcile routes
//! - Error-to-status mapping
//! - Router middleware layers

pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use pawtrait_core::attachment::AttachmentManager;
use pawtrait_core::storage::ObjectBlobStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Extra room on top of the upload ceiling for multipart framing and the
/// non-file form fields, so oversized payloads are rejected by the policy
/// rather than the framework.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Attachment manager over the process-wide blob store handle.
    pub attachments: Arc<AttachmentManager<ObjectBlobStore>>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .attachments
        .policy()
        .max_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .merge(routes::health::routes())
        .nest("/api", routes::photos::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
        .with_state(state)
}
