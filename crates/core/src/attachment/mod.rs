//! Attachment lifecycle management.
//!
//! This module owns the replace-and-cleanup policy for photo attachments:
//! - Upload validation (size ceiling, content-type prefix)
//! - Upload-and-swap with best-effort removal of the superseded blob
//! - Reference-list reconciliation on record replacement
//! - The download path with identifier validation

mod error;
mod reference;
mod service;
mod types;

pub use error::AttachmentError;
pub use reference::extract_reference_id;
pub use service::AttachmentManager;
pub use types::{ReconcileOutcome, SwapOutcome, UploadInput, UploadPolicy};
