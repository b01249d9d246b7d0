//! Blob storage adapter using Apache OpenDAL.
//!
//! This module provides vendor-agnostic binary storage with support for:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3
//! - Azure Blob Storage
//! - Local filesystem (development only)
//!
//! Each blob is stored as two objects under one generated identifier: the
//! raw payload and a small JSON descriptor holding content type, size,
//! filename, and metadata. The descriptor makes existence probes and
//! content-type lookups cheap on every backend.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{BlobDownload, BlobMeta, BlobStore, ObjectBlobStore};
