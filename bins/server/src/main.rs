//! Pawtrait API Server
//!
//! Main entry point for the photo attachment service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pawtrait_api::{AppState, create_router};
use pawtrait_core::attachment::{AttachmentManager, UploadPolicy};
use pawtrait_core::storage::{ObjectBlobStore, StorageConfig, StorageProvider};
use pawtrait_shared::AppConfig;
use pawtrait_shared::config::StorageSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawtrait=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Build the blob store handle, shared for the life of the process
    let provider = storage_provider(&config.storage);
    let store = ObjectBlobStore::from_config(StorageConfig::new(provider))?;
    info!(provider = store.provider_name(), "Blob store initialized");

    let policy = UploadPolicy::default()
        .with_max_bytes(config.upload.max_bytes)
        .with_content_type_prefix(config.upload.allowed_content_type_prefix.clone());

    // Create application state
    let state = AppState {
        attachments: Arc::new(AttachmentManager::new(Arc::new(store), policy)),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Map deserialized storage settings to a concrete provider.
fn storage_provider(settings: &StorageSettings) -> StorageProvider {
    match settings {
        StorageSettings::S3 {
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        } => StorageProvider::s3(
            endpoint.clone(),
            bucket.clone(),
            access_key_id.clone(),
            secret_access_key.clone(),
            region.clone(),
        ),
        StorageSettings::AzureBlob {
            account,
            access_key,
            container,
        } => StorageProvider::azure_blob(account.clone(), access_key.clone(), container.clone()),
        StorageSettings::LocalFs { root } => StorageProvider::local_fs(root.clone()),
    }
}
