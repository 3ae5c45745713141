//! Service initialization
//!
//! Builds the executor, metadata recorder and archiver from server
//! configuration and prepares the metadata store.

use crate::api::rest::AppState;
use crate::config::ServerConfig;
use anyhow::{Context, Result};
use sqldesk_core::ConnectionRegistry;
use sqldesk_runtime::{ArtifactArchiver, MetadataRecorder, QueryExecutor};
use std::sync::Arc;
use tracing::{info, warn};

/// Initialize shared service state
///
/// Fails when the metadata store is unreachable or its table cannot be
/// created.
pub async fn init_state(config: &ServerConfig) -> Result<AppState> {
    let registry = ConnectionRegistry::new(config.metadata_address());

    let executor = Arc::new(
        QueryExecutor::new(registry)
            .with_max_concurrent(config.max_concurrent_queries)
            .with_timeout(config.query_timeout()),
    );
    info!(
        "✓ Query executor ready (max_concurrent: {}, timeout: {:?})",
        executor.max_concurrent(),
        executor.timeout()
    );

    let recorder = MetadataRecorder::new(executor.clone())
        .context("Metadata store address is not supported")?;
    recorder
        .ensure_schema()
        .await
        .context("Failed to prepare metadata store")?;

    let archiver = ArtifactArchiver::new(config.archive_dir.clone());
    match archiver.latest_stamp().await {
        Ok(Some(stamp)) => {
            recorder.resume_after(stamp);
            info!("Resuming query stamps after {}", stamp.archive_name());
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to scan query archive: {}", e),
    }
    info!("✓ Query archive at {}", archiver.root().display());

    Ok(AppState::new(executor, Arc::new(recorder), Arc::new(archiver)))
}
