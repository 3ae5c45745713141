//! REST API type definitions

use serde::{Deserialize, Serialize};
use sqldesk_runtime::{ArtifactArchiver, MetadataRecorder, QueryExecutor};
use std::sync::Arc;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<QueryExecutor>,
    pub recorder: Arc<MetadataRecorder>,
    pub archiver: Arc<ArtifactArchiver>,
}

impl AppState {
    pub fn new(
        executor: Arc<QueryExecutor>,
        recorder: Arc<MetadataRecorder>,
        archiver: Arc<ArtifactArchiver>,
    ) -> Self {
        Self {
            executor,
            recorder,
            archiver,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Query parameters of the history endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    #[serde(default)]
    pub connection_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}
