//! API endpoint handlers
//!
//! Query-style endpoints always answer with a response envelope. Only the
//! history endpoint uses non-200 statuses.

use super::extractors::Decoded;
use super::types::*;
use crate::error::{ServerError, MISSING_HISTORY_PARAMETER};
use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use sqldesk_core::{
    response, ConnectionAddress, QueryRequest, QueryResult, ResponseEnvelope, StructureRequest,
    TableStructureRequest,
};
use sqldesk_runtime::ArchiveOutput;
use tokio_util::io::ReaderStream;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Query endpoint
///
/// Records the query in the metadata store, archives its text, runs it and
/// archives the outcome. The archived output and the response always
/// describe the same outcome.
pub(super) async fn execute_query(
    State(state): State<AppState>,
    Decoded(request): Decoded<QueryRequest>,
) -> Json<ResponseEnvelope> {
    let address = ConnectionAddress::new(request.connection_url);
    let span = info_span!("query", request_id = %Uuid::new_v4(), target = %address);

    async move {
        if state.executor.registry().is_metadata(&address) {
            warn!("Query targets the metadata store");
        }

        let stamp = match state.recorder.record_query(&address, &request.query).await {
            Ok(stamp) => stamp,
            Err(e) => {
                error!("Failed to record query history: {}", e);
                return Json(response::error(format!(
                    "failed to record query history: {}",
                    e
                )));
            }
        };
        info!("Recorded query as {}", stamp.archive_name());

        if let Err(e) = state.archiver.write_input(&stamp, &request.query).await {
            warn!("Failed to archive query input: {}", e);
        }

        let outcome = state
            .executor
            .execute_query(&address, &request.query)
            .await
            .map_err(|e| e.to_string());

        let archived = match &outcome {
            Ok(result) => ArchiveOutput::Result(result),
            Err(message) => ArchiveOutput::Error(message),
        };
        if let Err(e) = state.archiver.write_output(&stamp, archived).await {
            warn!("Failed to archive query output: {}", e);
        }

        match outcome {
            Ok(result) => {
                info!(
                    "Query succeeded with {} columns and {} rows",
                    result.columns().len(),
                    result.row_count()
                );
                Json(response::success_with_result(result))
            }
            Err(message) => {
                warn!("Query failed: {}", message);
                Json(response::error(message))
            }
        }
    }
    .instrument(span)
    .await
}

/// Database structure endpoint: tables and views
pub(super) async fn database_structure(
    State(state): State<AppState>,
    Decoded(request): Decoded<StructureRequest>,
) -> Json<ResponseEnvelope> {
    let address = ConnectionAddress::new(request.connection_url);
    let span = info_span!("database", request_id = %Uuid::new_v4(), target = %address);

    async move {
        match state.executor.get_database_objects(&address).await {
            Ok(objects) => Json(response::success_with_database_objects(objects)),
            Err(e) => {
                warn!("Database structure failed: {}", e);
                Json(response::error(e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}

/// Schema structure endpoint
pub(super) async fn schema_structure(
    State(state): State<AppState>,
    Decoded(request): Decoded<StructureRequest>,
) -> Json<ResponseEnvelope> {
    let address = ConnectionAddress::new(request.connection_url);
    let span = info_span!("schema", request_id = %Uuid::new_v4(), target = %address);

    async move {
        match state.executor.get_schema_objects(&address).await {
            Ok(schemas) => Json(response::success_with_schema_objects(schemas)),
            Err(e) => {
                warn!("Schema structure failed: {}", e);
                Json(response::error(e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}

/// Table structure endpoint: one row per column
pub(super) async fn table_structure(
    State(state): State<AppState>,
    Decoded(request): Decoded<TableStructureRequest>,
) -> Json<ResponseEnvelope> {
    let address = ConnectionAddress::new(request.connection_url);
    let span = info_span!(
        "table",
        request_id = %Uuid::new_v4(),
        target = %address,
        table = %request.table
    );

    async move {
        match state.executor.get_table_summary(&address, &request.table).await {
            Ok(summary) => Json(response::success_with_result(summary)),
            Err(e) => {
                warn!("Table structure failed: {}", e);
                Json(response::error(e.to_string()))
            }
        }
    }
    .instrument(span)
    .await
}

/// History endpoint
///
/// `connectionUrl` lists the recorded queries for that address, newest
/// first. Otherwise `fileName` downloads one archived file. `connectionUrl`
/// wins when both are given.
pub(super) async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Response, ServerError> {
    let connection_url = params.connection_url.filter(|s| !s.is_empty());
    let file_name = params.file_name.filter(|s| !s.is_empty());

    if let Some(url) = connection_url {
        let address = ConnectionAddress::new(url);
        let span = info_span!("history", request_id = %Uuid::new_v4(), target = %address);

        let envelope = async {
            match state.recorder.history(&address).await {
                Ok(QueryResult::Rows { columns, rows }) => response::history_success(&columns, rows),
                Ok(QueryResult::NoRows) => response::history_success(&[], Vec::new()),
                Err(e) => {
                    error!("Failed to read query history: {}", e);
                    response::error(e.to_string())
                }
            }
        }
        .instrument(span)
        .await;

        return Ok(Json(envelope).into_response());
    }

    if let Some(file_name) = file_name {
        let span = info_span!("download", request_id = %Uuid::new_v4(), file = %file_name);

        return async {
            let (file, base_name) = state.archiver.open(&file_name).await.map_err(|e| {
                warn!("Archive download failed: {}", e);
                ServerError::from(e)
            })?;
            info!("Streaming archived file {}", base_name);

            let headers = [
                (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", base_name),
                ),
            ];
            Ok::<_, ServerError>((headers, Body::from_stream(ReaderStream::new(file))).into_response())
        }
        .instrument(span)
        .await;
    }

    Err(ServerError::MissingParameter(
        MISSING_HISTORY_PARAMETER.to_string(),
    ))
}
