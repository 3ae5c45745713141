//! Server error types
//!
//! Query-style endpoints answer failures with an error envelope and HTTP
//! 200; `ServerError` covers the statuses outside that contract (history
//! parameters, archive downloads, startup).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqldesk_runtime::ArchiveError;
use std::fmt;

/// Message returned when history is called without a recognized parameter
pub const MISSING_HISTORY_PARAMETER: &str = "Connection URL or File Name is needed.";

/// Server error type
#[derive(Debug)]
pub enum ServerError {
    /// Required query parameter absent
    MissingParameter(String),

    /// Invalid request
    InvalidRequest(String),

    /// Not found
    NotFound(String),

    /// Internal server error
    InternalError(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingParameter(_) | ServerError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ServerError::MissingParameter(msg)
            | ServerError::InvalidRequest(msg)
            | ServerError::NotFound(msg)
            | ServerError::InternalError(msg) => msg,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::MissingParameter(msg) => write!(f, "Missing parameter: {}", msg),
            ServerError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ServerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServerError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.message(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<ArchiveError> for ServerError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::InvalidFileName(_) => ServerError::InvalidRequest(err.to_string()),
            ArchiveError::NotFound(_) => ServerError::NotFound(err.to_string()),
            ArchiveError::Io { .. } => ServerError::InternalError(err.to_string()),
        }
    }
}
