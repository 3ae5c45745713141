//! Custom extractors
//!
//! `Decoded<T>` turns a request body into an endpoint payload. Decode
//! failures become an error envelope with HTTP 200 before the handler
//! runs, so no database is touched.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqldesk_core::{response, EndpointRequest};

/// Request body decoded and validated as `T`
pub struct Decoded<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Decoded<T>
where
    T: EndpointRequest + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| reject(format!("Failed to read request body: {}", rejection)))?;

        sqldesk_core::decode::<T>(&body)
            .map(Decoded)
            .map_err(|e| reject(e.to_string()))
    }
}

fn reject(message: String) -> Response {
    tracing::warn!("Rejected request body: {}", message);
    (StatusCode::OK, Json(response::error(message))).into_response()
}
