//! Request payloads and their decoder
//!
//! Each POST endpoint declares its payload type; `decode` parses the raw
//! body and checks it against that type without side effects.

use crate::error::{DecodeError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Payload accepted by one endpoint
pub trait EndpointRequest: DeserializeOwned {
    /// Endpoint name used in error messages
    const ENDPOINT: &'static str;

    /// Checks beyond shape and type (e.g. non-empty fields)
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Decode a raw request body for endpoint `T`
pub fn decode<T: EndpointRequest>(body: &[u8]) -> Result<T> {
    let request: T = serde_json::from_slice(body).map_err(|e| {
        if e.is_data() {
            DecodeError::Schema {
                endpoint: T::ENDPOINT,
                reason: e.to_string(),
            }
        } else {
            DecodeError::Malformed(e.to_string())
        }
    })?;

    request.validate().map_err(|reason| DecodeError::Schema {
        endpoint: T::ENDPOINT,
        reason,
    })?;

    Ok(request)
}

fn require_non_empty(field: &str, value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("field `{}` must not be empty", field))
    } else {
        Ok(())
    }
}

/// Body of the query endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub connection_url: String,
}

impl EndpointRequest for QueryRequest {
    const ENDPOINT: &'static str = "query";

    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("connectionUrl", &self.connection_url)
    }
}

/// Body of the database and schema structure endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureRequest {
    pub connection_url: String,
}

impl EndpointRequest for StructureRequest {
    const ENDPOINT: &'static str = "structure";

    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("connectionUrl", &self.connection_url)
    }
}

/// Body of the table structure endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStructureRequest {
    pub connection_url: String,
    pub table: String,
}

impl EndpointRequest for TableStructureRequest {
    const ENDPOINT: &'static str = "table";

    fn validate(&self) -> std::result::Result<(), String> {
        require_non_empty("connectionUrl", &self.connection_url)?;
        require_non_empty("table", &self.table)
    }
}
