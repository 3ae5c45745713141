//! Error types for SQLDesk Core

use thiserror::Error;

/// Request body could not be decoded for an endpoint
///
/// Decoding has no side effects; callers short-circuit to an error
/// envelope without touching any database.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Body is not valid JSON
    #[error("Malformed JSON body: {0}")]
    Malformed(String),

    /// Body is JSON but does not match the endpoint's schema
    #[error("Invalid request for '{endpoint}': {reason}")]
    Schema {
        endpoint: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
