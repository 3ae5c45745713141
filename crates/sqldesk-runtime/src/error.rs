//! Runtime error types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by the driver layer
///
/// Carries the downstream message verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct DriverError(pub String);

impl From<sqlx::Error> for DriverError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DriverError(db_err.message().to_string()),
            other => DriverError(other.to_string()),
        }
    }
}

/// Query executor error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    /// SQL or connection failure, message forwarded verbatim
    #[error("{0}")]
    Execution(String),

    /// The call did not finish within the configured timeout
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// Address scheme has no driver
    #[error("unsupported connection url scheme: {0}")]
    UnsupportedAddress(String),
}

impl From<DriverError> for ExecutorError {
    fn from(err: DriverError) -> Self {
        ExecutorError::Execution(err.0)
    }
}

/// Archive error
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O failure on an archive path
    #[error("archive I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Requested file name escapes the archive root or is malformed
    #[error("invalid archive file name: {0}")]
    InvalidFileName(String),

    /// Requested file does not exist
    #[error("archive file not found: {0}")]
    NotFound(String),
}

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, ExecutorError>;
