//! SQLDesk Runtime - Query execution, history and archival
//!
//! This crate runs queries and introspection calls against arbitrary
//! databases, records every query in the metadata store and archives each
//! query's input and output files.

pub mod archive;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod executor;
pub mod metadata;

// Re-export main types
pub use archive::{ArchiveOutput, ArtifactArchiver};
pub use dialect::Dialect;
pub use driver::{SqlDriver, SqlxDriver};
pub use error::{ArchiveError, DriverError, ExecutorError, Result};
pub use executor::{QueryExecutor, DEFAULT_MAX_CONCURRENT_QUERIES, DEFAULT_QUERY_TIMEOUT};
pub use metadata::{MetadataRecorder, QueryStamp, StampClock};
