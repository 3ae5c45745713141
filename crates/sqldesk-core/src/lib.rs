//! SQLDesk Core - Core types shared by the SQLDesk query service
//!
//! This crate provides the fundamental types used across the workspace:
//! - Connection addresses and the metadata store convention
//! - Value and result types for query output
//! - Request payloads and their decoder
//! - The uniform response envelope

pub mod address;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

// Re-export commonly used types
pub use address::{ConnectionAddress, ConnectionRegistry, DEFAULT_METADATA_URL};
pub use error::DecodeError;
pub use request::{decode, EndpointRequest, QueryRequest, StructureRequest, TableStructureRequest};
pub use response::ResponseEnvelope;
pub use types::{DatabaseObjects, QueryResult, SchemaObjects, SqlValue};
