//! REST API implementation
//!
//! - types: shared state and parameter types
//! - extractors: request body decoding into endpoint payloads
//! - handlers: endpoint handlers
//! - router: router creation and configuration

mod extractors;
mod handlers;
mod router;
pub mod types;

// Re-export public API
pub use extractors::Decoded;
pub use router::create_router;
pub use types::{AppState, HealthResponse, HistoryParams};
