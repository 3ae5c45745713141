//! Type definitions for SQLDesk

pub mod result;
pub mod value;

pub use result::{DatabaseObjects, QueryResult, SchemaObjects};
pub use value::SqlValue;
