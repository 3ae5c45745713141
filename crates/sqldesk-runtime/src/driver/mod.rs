//! Driver layer
//!
//! The executor reaches databases only through [`SqlDriver`]. The default
//! implementation is [`SqlxDriver`]; tests plug in their own.

mod decode;
mod sqlx_driver;

pub use decode::ColumnKind;
pub use sqlx_driver::SqlxDriver;

use crate::error::DriverError;
use async_trait::async_trait;
use sqldesk_core::{ConnectionAddress, QueryResult, SqlValue};

/// Connect, run one statement, fetch its columns and rows, disconnect
#[async_trait]
pub trait SqlDriver: Send + Sync {
    /// Run `sql` against `address` with positional `params`
    ///
    /// Statements without a result set yield [`QueryResult::NoRows`]; a
    /// result set with zero rows still yields `Rows` with its column names.
    async fn fetch(
        &self,
        address: &ConnectionAddress,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, DriverError>;
}
