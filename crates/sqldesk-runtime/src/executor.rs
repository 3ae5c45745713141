//! Query executor
//!
//! Every database call goes through [`QueryExecutor::run`], which waits for a
//! permit from the bounded pool and enforces the call timeout. When the
//! timeout fires the in-flight driver future is dropped, closing its
//! connection.

use crate::dialect::Dialect;
use crate::driver::{SqlDriver, SqlxDriver};
use crate::error::{ExecutorError, Result};
use sqldesk_core::{
    ConnectionAddress, ConnectionRegistry, DatabaseObjects, QueryResult, SchemaObjects, SqlValue,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default number of database calls allowed in flight at once
pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 8;

/// Default per-call timeout
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(300);

/// Executes queries and introspection calls against connection addresses
pub struct QueryExecutor {
    driver: Arc<dyn SqlDriver>,
    registry: ConnectionRegistry,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    timeout: Duration,
}

impl QueryExecutor {
    /// Create an executor backed by the sqlx driver
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self::with_driver(Arc::new(SqlxDriver::new()), registry)
    }

    /// Create an executor backed by a custom driver
    pub fn with_driver(driver: Arc<dyn SqlDriver>, registry: ConnectionRegistry) -> Self {
        Self {
            driver,
            registry,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_QUERIES)),
            max_concurrent: DEFAULT_MAX_CONCURRENT_QUERIES,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Set the size of the call pool (at least one)
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        self.permits = Arc::new(Semaphore::new(max_concurrent));
        self.max_concurrent = max_concurrent;
        self
    }

    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a user query against `address`
    ///
    /// Driver failures surface as [`ExecutorError::Execution`] carrying the
    /// downstream message unchanged.
    pub async fn execute_query(
        &self,
        address: &ConnectionAddress,
        query: &str,
    ) -> Result<QueryResult> {
        Dialect::from_address(address)?;
        self.run(address, query, &[]).await
    }

    /// Run a parameterized statement against the metadata store
    pub async fn execute_metadata_query(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult> {
        self.run(self.registry.metadata(), sql, params).await
    }

    /// Dialect of the metadata store
    pub fn metadata_dialect(&self) -> Result<Dialect> {
        Dialect::from_address(self.registry.metadata())
    }

    /// List the tables and views of the database at `address`
    pub async fn get_database_objects(&self, address: &ConnectionAddress) -> Result<DatabaseObjects> {
        let dialect = Dialect::from_address(address)?;
        let tables = self.run(address, dialect.tables_sql(), &[]).await?;
        let views = self.run(address, dialect.views_sql(), &[]).await?;

        Ok(DatabaseObjects {
            tables: tables.first_column_strings(),
            views: views.first_column_strings(),
        })
    }

    /// List the schemas of the database at `address`
    pub async fn get_schema_objects(&self, address: &ConnectionAddress) -> Result<SchemaObjects> {
        let dialect = Dialect::from_address(address)?;
        let schemas = self.run(address, dialect.schemas_sql(), &[]).await?;
        Ok(schemas.first_column_strings())
    }

    /// Describe the columns of `table`, one row per column
    pub async fn get_table_summary(
        &self,
        address: &ConnectionAddress,
        table: &str,
    ) -> Result<QueryResult> {
        let dialect = Dialect::from_address(address)?;
        let (sql, params) = dialect.table_summary(table);
        let summary = self.run(address, &sql, &params).await?;

        if summary.row_count() == 0 {
            return Err(ExecutorError::Execution(format!("no such table: {}", table)));
        }
        Ok(summary)
    }

    async fn run(
        &self,
        address: &ConnectionAddress,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult> {
        let call = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| ExecutorError::Execution("query pool is closed".to_string()))?;
            self.driver
                .fetch(address, sql, params)
                .await
                .map_err(ExecutorError::from)
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Query on {} timed out after {:?}",
                    address,
                    self.timeout
                );
                Err(ExecutorError::Timeout(self.timeout))
            }
        }
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("registry", &self.registry)
            .field("max_concurrent", &self.max_concurrent)
            .field("timeout", &self.timeout)
            .finish()
    }
}
