//! SQL dialects
//!
//! Introspection and metadata statements differ per backend; everything
//! else is passed through to the database untouched.

use crate::error::{ExecutorError, Result};
use sqldesk_core::{ConnectionAddress, SqlValue};

/// Backend family of a connection address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MySql,
}

impl Dialect {
    /// Detect the backend from the address scheme
    ///
    /// A `+driver` suffix (`postgresql+psycopg2://`) is ignored.
    pub fn from_address(address: &ConnectionAddress) -> Result<Self> {
        let scheme = address
            .scheme()
            .ok_or_else(|| ExecutorError::UnsupportedAddress(address.redacted()))?;
        let base = scheme.split('+').next().unwrap_or_default();

        match base {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            _ => Err(ExecutorError::UnsupportedAddress(scheme)),
        }
    }

    /// Positional placeholder for the `n`-th (1-based) parameter
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Sqlite | Dialect::Postgres => format!("${}", n),
            Dialect::MySql => "?".to_string(),
        }
    }

    /// Quote an identifier, preserving its case
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::Sqlite | Dialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Single-column listing of base tables, ordered by name
    pub fn tables_sql(&self) -> &'static str {
        match self {
            Dialect::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
            Dialect::Postgres => {
                "SELECT table_name::text AS table_name FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
                 ORDER BY table_name"
            }
            Dialect::MySql => {
                "SELECT table_name AS table_name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
                 ORDER BY table_name"
            }
        }
    }

    /// Single-column listing of views, ordered by name
    pub fn views_sql(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'view' ORDER BY name",
            Dialect::Postgres => {
                "SELECT table_name::text AS table_name FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_type = 'VIEW' \
                 ORDER BY table_name"
            }
            Dialect::MySql => {
                "SELECT table_name AS table_name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_type = 'VIEW' \
                 ORDER BY table_name"
            }
        }
    }

    /// Single-column listing of schemas
    pub fn schemas_sql(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "SELECT name FROM pragma_database_list ORDER BY seq",
            Dialect::Postgres => {
                "SELECT schema_name::text AS schema_name FROM information_schema.schemata \
                 WHERE schema_name <> 'information_schema' AND schema_name NOT LIKE 'pg\\_%' \
                 ORDER BY schema_name"
            }
            Dialect::MySql => {
                "SELECT schema_name AS schema_name FROM information_schema.schemata \
                 ORDER BY schema_name"
            }
        }
    }

    /// Column summary of one table
    ///
    /// Returns `column_name, data_type, is_nullable, column_default` per
    /// column, in ordinal order. `schema.table` selects a schema explicitly.
    /// Names are always bound, never spliced into the statement.
    pub fn table_summary(&self, table: &str) -> (String, Vec<SqlValue>) {
        let (schema, name) = match table.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => (Some(schema), name),
            _ => (None, table),
        };

        let mut params = vec![SqlValue::from(name)];
        let sql = match self {
            Dialect::Sqlite => {
                params.push(SqlValue::from(schema.unwrap_or("main")));
                format!(
                    "SELECT name AS column_name, type AS data_type, \
                     CASE WHEN \"notnull\" = 0 THEN 'YES' ELSE 'NO' END AS is_nullable, \
                     dflt_value AS column_default \
                     FROM pragma_table_info({}, {}) ORDER BY cid",
                    self.placeholder(1),
                    self.placeholder(2)
                )
            }
            Dialect::Postgres | Dialect::MySql => {
                let cast = if *self == Dialect::Postgres { "::text" } else { "" };
                let schema_filter = match schema {
                    Some(schema) => {
                        params.push(SqlValue::from(schema));
                        format!("table_schema = {}", self.placeholder(2))
                    }
                    None if *self == Dialect::Postgres => "table_schema = current_schema()".to_string(),
                    None => "table_schema = DATABASE()".to_string(),
                };
                format!(
                    "SELECT column_name{cast} AS column_name, data_type{cast} AS data_type, \
                     is_nullable{cast} AS is_nullable, column_default{cast} AS column_default \
                     FROM information_schema.columns \
                     WHERE table_name = {} AND {} ORDER BY ordinal_position",
                    self.placeholder(1),
                    schema_filter,
                    cast = cast
                )
            }
        };

        (sql, params)
    }

    /// DDL creating the query history table if it is missing
    pub fn create_metadata_table_sql(&self) -> String {
        let id = match self {
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
            Dialect::MySql => "id BIGINT AUTO_INCREMENT PRIMARY KEY",
        };
        let ts_type = match self {
            Dialect::Sqlite => "INTEGER",
            Dialect::Postgres | Dialect::MySql => "BIGINT",
        };
        format!(
            "CREATE TABLE IF NOT EXISTS metadata ({}, query TEXT NOT NULL, ts {} NOT NULL, \
             {} TEXT NOT NULL, archive TEXT NOT NULL)",
            id,
            ts_type,
            self.quote_ident("connectionUrl")
        )
    }
}
