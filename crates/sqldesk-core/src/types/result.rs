//! Normalized query output

use super::value::SqlValue;
use serde::Serialize;

/// Outcome of a successful statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Statement produced a result set (possibly empty)
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<SqlValue>>,
    },
    /// Statement produced no result set (DDL, DML)
    NoRows,
}

impl QueryResult {
    /// Build a `Rows` result. Every row must be as wide as `columns`.
    pub fn rows(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        QueryResult::Rows { columns, rows }
    }

    pub fn has_rows(&self) -> bool {
        matches!(self, QueryResult::Rows { .. })
    }

    pub fn columns(&self) -> &[String] {
        match self {
            QueryResult::Rows { columns, .. } => columns,
            QueryResult::NoRows => &[],
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Rows { rows, .. } => rows.len(),
            QueryResult::NoRows => 0,
        }
    }

    /// Values of the first column rendered as text, skipping NULLs
    ///
    /// Used to turn single-column introspection results into name lists.
    pub fn first_column_strings(&self) -> Vec<String> {
        match self {
            QueryResult::Rows { rows, .. } => rows
                .iter()
                .filter_map(|row| row.first())
                .filter(|v| !v.is_null())
                .map(SqlValue::to_plain_string)
                .collect(),
            QueryResult::NoRows => Vec::new(),
        }
    }
}

/// Tables and views of one database, at the time of the call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseObjects {
    pub tables: Vec<String>,
    pub views: Vec<String>,
}

/// Schema identifiers of one database, at the time of the call
pub type SchemaObjects = Vec<String>;
