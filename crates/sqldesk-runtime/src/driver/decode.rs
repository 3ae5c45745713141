//! Row decoding
//!
//! Cells are decoded by column type family. The declared column type is
//! used when the driver knows it; otherwise (sqlite expressions) the type of
//! the value itself.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqldesk_core::SqlValue;
use sqlx::{Column, ColumnIndex, Decode, Row, Type, TypeInfo, ValueRef};

/// Column type family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Integer,
    Float,
    Decimal,
    DateTime,
    Date,
    Binary,
    Text,
}

impl ColumnKind {
    /// Classify a database type name (`INT4`, `VARCHAR(20)`, `BIGINT UNSIGNED`, ...)
    pub fn classify(type_name: &str) -> Self {
        let upper = type_name.to_ascii_uppercase();
        let base = upper
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        match base {
            "BOOL" | "BOOLEAN" => ColumnKind::Bool,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "INT2"
            | "INT4" | "INT8" | "SERIAL" | "SMALLSERIAL" | "BIGSERIAL" => ColumnKind::Integer,
            "REAL" | "FLOAT" | "FLOAT4" | "FLOAT8" | "DOUBLE" => ColumnKind::Float,
            "NUMERIC" | "DECIMAL" => ColumnKind::Decimal,
            "TIMESTAMP" | "TIMESTAMPTZ" | "DATETIME" => ColumnKind::DateTime,
            "DATE" => ColumnKind::Date,
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BYTEA" | "BINARY"
            | "VARBINARY" => ColumnKind::Binary,
            _ => ColumnKind::Text,
        }
    }
}

/// Backend-specific decoding tried before the generic one
pub(crate) type DecodeHook<R> = fn(&R, usize, ColumnKind, &str) -> Option<SqlValue>;

pub(crate) fn no_hook<R>(_: &R, _: usize, _: ColumnKind, _: &str) -> Option<SqlValue> {
    None
}

/// Decode every cell of `row`
pub(crate) fn decode_row<'r, R>(row: &'r R, hook: DecodeHook<R>) -> Vec<SqlValue>
where
    R: Row,
    usize: ColumnIndex<R>,
    bool: Decode<'r, R::Database> + Type<R::Database>,
    i16: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    f32: Decode<'r, R::Database> + Type<R::Database>,
    f64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: Decode<'r, R::Database> + Type<R::Database>,
    NaiveDate: Decode<'r, R::Database> + Type<R::Database>,
    NaiveDateTime: Decode<'r, R::Database> + Type<R::Database>,
    DateTime<Utc>: Decode<'r, R::Database> + Type<R::Database>,
{
    (0..row.len()).map(|idx| decode_cell(row, idx, hook)).collect()
}

fn decode_cell<'r, R>(row: &'r R, idx: usize, hook: DecodeHook<R>) -> SqlValue
where
    R: Row,
    usize: ColumnIndex<R>,
    bool: Decode<'r, R::Database> + Type<R::Database>,
    i16: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    f32: Decode<'r, R::Database> + Type<R::Database>,
    f64: Decode<'r, R::Database> + Type<R::Database>,
    String: Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: Decode<'r, R::Database> + Type<R::Database>,
    NaiveDate: Decode<'r, R::Database> + Type<R::Database>,
    NaiveDateTime: Decode<'r, R::Database> + Type<R::Database>,
    DateTime<Utc>: Decode<'r, R::Database> + Type<R::Database>,
{
    let raw = match row.try_get_raw(idx) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Failed to read column {}: {}", idx, e);
            return SqlValue::Null;
        }
    };
    if raw.is_null() {
        return SqlValue::Null;
    }

    let declared = row.columns().get(idx).map(|c| c.type_info());
    let type_name = match declared {
        Some(info) if !info.is_null() => info.name().to_string(),
        _ => raw.type_info().name().to_string(),
    };
    let kind = ColumnKind::classify(&type_name);

    if let Some(value) = hook(row, idx, kind, &type_name) {
        return value;
    }

    let value = match kind {
        ColumnKind::Bool => row.try_get::<bool, _>(idx).ok().map(SqlValue::Bool),
        ColumnKind::Integer => decode_integer(row, idx),
        ColumnKind::Float | ColumnKind::Decimal => decode_float(row, idx),
        ColumnKind::DateTime => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .or_else(|| {
                row.try_get::<DateTime<Utc>, _>(idx)
                    .ok()
                    .map(|dt| dt.naive_utc())
            })
            .map(SqlValue::DateTime),
        ColumnKind::Date => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|d| SqlValue::Text(d.format("%Y-%m-%d").to_string())),
        ColumnKind::Binary => row.try_get::<Vec<u8>, _>(idx).ok().map(SqlValue::Binary),
        ColumnKind::Text => None,
    };

    // Fall back through text and numbers: sqlite stores whatever it is given
    value
        .or_else(|| row.try_get::<String, _>(idx).ok().map(SqlValue::Text))
        .or_else(|| decode_integer(row, idx))
        .or_else(|| decode_float(row, idx))
        .or_else(|| row.try_get::<Vec<u8>, _>(idx).ok().map(SqlValue::Binary))
        .unwrap_or_else(|| {
            tracing::warn!(
                "Failed to extract value for column {} (type: {})",
                idx,
                type_name
            );
            SqlValue::Null
        })
}

fn decode_integer<'r, R>(row: &'r R, idx: usize) -> Option<SqlValue>
where
    R: Row,
    usize: ColumnIndex<R>,
    i16: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<i64, _>(idx)
        .ok()
        .or_else(|| row.try_get::<i32, _>(idx).ok().map(i64::from))
        .or_else(|| row.try_get::<i16, _>(idx).ok().map(i64::from))
        .map(SqlValue::Integer)
}

fn decode_float<'r, R>(row: &'r R, idx: usize) -> Option<SqlValue>
where
    R: Row,
    usize: ColumnIndex<R>,
    f32: Decode<'r, R::Database> + Type<R::Database>,
    f64: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<f64, _>(idx)
        .ok()
        .or_else(|| row.try_get::<f32, _>(idx).ok().map(f64::from))
        .map(SqlValue::Float)
}
