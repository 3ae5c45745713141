//! SQLx-backed driver for SQLite, PostgreSQL and MySQL
//!
//! One connection is opened per call and closed when the statement is done.

use super::decode::{decode_row, no_hook, ColumnKind};
use super::SqlDriver;
use crate::dialect::Dialect;
use crate::error::DriverError;
use async_trait::async_trait;
use sqldesk_core::types::value::DATETIME_FORMAT;
use sqldesk_core::{ConnectionAddress, QueryResult, SqlValue};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Column, Connection, Database, Encode, Executor, Row, Statement, Type};
use std::borrow::Cow;
use std::str::FromStr;

/// SQL driver built on sqlx native connections
#[derive(Debug, Default, Clone)]
pub struct SqlxDriver;

impl SqlxDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SqlDriver for SqlxDriver {
    async fn fetch(
        &self,
        address: &ConnectionAddress,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, DriverError> {
        let dialect = Dialect::from_address(address).map_err(|e| DriverError(e.to_string()))?;
        tracing::debug!("Executing {:?} statement on {}: {}", dialect, address, sql);

        match dialect {
            Dialect::Sqlite => fetch_sqlite(address, sql, params).await,
            Dialect::Postgres => fetch_postgres(address, sql, params).await,
            Dialect::MySql => fetch_mysql(address, sql, params).await,
        }
    }
}

/// Translate a SQLite address into connect options
///
/// `sqlite:///rel.db` is relative to the working directory,
/// `sqlite:////abs.db` is absolute and `sqlite://` is an in-memory database.
/// Database files are created when missing.
pub(crate) fn sqlite_options(url: &str) -> Result<SqliteConnectOptions, DriverError> {
    let options = match url.strip_prefix("sqlite:///") {
        Some(path) => {
            let path = path.split('?').next().unwrap_or_default();
            SqliteConnectOptions::new().filename(path)
        }
        None if url == "sqlite://" || url == "sqlite:" => {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        }
        None => SqliteConnectOptions::from_str(url)?,
    };
    Ok(options.create_if_missing(true))
}

/// Drop a `+driver` suffix from the scheme and map aliases sqlx does not know
pub(crate) fn server_url(url: &str) -> Cow<'_, str> {
    let Some((scheme, rest)) = url.split_once("://") else {
        return Cow::Borrowed(url);
    };
    let base = scheme.split('+').next().unwrap_or_default();
    let base = if base.eq_ignore_ascii_case("mariadb") {
        "mysql"
    } else {
        base
    };
    if base == scheme {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("{}://{}", base, rest))
    }
}

fn bind_params<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    bool: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    &'q str: Encode<'q, DB> + Type<DB>,
    &'q [u8]: Encode<'q, DB> + Type<DB>,
    Option<&'q str>: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<&str>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Integer(n) => query.bind(*n),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Binary(bytes) => query.bind(bytes.as_slice()),
            SqlValue::DateTime(dt) => query.bind(dt.format(DATETIME_FORMAT).to_string()),
        };
    }
    query
}

fn column_names<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

fn into_result(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> QueryResult {
    if columns.is_empty() {
        QueryResult::NoRows
    } else {
        QueryResult::rows(columns, rows)
    }
}

async fn fetch_sqlite(
    address: &ConnectionAddress,
    sql: &str,
    params: &[SqlValue],
) -> Result<QueryResult, DriverError> {
    let options = sqlite_options(address.as_str())?;
    let mut conn = SqliteConnection::connect_with(&options).await?;

    let outcome = async {
        let statement = conn.prepare(sql).await?;
        let columns = column_names(statement.columns());
        let rows = bind_params(statement.query(), params)
            .fetch_all(&mut conn)
            .await?;
        let rows = rows.iter().map(|row| decode_row(row, no_hook)).collect();
        Ok::<_, DriverError>(into_result(columns, rows))
    }
    .await;

    if let Err(e) = conn.close().await {
        tracing::debug!("Failed to close SQLite connection: {}", e);
    }
    outcome
}

async fn fetch_postgres(
    address: &ConnectionAddress,
    sql: &str,
    params: &[SqlValue],
) -> Result<QueryResult, DriverError> {
    let mut conn = PgConnection::connect(&server_url(address.as_str())).await?;

    let outcome = async {
        let statement = conn.prepare(sql).await?;
        let columns = column_names(statement.columns());
        let rows = bind_params(statement.query(), params)
            .fetch_all(&mut conn)
            .await?;
        let rows = rows.iter().map(|row| decode_row(row, postgres_hook)).collect();
        Ok::<_, DriverError>(into_result(columns, rows))
    }
    .await;

    if let Err(e) = conn.close().await {
        tracing::debug!("Failed to close PostgreSQL connection: {}", e);
    }
    outcome
}

async fn fetch_mysql(
    address: &ConnectionAddress,
    sql: &str,
    params: &[SqlValue],
) -> Result<QueryResult, DriverError> {
    let mut conn = MySqlConnection::connect(&server_url(address.as_str())).await?;

    let outcome = async {
        let statement = conn.prepare(sql).await?;
        let columns = column_names(statement.columns());
        let rows = bind_params(statement.query(), params)
            .fetch_all(&mut conn)
            .await?;
        let rows = rows.iter().map(|row| decode_row(row, mysql_hook)).collect();
        Ok::<_, DriverError>(into_result(columns, rows))
    }
    .await;

    if let Err(e) = conn.close().await {
        tracing::debug!("Failed to close MySQL connection: {}", e);
    }
    outcome
}

fn decimal_to_value(decimal: bigdecimal::BigDecimal) -> SqlValue {
    let text = decimal.to_string();
    match text.parse::<f64>() {
        Ok(f) => SqlValue::Float(f),
        Err(_) => SqlValue::Text(text),
    }
}

fn postgres_hook(row: &PgRow, idx: usize, kind: ColumnKind, type_name: &str) -> Option<SqlValue> {
    match (kind, type_name) {
        (ColumnKind::Decimal, _) => row
            .try_get::<bigdecimal::BigDecimal, _>(idx)
            .ok()
            .map(decimal_to_value),
        (_, "UUID") => row
            .try_get::<uuid::Uuid, _>(idx)
            .ok()
            .map(|u| SqlValue::Text(u.to_string())),
        (_, "JSON") | (_, "JSONB") => row
            .try_get::<serde_json::Value, _>(idx)
            .ok()
            .map(|v| SqlValue::Text(v.to_string())),
        _ => None,
    }
}

fn mysql_hook(row: &MySqlRow, idx: usize, kind: ColumnKind, type_name: &str) -> Option<SqlValue> {
    match kind {
        ColumnKind::Decimal => row
            .try_get::<bigdecimal::BigDecimal, _>(idx)
            .ok()
            .map(decimal_to_value),
        ColumnKind::Integer if type_name.contains("UNSIGNED") => {
            row.try_get::<u64, _>(idx).ok().map(|n| match i64::try_from(n) {
                Ok(n) => SqlValue::Integer(n),
                Err(_) => SqlValue::Text(n.to_string()),
            })
        }
        _ => None,
    }
}
