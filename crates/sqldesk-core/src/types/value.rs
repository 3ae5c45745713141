//! Cell values returned by query execution
//!
//! `SqlValue` is a tagged union over the column types a relational driver
//! hands back, so results keep their type through the JSON response and the
//! CSV archive alike.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Rendering used for datetime cells in JSON and CSV
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single cell of a result row
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Text value
    Text(String),
    /// Binary value
    Binary(Vec<u8>),
    /// Date and time without zone
    DateTime(NaiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Plain text rendering, as written to CSV fields
    ///
    /// NULL renders as the empty string; floats with no fractional part keep
    /// a trailing `.0` so they stay distinguishable from integers.
    pub fn to_plain_string(&self) -> String {
        match self {
            SqlValue::Null => String::new(),
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Integer(n) => n.to_string(),
            SqlValue::Float(f) => format_float(*f),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Binary(bytes) => hex_literal(bytes),
            SqlValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// `\x` followed by lowercase hex digits
fn hex_literal(bytes: &[u8]) -> String {
    format!("\\x{}", hex::encode(bytes))
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_unit(),
            SqlValue::Bool(b) => serializer.serialize_bool(*b),
            SqlValue::Integer(n) => serializer.serialize_i64(*n),
            SqlValue::Float(f) => serializer.serialize_f64(*f),
            SqlValue::Text(s) => serializer.serialize_str(s),
            SqlValue::Binary(bytes) => serializer.serialize_str(&hex_literal(bytes)),
            SqlValue::DateTime(dt) => {
                serializer.collect_str(&dt.format(DATETIME_FORMAT))
            }
        }
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Integer(n)
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Float(f)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(bytes: Vec<u8>) -> Self {
        SqlValue::Binary(bytes)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(dt: NaiveDateTime) -> Self {
        SqlValue::DateTime(dt)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}
