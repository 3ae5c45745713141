//! Uniform response envelope
//!
//! Every endpoint answers with
//! `{"responseType": "success" | "error", "responseData": ...}`.
//! The builder functions here are pure mappings from results to envelopes.

use crate::types::{DatabaseObjects, QueryResult, SchemaObjects, SqlValue};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Response returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "responseType", content = "responseData", rename_all = "lowercase")]
pub enum ResponseEnvelope {
    Success(SuccessData),
    Error { message: String },
}

/// Payload of a success envelope, shaped per endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SuccessData {
    Rows(RowsData),
    DatabaseObjects(DatabaseObjects),
    SchemaObjects { schemas: SchemaObjects },
    History(HistoryData),
}

/// Result set payload; `keys` and `rows` are absent when `hasRows` is false
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsData {
    pub has_rows: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<SqlValue>>>,
}

/// History listing payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryData {
    pub has_rows: bool,
    pub queries: Vec<HistoryEntry>,
}

/// One history row as a column -> value mapping, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry(pub Vec<(String, SqlValue)>);

impl Serialize for HistoryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// `{"responseType":"error","responseData":{"message":...}}`
pub fn error(message: impl Into<String>) -> ResponseEnvelope {
    ResponseEnvelope::Error {
        message: message.into(),
    }
}

pub fn success_with_rows(keys: Vec<String>, rows: Vec<Vec<SqlValue>>) -> ResponseEnvelope {
    ResponseEnvelope::Success(SuccessData::Rows(RowsData {
        has_rows: true,
        keys: Some(keys),
        rows: Some(rows),
    }))
}

pub fn success_no_rows() -> ResponseEnvelope {
    ResponseEnvelope::Success(SuccessData::Rows(RowsData {
        has_rows: false,
        keys: None,
        rows: None,
    }))
}

/// Rows or no-rows envelope, depending on the result kind
pub fn success_with_result(result: QueryResult) -> ResponseEnvelope {
    match result {
        QueryResult::Rows { columns, rows } => success_with_rows(columns, rows),
        QueryResult::NoRows => success_no_rows(),
    }
}

pub fn success_with_database_objects(objects: DatabaseObjects) -> ResponseEnvelope {
    ResponseEnvelope::Success(SuccessData::DatabaseObjects(objects))
}

pub fn success_with_schema_objects(schemas: SchemaObjects) -> ResponseEnvelope {
    ResponseEnvelope::Success(SuccessData::SchemaObjects { schemas })
}

/// History listing; each row becomes a mapping keyed by column name
pub fn history_success(keys: &[String], rows: Vec<Vec<SqlValue>>) -> ResponseEnvelope {
    let queries: Vec<HistoryEntry> = rows
        .into_iter()
        .map(|row| HistoryEntry(keys.iter().cloned().zip(row).collect()))
        .collect();

    ResponseEnvelope::Success(SuccessData::History(HistoryData {
        has_rows: !queries.is_empty(),
        queries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_envelope() {
        let envelope = error("no such table: nonexistent");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "responseType": "error",
                "responseData": {"message": "no such table: nonexistent"}
            })
        );
    }

    #[test]
    fn test_success_with_rows() {
        let envelope = success_with_rows(vec!["1".to_string()], vec![vec![SqlValue::Integer(1)]]);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "responseType": "success",
                "responseData": {"hasRows": true, "keys": ["1"], "rows": [[1]]}
            })
        );
    }

    #[test]
    fn test_success_no_rows() {
        assert_eq!(
            serde_json::to_value(success_no_rows()).unwrap(),
            json!({"responseType": "success", "responseData": {"hasRows": false}})
        );
    }

    #[test]
    fn test_success_with_result_dispatches_on_kind() {
        assert_eq!(success_with_result(QueryResult::NoRows), success_no_rows());
        let rows = QueryResult::rows(vec!["a".to_string()], vec![]);
        assert_eq!(
            serde_json::to_value(success_with_result(rows)).unwrap(),
            json!({
                "responseType": "success",
                "responseData": {"hasRows": true, "keys": ["a"], "rows": []}
            })
        );
    }

    #[test]
    fn test_database_objects() {
        let envelope = success_with_database_objects(DatabaseObjects {
            tables: vec!["users".to_string()],
            views: vec!["active_users".to_string()],
        });
        assert_eq!(
            serde_json::to_value(envelope).unwrap(),
            json!({
                "responseType": "success",
                "responseData": {"tables": ["users"], "views": ["active_users"]}
            })
        );
    }

    #[test]
    fn test_schema_objects() {
        let envelope = success_with_schema_objects(vec!["main".to_string(), "temp".to_string()]);
        assert_eq!(
            serde_json::to_value(envelope).unwrap(),
            json!({
                "responseType": "success",
                "responseData": {"schemas": ["main", "temp"]}
            })
        );
    }

    #[test]
    fn test_history_success_maps_rows_to_records() {
        let keys = vec!["id".to_string(), "query".to_string(), "ts".to_string()];
        let rows = vec![
            vec![SqlValue::Integer(2), SqlValue::from("SELECT 2"), SqlValue::Integer(20)],
            vec![SqlValue::Integer(1), SqlValue::from("SELECT 1"), SqlValue::Integer(10)],
        ];
        let envelope = history_success(&keys, rows);

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains(r#"{"id":2,"query":"SELECT 2","ts":20}"#));

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "responseType": "success",
                "responseData": {
                    "hasRows": true,
                    "queries": [
                        {"id": 2, "query": "SELECT 2", "ts": 20},
                        {"id": 1, "query": "SELECT 1", "ts": 10}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_history_success_empty() {
        let envelope = history_success(&["id".to_string()], vec![]);
        assert_eq!(
            serde_json::to_value(envelope).unwrap(),
            json!({"responseType": "success", "responseData": {"hasRows": false, "queries": []}})
        );
    }
}
