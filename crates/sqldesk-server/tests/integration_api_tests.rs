//! Integration tests for REST API endpoints
//!
//! Each test builds the full service state against SQLite databases and an
//! archive root inside a temporary directory.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqldesk_core::{ConnectionAddress, ConnectionRegistry};
use sqldesk_runtime::QueryExecutor;
use sqldesk_server::api::create_router;
use sqldesk_server::config::ServerConfig;
use sqldesk_server::state::init_state;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    dir: TempDir,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::in_dir(TempDir::new().unwrap(), |_, _| {}).await
    }

    /// Build the service in `dir`, letting the test adjust the configuration
    async fn in_dir(dir: TempDir, customize: impl FnOnce(&Path, &mut ServerConfig)) -> Self {
        let mut config = ServerConfig {
            metadata_url: format!("sqlite:///{}", dir.path().join("metadata.db").display()),
            archive_dir: dir.path().join("queries"),
            ..ServerConfig::default()
        };
        customize(dir.path(), &mut config);
        let state = init_state(&config).await.unwrap();

        Self {
            dir,
            router: create_router(state),
        }
    }

    /// Same directory, fresh process state
    async fn restart(self) -> Self {
        Self::in_dir(self.dir, |_, _| {}).await
    }

    fn metadata_address(&self) -> ConnectionAddress {
        ConnectionAddress::new(format!(
            "sqlite:///{}",
            self.dir.path().join("metadata.db").display()
        ))
    }

    fn target(&self) -> String {
        format!("sqlite:///{}", self.dir.path().join("t.db").display())
    }

    fn archive_root(&self) -> PathBuf {
        self.dir.path().join("queries")
    }

    async fn post(&self, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post(uri, serde_json::to_vec(&body).unwrap()).await
    }

    async fn query(&self, sql: &str) -> Value {
        let (status, body) = self
            .post_json("/v1/query", json!({"query": sql, "connectionUrl": self.target()}))
            .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn history(&self, connection_url: &str) -> Value {
        let response = self
            .get(&format!("/v1/history?connectionUrl={}", connection_url))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }
}

fn archived(root: &Path, archive: &str, ext: &str) -> String {
    std::fs::read_to_string(root.join(archive).join(format!("{}.{}", archive, ext))).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_select_one_records_and_archives() {
    let app = TestApp::new().await;

    let body = app.query("SELECT 1").await;
    assert_eq!(
        body,
        json!({
            "responseType": "success",
            "responseData": {"hasRows": true, "keys": ["1"], "rows": [[1]]}
        })
    );

    let history = app.history(&app.target()).await;
    let queries = history["responseData"]["queries"].as_array().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["query"], "SELECT 1");
    assert_eq!(queries[0]["connectionUrl"], app.target());

    let ts = queries[0]["ts"].as_i64().unwrap();
    let archive = queries[0]["archive"].as_str().unwrap();
    assert!(archive.starts_with(&format!("query_{}", ts)));

    assert_eq!(archived(&app.archive_root(), archive, "in"), "SELECT 1");
    assert_eq!(archived(&app.archive_root(), archive, "out"), "1\n1\n");
}

#[tokio::test]
async fn test_failed_query_archives_error_text() {
    let app = TestApp::new().await;

    let body = app.query("DROP TABLE nonexistent").await;
    assert_eq!(body["responseType"], "error");
    let message = body["responseData"]["message"].as_str().unwrap();
    assert_eq!(message, "no such table: nonexistent");

    let history = app.history(&app.target()).await;
    let archive = history["responseData"]["queries"][0]["archive"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(archived(&app.archive_root(), &archive, "out"), message);
}

#[tokio::test]
async fn test_no_rows_statement() {
    let app = TestApp::new().await;

    let body = app.query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").await;
    assert_eq!(
        body,
        json!({"responseType": "success", "responseData": {"hasRows": false}})
    );

    let history = app.history(&app.target()).await;
    let archive = history["responseData"]["queries"][0]["archive"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(archived(&app.archive_root(), &archive, "out"), "");
}

#[tokio::test]
async fn test_missing_query_field_has_no_side_effects() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/v1/query", json!({"connectionUrl": app.target()}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responseType"], "error");
    assert!(body["responseData"]["message"]
        .as_str()
        .unwrap()
        .contains("query"));

    let history = app.history(&app.target()).await;
    assert_eq!(
        history,
        json!({"responseType": "success", "responseData": {"hasRows": false, "queries": []}})
    );
    assert!(!app.archive_root().exists());
}

#[tokio::test]
async fn test_malformed_json_body() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/v1/query", "invalid json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responseType"], "error");
    assert!(body["responseData"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Malformed JSON body"));
}

#[tokio::test]
async fn test_history_requires_a_parameter() {
    let app = TestApp::new().await;

    let response = app.get("/v1/history").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json,
        json!({"error": "Connection URL or File Name is needed.", "status": 400})
    );
}

#[tokio::test]
async fn test_history_lists_queries_newest_first() {
    let app = TestApp::new().await;
    let statements = ["SELECT 1", "SELECT 2", "SELECT 3", "SELECT 4"];
    for sql in statements {
        app.query(sql).await;
    }

    let other = format!("sqlite:///{}", app.dir.path().join("other.db").display());
    app.post_json("/v1/query", json!({"query": "SELECT 5", "connectionUrl": other}))
        .await;

    let history = app.history(&app.target()).await;
    assert_eq!(history["responseData"]["hasRows"], true);

    let queries = history["responseData"]["queries"].as_array().unwrap();
    let texts: Vec<&str> = queries.iter().map(|q| q["query"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["SELECT 4", "SELECT 3", "SELECT 2", "SELECT 1"]);

    let ts: Vec<i64> = queries.iter().map(|q| q["ts"].as_i64().unwrap()).collect();
    assert!(ts.windows(2).all(|w| w[0] >= w[1]));

    // Identical queries never share an archive
    let mut archives: Vec<&str> = queries.iter().map(|q| q["archive"].as_str().unwrap()).collect();
    archives.sort();
    archives.dedup();
    assert_eq!(archives.len(), statements.len());
}

#[tokio::test]
async fn test_repeated_query_gets_distinct_artifacts() {
    let app = TestApp::new().await;
    app.query("SELECT 1").await;
    app.query("SELECT 1").await;

    let history = app.history(&app.target()).await;
    let queries = history["responseData"]["queries"].as_array().unwrap();
    assert_eq!(queries.len(), 2);
    assert_ne!(queries[0]["id"], queries[1]["id"]);
    assert_ne!(queries[0]["archive"], queries[1]["archive"]);

    for query in queries {
        let archive = query["archive"].as_str().unwrap();
        assert_eq!(archived(&app.archive_root(), archive, "in"), "SELECT 1");
    }
}

#[tokio::test]
async fn test_history_file_download() {
    let app = TestApp::new().await;
    app.query("SELECT 1 AS a, 'x' AS b").await;

    let history = app.history(&app.target()).await;
    let archive = history["responseData"]["queries"][0]["archive"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .get(&format!("/v1/history?fileName={}/{}.out", archive, archive))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{}.out\"", archive).as_str()
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"a,b\n1,x\n");
}

#[tokio::test]
async fn test_history_prefers_connection_url() {
    let app = TestApp::new().await;
    app.query("SELECT 1").await;

    let response = app
        .get(&format!(
            "/v1/history?connectionUrl={}&fileName=query_0/query_0.out",
            app.target()
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["responseData"]["queries"][0]["query"], "SELECT 1");
}

#[tokio::test]
async fn test_history_download_errors() {
    let app = TestApp::new().await;

    let response = app.get("/v1/history?fileName=query_1/query_1.out").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/v1/history?fileName=../metadata.db").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_database_structure() {
    let app = TestApp::new().await;
    app.query("CREATE TABLE users (id INTEGER PRIMARY KEY, active INTEGER)").await;
    app.query("CREATE VIEW active_users AS SELECT * FROM users WHERE active = 1").await;

    let (status, body) = app
        .post_json("/v1/database", json!({"connectionUrl": app.target()}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "responseType": "success",
            "responseData": {"tables": ["users"], "views": ["active_users"]}
        })
    );
}

#[tokio::test]
async fn test_schema_structure() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/v1/schema", json!({"connectionUrl": app.target()}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responseType"], "success");
    assert_eq!(body["responseData"]["schemas"][0], "main");
}

#[tokio::test]
async fn test_table_structure() {
    let app = TestApp::new().await;
    app.query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)").await;

    let (_, body) = app
        .post_json(
            "/v1/table",
            json!({"connectionUrl": app.target(), "table": "users"}),
        )
        .await;
    assert_eq!(body["responseType"], "success");
    assert_eq!(body["responseData"]["hasRows"], true);
    assert_eq!(
        body["responseData"]["keys"],
        json!(["column_name", "data_type", "is_nullable", "column_default"])
    );
    assert_eq!(body["responseData"]["rows"][1][0], "name");

    let (_, body) = app
        .post_json(
            "/v1/table",
            json!({"connectionUrl": app.target(), "table": "ghost"}),
        )
        .await;
    assert_eq!(
        body,
        json!({"responseType": "error", "responseData": {"message": "no such table: ghost"}})
    );
}

#[tokio::test]
async fn test_table_structure_requires_table() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/v1/table", json!({"connectionUrl": app.target()}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["responseType"], "error");
}

#[tokio::test]
async fn test_unsupported_connection_url() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json("/v1/database", json!({"connectionUrl": "oracle://scott@db/orcl"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["responseData"]["message"],
        "unsupported connection url scheme: oracle"
    );
}

#[tokio::test]
async fn test_archive_failure_does_not_mask_response() {
    let app = TestApp::in_dir(TempDir::new().unwrap(), |dir, config| {
        let blocker = dir.join("queries-file");
        std::fs::write(&blocker, "not a directory").unwrap();
        config.archive_dir = blocker;
    })
    .await;

    let body = app.query("SELECT 1").await;
    assert_eq!(
        body,
        json!({
            "responseType": "success",
            "responseData": {"hasRows": true, "keys": ["1"], "rows": [[1]]}
        })
    );

    let history = app.history(&app.target()).await;
    assert_eq!(history["responseData"]["queries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_write_failure_skips_query() {
    let app = TestApp::new().await;
    QueryExecutor::new(ConnectionRegistry::new(app.metadata_address()))
        .execute_metadata_query("DROP TABLE metadata", &[])
        .await
        .unwrap();

    let body = app.query("CREATE TABLE side_effect (id INTEGER)").await;
    assert_eq!(
        body,
        json!({
            "responseType": "error",
            "responseData": {
                "message": "failed to record query history: no such table: metadata"
            }
        })
    );

    assert!(!app.dir.path().join("t.db").exists());
    assert!(!app.archive_root().exists());
}

#[tokio::test]
async fn test_restart_keeps_archives_distinct() {
    let app = TestApp::new().await;
    app.query("SELECT 'before'").await;

    let app = app.restart().await;
    app.query("SELECT 'after'").await;

    let history = app.history(&app.target()).await;
    let queries = history["responseData"]["queries"].as_array().unwrap();
    assert_eq!(queries.len(), 2);

    let root = app.archive_root();
    let newest = queries[0]["archive"].as_str().unwrap();
    let oldest = queries[1]["archive"].as_str().unwrap();
    assert_ne!(newest, oldest);
    assert_eq!(archived(&root, newest, "in"), "SELECT 'after'");
    assert_eq!(archived(&root, oldest, "in"), "SELECT 'before'");
}
