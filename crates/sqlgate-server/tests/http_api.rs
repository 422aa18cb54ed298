// crates/sqlgate-server/tests/http_api.rs
// ============================================================================
// Module: HTTP API Tests
// Description: Drive the gateway router in-process with tower oneshot.
// Purpose: Validate routes, status codes, envelopes, and audit redaction.
// ============================================================================

//! ## Overview
//! Each test builds a [`GatewayServer`] over a temporary storage root and
//! sends requests through [`tower::ServiceExt::oneshot`]:
//! - identifier issuance and lazy store creation
//! - execute envelopes for reads, writes, and each failure class
//! - body limit, documentation page, and fallback redirect
//! - audit events free of identifiers and SQL text

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::body::to_bytes;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::LOCATION;
use serde_json::Value;
use serde_json::json;
use sqlgate_config::GatewayConfig;
use sqlgate_server::GatewayServer;
use sqlgate_server::MemoryAuditSink;
use tempfile::TempDir;
use tower::ServiceExt;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

struct Harness {
    dir: TempDir,
    router: Router,
    audit: MemoryAuditSink,
}

fn harness_with(configure: impl FnOnce(&mut GatewayConfig)) -> Harness {
    let dir = TempDir::new().unwrap();
    let mut config = GatewayConfig::default();
    config.storage.root = dir.path().to_path_buf();
    configure(&mut config);
    let audit = MemoryAuditSink::default();
    let server = GatewayServer::with_audit(config, Arc::new(audit.clone())).unwrap();
    Harness {
        dir,
        router: server.router(),
        audit,
    }
}

fn harness() -> Harness {
    harness_with(|_| {})
}

impl Harness {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn post_raw(&self, uri: &str, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn execute(&self, id: &str, sql: &str) -> (StatusCode, Value) {
        self.post_raw("/api", json!({"id": id, "sql": sql}).to_string()).await
    }

    async fn issue(&self) -> String {
        let (status, body) = self.post_raw("/new", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().to_string()
    }

    fn files(&self) -> Vec<String> {
        fs::read_dir(self.dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

// ============================================================================
// SECTION: Identifier Issuance
// ============================================================================

#[tokio::test]
async fn new_issues_hex_identifier_without_creating_store() {
    let harness = harness();
    let (status, body) = harness.post_raw("/new", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Store reserved. Use this ID for all requests."));
    let id = body["id"].as_str().unwrap();
    assert_eq!(id.len(), 16);
    assert!(id.bytes().all(|byte| byte.is_ascii_hexdigit()));
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn successive_issues_are_distinct() {
    let harness = harness();
    let first = harness.issue().await;
    let second = harness.issue().await;
    assert_ne!(first, second);
}

// ============================================================================
// SECTION: Execute
// ============================================================================

#[tokio::test]
async fn create_insert_select_flow() {
    let harness = harness();
    let id = harness.issue().await;

    let (status, body) =
        harness.execute(&id, "CREATE TABLE users (name TEXT, weight INTEGER)").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (_, body) = harness.execute(&id, "SELECT * FROM users").await;
    assert_eq!(body, json!({"success": true, "data": []}));

    let (_, body) =
        harness.execute(&id, "INSERT INTO users (name, weight) VALUES ('John', 10)").await;
    assert_eq!(body, json!({"success": true, "data": {"changes": 1, "lastInsertRowid": 1}}));

    let (_, body) = harness.execute(&id, "SELECT * FROM users").await;
    assert_eq!(body, json!({"success": true, "data": [{"name": "John", "weight": 10}]}));

    assert_eq!(harness.files(), vec![format!("{id}.db")]);
}

#[tokio::test]
async fn tenants_cannot_see_each_other() {
    let harness = harness();
    let first = harness.issue().await;
    let second = harness.issue().await;
    harness.execute(&first, "CREATE TABLE notes (body TEXT)").await;
    let (status, body) = harness.execute(&second, "SELECT * FROM notes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no such table"));
}

#[tokio::test]
async fn missing_fields_are_bad_request() {
    let harness = harness();
    let expected = json!({"success": false, "error": "Missing \"id\" or \"sql\" fields."});
    for body in [
        json!({"sql": "SELECT 1"}),
        json!({"id": "abcd"}),
        json!({"id": "", "sql": "SELECT 1"}),
        json!({"id": 42, "sql": "SELECT 1"}),
        json!([]),
    ] {
        let (status, response) = harness.post_raw("/api", body.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, expected);
    }
    let (status, response) = harness.post_raw("/api", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, expected);
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn invalid_identifier_is_forbidden_and_touches_nothing() {
    let harness = harness();
    for id in ["../../etc/passwd", "abc.db", "ab/cd", "zz"] {
        let (status, body) = harness.execute(id, "SELECT 1").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"success": false, "error": "Invalid ID format. Hex only."}));
    }
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn statement_error_forwards_diagnostic_and_recovers() {
    let harness = harness();
    let id = harness.issue().await;
    harness.execute(&id, "CREATE TABLE users (name TEXT)").await;

    let (status, body) = harness.execute(&id, "SELEC * FROM users").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("syntax error"));

    let (status, body) = harness.execute(&id, "SELECT * FROM users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": []}));
}

#[tokio::test]
async fn unavailable_store_hides_detail() {
    let harness = harness();
    fs::create_dir(harness.dir.path().join("cafe.db")).unwrap();
    let (status, body) = harness.execute("cafe", "SELECT 1").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"success": false, "error": "Store unavailable."}));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let harness = harness_with(|config| config.server.max_body_bytes = 64);
    let sql = format!("SELECT '{}'", "x".repeat(128));
    let (status, body) = harness.execute("abcd", &sql).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({"success": false, "error": "Request body too large."}));
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn concurrent_requests_for_distinct_tenants() {
    let harness = Arc::new(harness());
    let mut tasks = Vec::new();
    for index in 0..8_u32 {
        let harness = Arc::clone(&harness);
        tasks.push(tokio::spawn(async move {
            let id = format!("{index:08x}");
            harness.execute(&id, "CREATE TABLE t (v INTEGER)").await;
            harness.execute(&id, &format!("INSERT INTO t VALUES ({index})")).await;
            harness.execute(&id, "SELECT v FROM t").await
        }));
    }
    for (index, task) in tasks.into_iter().enumerate() {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": [{"v": index}]}));
    }
}

// ============================================================================
// SECTION: Documentation and Fallback
// ============================================================================

#[tokio::test]
async fn docs_page_is_served_at_root_and_docs() {
    let harness = harness();
    for uri in ["/", "/docs"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = harness.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }
}

#[tokio::test]
async fn unknown_routes_redirect_to_fallback() {
    let harness = harness_with(|config| config.server.fallback_redirect = "/docs".to_string());
    for (method, uri) in [("GET", "/missing"), ("GET", "/api"), ("DELETE", "/new"), ("POST", "/")]
    {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = harness.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{method} {uri}");
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/docs");
    }
}

#[tokio::test]
async fn docs_page_describes_fallback_redirect() {
    let harness = harness();
    let request = Request::builder().uri("/docs").body(Body::empty()).unwrap();
    let (status, bytes) = harness.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let page = String::from_utf8(bytes).unwrap();
    assert!(page.contains("server.fallback_redirect"));
    assert!(page.contains("303 See Other"));
}

#[tokio::test]
async fn external_fallback_redirect_is_honored() {
    let target = "https://docs.example.com/sqlgate";
    let harness = harness_with(|config| config.server.fallback_redirect = target.to_string());
    let request = Request::builder().uri("/elsewhere").body(Body::empty()).unwrap();
    let response = harness.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).unwrap(), target);
}

// ============================================================================
// SECTION: Audit
// ============================================================================

#[tokio::test]
async fn audit_events_never_contain_identifiers_or_sql() {
    let harness = harness();
    let id = harness.issue().await;
    harness.execute(&id, "CREATE TABLE secret_table (v TEXT)").await;
    harness.execute(&id, "SELEC broken_marker").await;

    let lines = harness.audit.lines();
    assert!(lines.iter().any(|line| line.contains("storage_ready")));
    let requests: Vec<Value> = lines
        .iter()
        .map(|line| serde_json::from_str::<Value>(line).unwrap())
        .filter(|event| event["event"] == json!("gateway_request"))
        .collect();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2]["error_kind"], json!("statement_error"));
    assert_eq!(requests[2]["status"], json!(400));
    for line in &lines {
        assert!(!line.contains(&id));
        assert!(!line.contains("secret_table"));
        assert!(!line.contains("broken_marker"));
    }
}
