//! Health, metrics and docs endpoint integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{api_key, constants, create_test_server};

#[tokio::test]
async fn test_health_endpoint_returns_proper_structure() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some(), "Response should have 'version' field");
    assert!(json.get("uptime_seconds").is_some(), "Response should have 'uptime_seconds' field");
    assert!(json.get("timestamp").is_some(), "Response should have 'timestamp' field");
    assert_eq!(json["registered_clients"], 2);
    assert_eq!(json["checks"]["default_encoding"]["status"], "healthy");
    assert_eq!(json["hosted_backend"]["name"], "vertex_ai");
    assert_eq!(json["hosted_backend"]["target"], "test-project/us-central1");
}

#[tokio::test]
async fn test_health_endpoints_need_no_api_key() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    server.get("/health/live").await.assert_status_ok();
    server.get("/health/ready").await.assert_status_ok();

    let json: Value = server.get("/health/live").await.json();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let (name, value) = api_key(constants::CLIENT_A_KEY);
    server
        .post("/")
        .add_header(name, value)
        .json(&json!({"text": "hello world"}))
        .await
        .assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("tokenmeter_requests_total"), "{}", text);
    assert!(text.contains("tokenmeter_tokens_counted_total"), "{}", text);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let response = server.get("/docs/openapi.json").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["info"]["title"], "Tokenmeter API");
}

#[tokio::test]
async fn test_unknown_path_returns_json_404() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let response = server.get("/does/not/exist").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["content-type"], "application/json");
    let json: Value = response.json();
    assert_eq!(json["error"], "Not found");
}
