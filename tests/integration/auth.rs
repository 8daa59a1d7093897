//! API key authentication integration tests

use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};

use crate::common::{api_key, constants, create_test_server};

#[tokio::test]
async fn test_missing_api_key_returns_401() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let response = server.post("/").json(&json!({"text": "hello world"})).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "API key is missing from headers");
}

#[tokio::test]
async fn test_empty_api_key_returns_401() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let (name, value) = api_key("");
    let response = server
        .post("/")
        .add_header(name, value)
        .json(&json!({"text": "hello world"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_api_key_returns_403() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let (name, value) = api_key("client_key_unknown");
    let response = server
        .post("/")
        .add_header(name, value)
        .json(&json!({"text": "hello world"}))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid API key");
}

#[tokio::test]
async fn test_auth_runs_before_validation() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    // Malformed body but no key: authentication failure wins
    let response = server.post("/").text("not json").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = api_key("client_key_unknown");
    let response = server.post("/").add_header(name, value).text("not json").await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_each_key_resolves_to_its_client() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let response = server
        .post("/")
        .add_header(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static(constants::CLIENT_B_KEY),
        )
        .json(&json!({"text": "hello world"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["client"], constants::CLIENT_B);
}

#[tokio::test]
async fn test_auth_error_responses_are_json() {
    let server = create_test_server(constants::UNREACHABLE_URL);

    let response = server.post("/").json(&json!({"text": "hi"})).await;

    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
}
