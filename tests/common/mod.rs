//! Common test utilities for Tokenmeter
//!
//! Shared fixtures and helpers used across integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use tokenmeter::{
    config::LogFormat, routes::create_router, AppState, Config, HostedTokenCounter,
    StaticKeyRegistry, VertexClient,
};

/// Test configuration constants
pub mod constants {
    /// Key registered for Client_A
    pub const CLIENT_A_KEY: &str = "client_key_abc123";
    /// Key registered for Client_B
    pub const CLIENT_B_KEY: &str = "client_key_def456";
    pub const CLIENT_A: &str = "Client_A";
    pub const CLIENT_B: &str = "Client_B";
    /// Static bearer token sent to the mocked Vertex AI API
    pub const TEST_VERTEX_TOKEN: &str = "test-vertex-token";
    pub const TEST_PROJECT: &str = "test-project";
    pub const TEST_LOCATION: &str = "us-central1";
    /// Address nothing listens on
    pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";
}

/// Build a config pointing the hosted counter at `vertex_url`
pub fn test_config(vertex_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        api_keys: HashMap::from([
            (constants::CLIENT_A_KEY.to_string(), constants::CLIENT_A.to_string()),
            (constants::CLIENT_B_KEY.to_string(), constants::CLIENT_B.to_string()),
        ]),
        vertex_project_id: constants::TEST_PROJECT.to_string(),
        vertex_location: constants::TEST_LOCATION.to_string(),
        vertex_api_url: Some(vertex_url.to_string()),
        vertex_access_token: Some(constants::TEST_VERTEX_TOKEN.to_string()),
        log_format: LogFormat::Text,
    }
}

/// Start a test server whose hosted counter targets `vertex_url`
pub fn create_test_server(vertex_url: &str) -> TestServer {
    tokenmeter::routes::metrics::init_metrics().expect("Failed to initialize metrics");

    let config = test_config(vertex_url);
    let registry = Arc::new(StaticKeyRegistry::new(config.api_keys.clone()));
    let hosted: Arc<dyn HostedTokenCounter> =
        Arc::new(VertexClient::new(reqwest::Client::new(), &config));

    let state = Arc::new(AppState::new_for_testing(config, registry, hosted));
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

/// `X-API-Key` header pair for a key
pub fn api_key(key: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(key),
    )
}
