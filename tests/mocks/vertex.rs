//! Mock Vertex AI server for testing
//!
//! Provides wiremock-based mocks for
//! `POST /v1/projects/{project}/locations/{location}/publishers/google/models/{model}:countTokens`.

#![allow(dead_code)]

use serde_json::json;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common::constants;

/// Mock Vertex AI server wrapper
pub struct MockVertexServer {
    server: MockServer,
}

impl MockVertexServer {
    /// Start a new mock Vertex AI server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Get all received requests (for assertion in tests)
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Path of the countTokens endpoint for `model`
    pub fn count_path(model: &str) -> String {
        format!(
            "/v1/projects/{}/locations/{}/publishers/google/models/{}:countTokens",
            constants::TEST_PROJECT,
            constants::TEST_LOCATION,
            model
        )
    }

    /// Mock a successful count for `model`
    pub async fn mock_count_tokens_success(&self, model: &str, total_tokens: u64) {
        Mock::given(method("POST"))
            .and(path(Self::count_path(model)))
            .and(header(
                "Authorization",
                format!("Bearer {}", constants::TEST_VERTEX_TOKEN).as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalTokens": total_tokens,
                "totalBillableCharacters": total_tokens * 4
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock an error response for `model`
    pub async fn mock_count_tokens_error(&self, model: &str, status: u16, message: &str) {
        Mock::given(method("POST"))
            .and(path(Self::count_path(model)))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {
                    "code": status,
                    "message": message,
                    "status": "PERMISSION_DENIED"
                }
            })))
            .mount(&self.server)
            .await;
    }
}
