//! Vertex AI token counting client
//!
//! HTTP client for the Vertex AI `countTokens` endpoint. Counts are computed by
//! the hosted model's own tokenizer and cannot be reproduced locally.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// GCE / Cloud Run metadata server token endpoint
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Hosted generative-model counting service
#[async_trait]
pub trait HostedTokenCounter: Send + Sync {
    /// Name used in logs and health output
    fn name(&self) -> &'static str;

    /// Project and region (or equivalent) the backend counts against
    fn target(&self) -> String;

    /// Total token count of `text` under `model`'s tokenizer
    async fn count_tokens(&self, model: &str, text: &str) -> AppResult<usize>;
}

/// `countTokens` request body
#[derive(Debug, Serialize)]
struct CountTokensRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// `countTokens` response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountTokensResponse {
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Vertex AI client
pub struct VertexClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    location: String,
    access_token: Option<String>,
}

impl VertexClient {
    /// Create a new Vertex AI client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.vertex_base_url(),
            project_id: config.vertex_project_id.clone(),
            location: config.vertex_location.clone(),
            access_token: config.vertex_access_token.clone(),
        }
    }

    /// Full `countTokens` URL for a publisher model
    pub fn count_tokens_url(&self, model: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:countTokens",
            self.base_url, self.project_id, self.location, model
        )
    }

    /// Bearer token from configuration, or from the metadata server
    async fn bearer_token(&self) -> AppResult<String> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }

        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                AppError::CountingService(format!(
                    "Unable to obtain access token from metadata server: {}",
                    e
                ))
            })?;

        if !response.status().is_success() {
            return Err(AppError::CountingService(format!(
                "Metadata server returned {} for access token request",
                response.status()
            )));
        }

        let token: MetadataToken = response.json().await?;
        Ok(token.access_token)
    }

    fn headers(&self, token: &str) -> AppResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            AppError::CountingService("Access token is not a valid header value".to_string())
        })?;
        headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }
}

#[async_trait]
impl HostedTokenCounter for VertexClient {
    fn name(&self) -> &'static str {
        "vertex_ai"
    }

    fn target(&self) -> String {
        format!("{}/{}", self.project_id, self.location)
    }

    #[instrument(skip(self, text), fields(model = %model, text_len = text.len()))]
    async fn count_tokens(&self, model: &str, text: &str) -> AppResult<usize> {
        let url = self.count_tokens_url(model);
        let token = self.bearer_token().await?;

        let body = CountTokensRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text }],
            }],
        };

        debug!(url = %url, "Requesting token count from Vertex AI");

        let response = self
            .client
            .post(&url)
            .headers(self.headers(&token)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Failed to reach Vertex AI");
                AppError::from(e)
            })?;

        let status = response.status();
        debug!(status = %status, "Vertex AI countTokens response status");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Vertex AI countTokens request failed");
            return Err(AppError::CountingService(format!(
                "Vertex AI error {}: {}",
                status, text
            )));
        }

        let body = response.text().await?;
        let result: CountTokensResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, body = %body, "Failed to parse Vertex AI countTokens response");
            AppError::CountingService(format!("Failed to parse Vertex AI response: {}", e))
        })?;

        let total = result.total_tokens.ok_or_else(|| {
            AppError::CountingService("Vertex AI response is missing totalTokens".to_string())
        })?;

        Ok(total as usize)
    }
}
