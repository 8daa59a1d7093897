//! Token count endpoint
//!
//! Authenticated by `auth_middleware`; validates the body, routes the count to
//! a tokenizer backend and reports the result.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    logging::RequestContext,
    middleware::auth::AuthenticatedClient,
    routes::metrics::{record_request, record_tokens},
    tokens::DEFAULT_MODEL_LABEL,
    AppState,
};

const MISSING_TEXT: &str = "Missing 'text' in request body";

/// Token count request
#[derive(Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct CountRequest {
    /// Text to count; must be non-empty
    pub text: String,
    /// Model whose tokenizer should be used; omitted selects the default encoding
    #[schema(example = "gpt-4")]
    pub model: Option<String>,
}

impl CountRequest {
    /// Validate a raw request body
    ///
    /// The Content-Type header is not consulted. An empty `model` string is
    /// treated the same as an absent one.
    pub fn parse(body: &[u8]) -> AppResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| AppError::MalformedRequest(MISSING_TEXT.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| AppError::MalformedRequest(MISSING_TEXT.to_string()))?;

        let text = match object.get("text") {
            None | Some(Value::Null) => {
                return Err(AppError::MalformedRequest(MISSING_TEXT.to_string()))
            }
            Some(Value::String(text)) if !text.is_empty() => text.clone(),
            Some(_) => {
                return Err(AppError::MalformedRequest(
                    "'text' must be a non-empty string".to_string(),
                ))
            }
        };

        let model = match object.get("model") {
            None | Some(Value::Null) => None,
            Some(Value::String(model)) if model.is_empty() => None,
            Some(Value::String(model)) => Some(model.clone()),
            Some(_) => {
                return Err(AppError::MalformedRequest(
                    "'model' must be a string".to_string(),
                ))
            }
        };

        Ok(Self { text, model })
    }
}

/// Token count response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CountResponse {
    /// Number of tokens in the submitted text
    pub token_count: usize,
    /// Requested model, or `default (tiktoken)` when none was given
    pub model_used: String,
    /// Client identifier the API key resolved to
    pub client: String,
}

/// Count tokens in the submitted text
///
/// Accepts any HTTP method. Steps after authentication:
/// 1. Validate the body
/// 2. Count tokens with the backend selected by `model`
/// 3. Log the outcome and respond
#[utoipa::path(
    post,
    path = "/",
    tag = "Tokens",
    request_body = CountRequest,
    responses(
        (status = 200, description = "Token count computed", body = CountResponse),
        (status = 400, description = "Missing or malformed 'text', or unreadable body", body = ErrorResponse),
        (status = 401, description = "API key is missing", body = ErrorResponse),
        (status = 403, description = "API key is not registered", body = ErrorResponse),
        (status = 500, description = "Unsupported model or counting failure", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn count_tokens(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthenticatedClient>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let ctx = RequestContext::new(&caller.client);

    let request = match body
        .map_err(read_error)
        .and_then(|body| CountRequest::parse(&body))
    {
        Ok(request) => request,
        Err(e) => {
            record_request("error", e.kind(), start_time.elapsed().as_secs_f64());
            return ctx.error_response(e);
        }
    };
    let ctx = ctx.with_model(request.model.as_deref());

    let count = match state
        .token_counter
        .count(&request.text, request.model.as_deref())
        .await
    {
        Ok(count) => count,
        Err(e) => {
            record_request("error", e.kind(), start_time.elapsed().as_secs_f64());
            return ctx.error_response(e);
        }
    };

    let model_used = request
        .model
        .unwrap_or_else(|| DEFAULT_MODEL_LABEL.to_string());

    ctx.log_count_complete(
        &model_used,
        count.route,
        request.text.chars().count(),
        count.tokens,
    );
    record_request("success", count.route, start_time.elapsed().as_secs_f64());
    record_tokens(count.route, count.tokens as u64);

    let response = CountResponse {
        token_count: count.tokens,
        model_used,
        client: caller.client,
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Body that could not be read, including one over the size limit
fn read_error(rejection: BytesRejection) -> AppError {
    AppError::MalformedRequest(format!(
        "Failed to read request body: {}",
        rejection.body_text()
    ))
}
