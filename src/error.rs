//! Error types for Tokenmeter
//!
//! Every stage of request handling returns `AppResult`. Errors are converted to
//! an HTTP response only at the axum boundary, where they are also logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::routes::metrics::record_error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("API key is missing from headers")]
    MissingKey,

    #[error("Invalid API key")]
    InvalidKey,

    #[error("{0}")]
    MalformedRequest(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Token counting service error: {0}")]
    CountingService(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error class
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingKey => StatusCode::UNAUTHORIZED,
            AppError::InvalidKey => StatusCode::FORBIDDEN,
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedModel(_)
            | AppError::CountingService(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable identifier used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MissingKey => "missing_key",
            AppError::InvalidKey => "invalid_key",
            AppError::MalformedRequest(_) => "malformed_request",
            AppError::UnsupportedModel(_) => "unsupported_model",
            AppError::CountingService(_) => "counting_service",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::CountingService(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description of the failure
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(kind = self.kind(), status = status.as_u16(), error_message = %message, "Request failed");
        } else {
            warn!(kind = self.kind(), status = status.as_u16(), error_message = %message, "Request rejected");
        }
        record_error(self.kind());

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
