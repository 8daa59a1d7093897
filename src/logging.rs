//! Structured logging
//!
//! Subscriber setup plus a per-request context carrying a short trace id, so
//! every log line for one count request can be correlated.

use std::time::Instant;

use axum::response::{IntoResponse, Response};
use tracing::{info, info_span, Span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::{config::LogFormat, error::AppError};

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "tokenmeter=info,tower_http=info";

/// Install the global tracing subscriber
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_target(true)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init(),
    }
}

/// Context for tracking a count request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Short identifier for log correlation
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Authenticated client identifier
    pub client: String,
    /// Requested model, if any
    pub model: Option<String>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(client: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            client: client.to_string(),
            model: None,
        }
    }

    /// Set the model for this request
    pub fn with_model(mut self, model: Option<&str>) -> Self {
        self.model = model.map(str::to_string);
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log a successful count
    pub fn log_count_complete(
        &self,
        model_used: &str,
        route: &str,
        input_text_length: usize,
        token_count: usize,
    ) {
        info!(
            trace_id = %self.trace_id,
            client = %self.client,
            model_used = %model_used,
            route = %route,
            input_text_length,
            token_count,
            elapsed_ms = %self.elapsed_ms(),
            "Successfully processed token count request for {}",
            self.client
        );
    }

    /// Span carrying the request's correlation fields
    pub fn span(&self) -> Span {
        info_span!(
            "count_request",
            trace_id = %self.trace_id,
            client = %self.client,
            model = ?self.model,
        )
    }

    /// Convert a failure into its response inside this request's span
    ///
    /// `AppError::into_response` writes the single log entry for the failure.
    pub fn error_response(&self, error: AppError) -> Response {
        self.span().in_scope(|| error.into_response())
    }
}
