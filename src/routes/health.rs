//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Full health check with dependency status
//! - `/health/ready` - Readiness check
//! - `/health/live` - Liveness check

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{
    tokens::counter::default_encoding,
    AppState,
};

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual dependency check result
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dependency checks collection
#[derive(Debug, Serialize)]
pub struct DependencyChecks {
    pub default_encoding: DependencyCheck,
}

/// Hosted counting backend description
///
/// Reported only; calling it would spend quota and needs credentials.
#[derive(Debug, Serialize)]
pub struct HostedBackend {
    pub name: String,
    pub target: String,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub registered_clients: usize,
    pub checks: DependencyChecks,
    pub hosted_backend: HostedBackend,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Check that the default encoding can be built
async fn check_default_encoding() -> DependencyCheck {
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(|| default_encoding().map(|_| ())).await;

    let error = match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(e) => Some(e.to_string()),
    };

    DependencyCheck {
        status: if error.is_none() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        latency_ms: start.elapsed().as_millis() as u64,
        error,
    }
}

/// Full health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let encoding_check = check_default_encoding().await;
    let overall_status = encoding_check.status.clone();
    let uptime = state.start_time.elapsed().as_secs();

    let response = HealthResponse {
        status: overall_status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        timestamp: chrono::Utc::now().to_rfc3339(),
        registered_clients: state.config.api_keys.len(),
        checks: DependencyChecks {
            default_encoding: encoding_check,
        },
        hosted_backend: HostedBackend {
            name: state.token_counter.hosted_backend().to_string(),
            target: state.token_counter.hosted_target(),
        },
    };

    let status_code = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Readiness check endpoint
///
/// Returns 200 OK once the default encoding can be built.
pub async fn readiness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    if check_default_encoding().await.status == HealthStatus::Unhealthy {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SimpleHealthResponse {
                status: HealthStatus::Unhealthy,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

/// Liveness check endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
