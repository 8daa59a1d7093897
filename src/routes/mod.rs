//! HTTP routes for Tokenmeter
//!
//! This module defines all HTTP endpoints exposed by the service.

pub mod count;
pub mod health;
pub mod metrics;

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    docs::TokenmeterApiDoc,
    error::{AppError, ErrorResponse},
    middleware::auth::auth_middleware,
    AppState,
};

/// Largest request body the count endpoint will buffer
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    // Count endpoint accepts any method; auth only wraps matched routes
    let protected_routes = Router::new()
        .route("/", any(count::count_tokens))
        .route("/v1/tokens/count", any(count::count_tokens))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes (health checks, metrics, docs) - no auth required
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/docs/openapi.json", get(openapi_json));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        // Global middleware (applied to all routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Handler for OpenAPI JSON endpoint
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(TokenmeterApiDoc::openapi())
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}

/// Last-resort conversion of a handler panic into a JSON 500
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown internal error".to_string()
    };

    AppError::Internal(anyhow::anyhow!(message)).into_response()
}
