//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize metrics (call once at startup)
///
/// Idempotent. Fails only if another global recorder is already installed.
pub fn init_metrics() -> anyhow::Result<()> {
    PROMETHEUS_HANDLE.get_or_try_init(|| PrometheusBuilder::new().install_recorder())?;

    register_metrics();
    Ok(())
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "tokenmeter_requests_total",
        "Total number of count requests processed"
    );
    metrics::describe_counter!(
        "tokenmeter_tokens_counted_total",
        "Total tokens counted"
    );
    metrics::describe_counter!(
        "tokenmeter_errors_total",
        "Total error responses by kind"
    );
    metrics::describe_counter!(
        "tokenmeter_encoding_fallbacks_total",
        "Subword models that fell back to the default encoding"
    );
    metrics::describe_histogram!(
        "tokenmeter_request_duration_seconds",
        "Request duration in seconds"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record a count request
pub fn record_request(status: &str, label: &str, duration_secs: f64) {
    metrics::counter!("tokenmeter_requests_total", "status" => status.to_string(), "route" => label.to_string())
        .increment(1);
    metrics::histogram!("tokenmeter_request_duration_seconds", "route" => label.to_string())
        .record(duration_secs);
}

/// Record tokens counted
pub fn record_tokens(route: &str, count: u64) {
    metrics::counter!("tokenmeter_tokens_counted_total", "route" => route.to_string())
        .increment(count);
}

/// Record an error response
pub fn record_error(kind: &str) {
    metrics::counter!("tokenmeter_errors_total", "kind" => kind.to_string()).increment(1);
}

/// Record a fallback to the default encoding
///
/// Labelled by route only; model names come from callers and are unbounded.
pub fn record_encoding_fallback(route: &str) {
    metrics::counter!("tokenmeter_encoding_fallbacks_total", "route" => route.to_string())
        .increment(1);
}
