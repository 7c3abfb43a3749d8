//! Prometheus metrics for the gateway.
//!
//! - HTTP request metrics (count and duration per route)
//! - Gateway metrics (upstream call duration, cache hits and misses,
//!   circuit breaker rejections)
//! - `/metrics` endpoint for Prometheus scraping
//!
//! # Example
//!
//! ```rust,ignore
//! use phone_insights_api::observability::metrics::{init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! init_metrics().expect("Failed to initialize metrics");
//!
//! let app: Router<()> = Router::new().route("/metrics", get(metrics_handler));
//! ```

use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Errors raised while installing the metrics recorder
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to install metrics recorder: {0}")]
    Installation(String),
}

/// Installs the Prometheus recorder. Safe to call more than once.
///
/// # Errors
///
/// Returns an error if the Prometheus exporter fails to install.
pub fn init_metrics() -> Result<(), MetricsError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("http_request_duration".to_string()),
            DURATION_BUCKETS,
        )
        .map_err(|e| MetricsError::Installation(e.to_string()))?
        .set_buckets_for_metric(
            Matcher::Prefix("gateway_request_duration".to_string()),
            DURATION_BUCKETS,
        )
        .map_err(|e| MetricsError::Installation(e.to_string()))?
        .install_recorder()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Installation("Handle already set".to_string()))?;

    register_metric_descriptions();
    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(
        "http_requests_total",
        Unit::Count,
        "Total number of HTTP requests by method, route and status"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_histogram!(
        "gateway_request_duration_seconds",
        Unit::Seconds,
        "Duration of gateway calls by endpoint and outcome"
    );
    describe_counter!(
        "gateway_cache_hits_total",
        Unit::Count,
        "Gateway calls answered from the cache"
    );
    describe_counter!(
        "gateway_cache_misses_total",
        Unit::Count,
        "Gateway calls that had to go upstream"
    );
    describe_counter!(
        "gateway_circuit_rejections_total",
        Unit::Count,
        "Gateway calls rejected by an open circuit breaker"
    );
}

/// Axum handler that renders the Prometheus text format.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => {
            error!("Metrics handler called but metrics not initialized");
            (StatusCode::INTERNAL_SERVER_ERROR, "Metrics not initialized").into_response()
        }
    }
}

/// Axum middleware recording request count and latency per matched route.
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Gateway-level metrics
pub struct GatewayMetrics;

impl GatewayMetrics {
    pub fn record_call(endpoint: &'static str, outcome: &'static str, duration: Duration) {
        histogram!(
            "gateway_request_duration_seconds",
            "endpoint" => endpoint,
            "outcome" => outcome
        )
        .record(duration.as_secs_f64());
    }

    pub fn cache_hit(endpoint: &'static str) {
        counter!("gateway_cache_hits_total", "endpoint" => endpoint).increment(1);
    }

    pub fn cache_miss(endpoint: &'static str) {
        counter!("gateway_cache_misses_total", "endpoint" => endpoint).increment(1);
    }

    pub fn circuit_rejected(endpoint: &'static str) {
        counter!("gateway_circuit_rejections_total", "endpoint" => endpoint).increment(1);
    }
}
