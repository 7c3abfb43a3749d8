use axum::extract::State;
use std::time::Instant;

use crate::{
    observability::{ComponentHealth, HealthReport},
    AppState,
};

/// `GET /api/health`: upstream check, cache and breaker state in one report.
/// Answers 503 only when the report is unhealthy.
pub async fn health(State(state): State<AppState>) -> HealthReport {
    let start = Instant::now();

    let api = match state.gateway.health().await {
        Ok(response) if response.data.is_healthy() => ComponentHealth::healthy()
            .with_latency(start.elapsed())
            .with_version(response.data.version),
        Ok(response) => ComponentHealth::degraded(format!(
            "upstream reports status '{}'",
            response.data.status
        ))
        .with_latency(start.elapsed())
        .with_version(response.data.version),
        Err(e) => ComponentHealth::unhealthy(e.to_string()).with_latency(start.elapsed()),
    };

    let cache = state.gateway.cache_statistics().await;
    let breaker = state.gateway.breaker_stats().await;

    HealthReport::new(api, &cache, &[breaker])
        .with_version(state.version.as_str())
        .with_uptime(state.started_at.elapsed())
}
