use axum::{extract::State, Json};
use tracing::info;

use crate::{resilience::CircuitBreakerStats, AppState};

/// `POST /api/circuit-breaker/reset`: closes the upstream breaker and
/// answers with its state afterwards.
pub async fn reset(State(state): State<AppState>) -> Json<CircuitBreakerStats> {
    state.gateway.breaker().reset().await;
    let stats = state.gateway.breaker_stats().await;
    info!(breaker = %stats.name, "Circuit breaker reset on request");
    Json(stats)
}
