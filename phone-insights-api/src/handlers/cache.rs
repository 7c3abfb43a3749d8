use axum::{extract::State, http::StatusCode};
use tracing::info;

use crate::AppState;

pub async fn clear(State(state): State<AppState>) -> StatusCode {
    state.gateway.clear_cache().await;
    info!("Response cache cleared on request");
    StatusCode::NO_CONTENT
}
