//! HTTP surface of the phone insights gateway.
//!
//! Route handlers validate input and hand every upstream call to the
//! [`PredictionGateway`], which applies the response cache, the circuit
//! breaker and per-call timeouts.

pub mod dto;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod observability;
pub mod performance;
pub mod resilience;

pub use dto::*;
pub use error::{ApiError, ApiResult};
pub use gateway::{
    CallOptions, GatewayConfig, GatewayError, GatewayResponse, GatewayResult, PredictionGateway,
    ResponseMetadata,
};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<PredictionGateway>,
    pub started_at: Instant,
    pub version: String,
}

impl AppState {
    pub fn new(gateway: Arc<PredictionGateway>) -> Self {
        Self {
            gateway,
            started_at: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// All public routes. `/metrics` is mounted by the binary.
pub fn routes(state: AppState) -> Router {
    let predict_routes = Router::new()
        .route(
            "/price",
            post(handlers::predict::predict::<PricePredictionRequest>),
        )
        .route("/ram", post(handlers::predict::predict::<RamPredictionRequest>))
        .route(
            "/battery",
            post(handlers::predict::predict::<BatteryPredictionRequest>),
        )
        .route(
            "/brand",
            post(handlers::predict::predict::<BrandPredictionRequest>),
        );

    Router::new()
        .nest("/api/predict", predict_routes)
        .route("/api/phones/search", get(handlers::search::search))
        .route("/api/health", get(handlers::health::health))
        .route("/api/v1/health", get(handlers::health::health))
        .route("/api/cache/clear", post(handlers::cache::clear))
        .route("/api/circuit-breaker/reset", post(handlers::breaker::reset))
        .layer(middleware::from_fn(observability::track_http_metrics))
        .layer(middleware::from_fn(observability::request_id_middleware))
        .with_state(state)
}
