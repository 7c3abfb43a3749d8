use anyhow::Result;
use axum::{routing::get, Router};
use phone_insights_api::{
    observability::{init_logging, init_metrics, metrics_handler},
    performance::{CacheKey, InMemoryCache},
    resilience::CircuitBreaker,
    routes, AppState, PredictionGateway,
};
use phone_insights_client::PredictionServiceClient;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::load()?;

    init_logging(config.log_config())?;
    init_metrics()?;

    tracing::info!(
        upstream = %config.upstream.base_url,
        port = config.port,
        "Starting phone insights gateway"
    );

    let client = PredictionServiceClient::new(config.upstream_config())?;
    let cache: InMemoryCache<CacheKey, Value> = InMemoryCache::new(config.cache_config()?);
    let gateway_config = config.gateway_config();
    let breaker = CircuitBreaker::new(gateway_config.service_name.clone(), config.breaker_config());

    let gateway = PredictionGateway::new(client, Arc::new(cache), Arc::new(breaker), gateway_config);
    tracing::info!("Prediction gateway initialized");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(routes(AppState::new(Arc::new(gateway))))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
