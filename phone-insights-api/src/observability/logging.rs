//! Structured logging and request correlation.
//!
//! - `tracing-subscriber` setup with JSON, pretty or compact output
//! - `X-Request-ID` propagation with one log line per completed request
//!
//! # Examples
//!
//! ```rust,no_run
//! use phone_insights_api::observability::logging::{init_logging, LogConfig};
//!
//! init_logging(LogConfig::default()).expect("Failed to initialize logging");
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};
use uuid::Uuid;

/// HTTP header for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Log format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format for production (machine-readable)
    Json,
    /// Pretty format for development (human-readable)
    Pretty,
    /// Compact format for minimal output
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Default log level, used when `RUST_LOG` is unset
    pub level: String,
    /// Full filter directive (e.g. "phone_insights_api=debug,tower_http=info");
    /// takes precedence over `level` and `RUST_LOG`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            filter: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Failed to install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = match config.filter {
        Some(ref filter) => EnvFilter::try_new(filter)?,
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?,
    };

    match config.format {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_thread_ids(true)
                .with_filter(env_filter);

            tracing_subscriber::registry().with(json_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let pretty_layer = fmt::layer()
                .pretty()
                .with_thread_names(true)
                .with_filter(env_filter);

            tracing_subscriber::registry().with(pretty_layer).try_init()?;
        }
        LogFormat::Compact => {
            let compact_layer = fmt::layer().compact().with_filter(env_filter);

            tracing_subscriber::registry().with(compact_layer).try_init()?;
        }
    }

    info!(format = ?config.format, "Logging system initialized");
    Ok(())
}

/// Reuse the caller's request ID or mint a new one.
fn extract_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= 128)
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware that tags every request with a correlation ID, runs the
/// handler inside a span carrying it, and echoes it on the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = extract_request_id(request.headers());
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = tracing::info_span!("request", request.id = %request_id, %method, uri = %uri);
    let mut response = next.run(request).instrument(span.clone()).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    span.in_scope(|| {
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), duration_ms, "Request completed with server error");
        } else if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), duration_ms, "Request completed with client error");
        } else {
            tracing::info!(status = status.as_u16(), duration_ms, "Request completed");
        }
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
