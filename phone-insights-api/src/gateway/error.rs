use phone_insights_client::UpstreamError;
use phone_insights_core::CoreError;
use thiserror::Error;

use crate::resilience::{CircuitBreakerError, TimeoutError};

/// Everything that can go wrong behind the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The upstream was called and failed
    #[error(transparent)]
    Upstream(UpstreamError),

    /// The breaker rejected the call; the upstream was not contacted
    #[error("Circuit breaker is open for {service}")]
    CircuitOpen { service: String },

    /// The upstream answered 2xx with a body we cannot use
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Short machine-readable kind, used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::CircuitOpen { .. } => "circuit_open",
            GatewayError::InvalidResponse(_) => "invalid_response",
            GatewayError::Upstream(UpstreamError::Timeout(_)) => "timeout",
            GatewayError::Upstream(UpstreamError::Network(_)) => "network",
            GatewayError::Upstream(e) if e.is_client_error() => "upstream_4xx",
            GatewayError::Upstream(e) if e.is_server_error() => "upstream_5xx",
            GatewayError::Upstream(_) => "upstream",
        }
    }
}

impl From<UpstreamError> for GatewayError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Decode(e) => GatewayError::InvalidResponse(e.to_string()),
            other => GatewayError::Upstream(other),
        }
    }
}

impl From<CoreError> for GatewayError {
    fn from(err: CoreError) -> Self {
        GatewayError::InvalidResponse(err.to_string())
    }
}

impl From<CircuitBreakerError<UpstreamError>> for GatewayError {
    fn from(err: CircuitBreakerError<UpstreamError>) -> Self {
        match err {
            CircuitBreakerError::Open { name } => GatewayError::CircuitOpen { service: name },
            CircuitBreakerError::ExecutionFailed(e) => e.into(),
        }
    }
}

impl From<TimeoutError<UpstreamError>> for UpstreamError {
    fn from(err: TimeoutError<UpstreamError>) -> Self {
        match err {
            TimeoutError::Elapsed { elapsed } => UpstreamError::Timeout(elapsed),
            TimeoutError::Inner(e) => e,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
