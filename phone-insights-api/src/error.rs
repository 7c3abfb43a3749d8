use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use phone_insights_client::UpstreamError;
use phone_insights_core::CoreError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dto::ErrorResponse;
use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream timeout: {0}")]
    GatewayTimeout(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{}: {}", field, reasons.join(", "))
            })
            .collect();
        fields.sort();
        ApiError::Validation(fields.join("; "))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ApiError::Validation(msg),
            CoreError::InvalidResponse(msg) => ApiError::BadGateway(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::CircuitOpen { service } => ApiError::ServiceUnavailable(format!(
                "{} is temporarily unavailable, try again later",
                service
            )),
            GatewayError::InvalidResponse(msg) => ApiError::BadGateway(msg),
            GatewayError::Upstream(e) => match e {
                UpstreamError::Timeout(_) => ApiError::GatewayTimeout(e.to_string()),
                UpstreamError::Network(_) => ApiError::ServiceUnavailable(e.to_string()),
                ref http if http.is_server_error() => ApiError::ServiceUnavailable(e.to_string()),
                ref http if http.is_client_error() => ApiError::BadGateway(e.to_string()),
                other => ApiError::Internal(other.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "Validation error", msg.clone()),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable", msg.clone())
            }
            ApiError::GatewayTimeout(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, "Upstream timeout", msg.clone())
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "Bad gateway", msg.clone()),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", err.clone())
            }
        };

        let body = ErrorResponse {
            error: message.to_string(),
            details: Some(details),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
