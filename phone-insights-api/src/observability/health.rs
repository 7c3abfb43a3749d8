//! Health reporting for the gateway and its dependencies.
//!
//! The report aggregates one component per dependency (the upstream
//! prediction service, the cache) plus circuit breaker states. The overall
//! status is the worst component status; `Unhealthy` maps to 503.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::performance::CacheStatistics;
use crate::resilience::{CircuitBreakerStats, CircuitState};

/// Health status of a component or the overall system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,
    /// Component is operational but with reduced functionality
    Degraded,
    /// Component is not operational
    Unhealthy,
}

impl HealthStatus {
    pub fn http_status(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Combines two health statuses, returning the worst status
    pub fn combine(&self, other: &HealthStatus) -> HealthStatus {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

impl From<CircuitState> for HealthStatus {
    fn from(state: CircuitState) -> Self {
        match state {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::HalfOpen => HealthStatus::Degraded,
            CircuitState::Open => HealthStatus::Unhealthy,
        }
    }
}

/// Health information for a single component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Time taken to perform the health check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: None,
            version: None,
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            ..Self::healthy()
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            ..Self::healthy()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = Some(latency.as_millis() as u64);
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }
}

/// Cache section of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealth {
    pub status: HealthStatus,
    pub entries: usize,
    pub hit_rate: f64,
}

impl From<&CacheStatistics> for CacheHealth {
    fn from(stats: &CacheStatistics) -> Self {
        Self {
            status: HealthStatus::Healthy,
            entries: stats.current_entries,
            hit_rate: stats.hit_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerHealth {
    pub state: CircuitState,
    pub failures: usize,
}

impl From<&CircuitBreakerStats> for BreakerHealth {
    fn from(stats: &CircuitBreakerStats) -> Self {
        Self {
            state: stats.state,
            failures: stats.failures,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesHealth {
    /// The upstream prediction service
    pub api: ComponentHealth,
    pub cache: CacheHealth,
    /// Always `not_configured`: the gateway has no database.
    pub database: String,
    pub circuit_breakers: BTreeMap<String, BreakerHealth>,
}

/// Overall health including all components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub services: ServicesHealth,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

impl HealthReport {
    pub fn new(
        api: ComponentHealth,
        cache: &CacheStatistics,
        breakers: &[CircuitBreakerStats],
    ) -> Self {
        let cache = CacheHealth::from(cache);
        let circuit_breakers: BTreeMap<String, BreakerHealth> = breakers
            .iter()
            .map(|stats| (stats.name.clone(), BreakerHealth::from(stats)))
            .collect();

        let status = circuit_breakers
            .values()
            .map(|b| HealthStatus::from(b.state))
            .fold(api.status.combine(&cache.status), |acc, s| acc.combine(&s));

        Self {
            status,
            services: ServicesHealth {
                api,
                cache,
                database: "not_configured".to_string(),
                circuit_breakers,
            },
            timestamp: Utc::now(),
            version: String::new(),
            uptime_seconds: 0,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_uptime(mut self, uptime: Duration) -> Self {
        self.uptime_seconds = uptime.as_secs();
        self
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let status_code = self.status.http_status();
        (status_code, Json(self)).into_response()
    }
}
