//! Observability: structured logging, Prometheus metrics and health reporting.

pub mod health;
pub mod logging;
pub mod metrics;

pub use health::{
    BreakerHealth, CacheHealth, ComponentHealth, HealthReport, HealthStatus, ServicesHealth,
};

pub use logging::{
    init_logging, request_id_middleware, LogConfig, LogFormat, LoggingError, REQUEST_ID_HEADER,
};

pub use metrics::{init_metrics, metrics_handler, track_http_metrics, GatewayMetrics, MetricsError};
