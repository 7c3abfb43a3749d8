use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::TimeoutConfig;

/// Per-call options accepted by every cacheable gateway method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Read from and write to the cache.
    pub use_cache: bool,
    /// Overrides the gateway's default TTL for the entry written by this call.
    pub cache_ttl: Option<Duration>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_ttl: None,
        }
    }
}

impl CallOptions {
    pub fn no_cache() -> Self {
        Self {
            use_cache: false,
            cache_ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub cached: bool,
    pub response_time_ms: u64,
}

/// Gateway result envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse<T> {
    pub data: T,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Name of the upstream dependency, used for the breaker and in errors.
    pub service_name: String,
    /// TTL for cache writes when the call does not override it.
    pub default_ttl: Duration,
    pub timeouts: TimeoutConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            service_name: "python-api".to_string(),
            default_ttl: Duration::from_secs(300),
            timeouts: TimeoutConfig::default(),
        }
    }
}
