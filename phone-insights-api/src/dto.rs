pub mod prediction;
pub mod search;

pub use prediction::*;
pub use search::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::gateway::CallOptions;

/// Cache controls accepted as query parameters on every cacheable route,
/// e.g. `?cache=false` or `?cacheTtl=60`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CacheParams {
    pub cache: Option<bool>,
    /// Seconds
    #[validate(range(min = 1, max = 86400))]
    pub cache_ttl: Option<u64>,
}

impl CacheParams {
    pub fn call_options(&self) -> CallOptions {
        CallOptions {
            use_cache: self.cache.unwrap_or(true),
            cache_ttl: self.cache_ttl.map(Duration::from_secs),
        }
    }
}

// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
