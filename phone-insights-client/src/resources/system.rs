//! Service health

use crate::client::HttpClient;
use crate::error::UpstreamResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Body of the upstream `/health` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamHealth {
    pub status: String,
    #[serde(default, alias = "model_loaded", alias = "models_loaded")]
    pub model_loaded: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpstreamHealth {
    /// `ok`, `healthy` and `up` are all used by the service over time
    pub fn is_healthy(&self) -> bool {
        let status = self.status.to_ascii_lowercase();
        matches!(status.as_str(), "ok" | "healthy" | "up") && self.model_loaded != Some(false)
    }
}

/// Client for service-level endpoints
#[derive(Debug, Clone)]
pub struct SystemClient {
    client: Arc<HttpClient>,
}

impl SystemClient {
    /// Create a new system client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Check `/health` with the short health timeout
    pub async fn health(&self) -> UpstreamResult<UpstreamHealth> {
        let timeout = self.client.config().health_timeout;
        self.client.get("/health", timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_status_variants() {
        let ok: UpstreamHealth = serde_json::from_value(json!({"status": "OK"})).unwrap();
        assert!(ok.is_healthy());

        let no_model: UpstreamHealth =
            serde_json::from_value(json!({"status": "healthy", "model_loaded": false})).unwrap();
        assert!(!no_model.is_healthy());

        let down: UpstreamHealth = serde_json::from_value(json!({"status": "degraded"})).unwrap();
        assert!(!down.is_healthy());
    }
}
