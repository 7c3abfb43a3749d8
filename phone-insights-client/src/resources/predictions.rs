//! Prediction endpoints

use crate::client::HttpClient;
use crate::error::UpstreamResult;
use phone_insights_core::TaskType;
use serde_json::Value;
use std::sync::Arc;

/// Client for `/api/predict/*`
#[derive(Debug, Clone)]
pub struct PredictionsClient {
    client: Arc<HttpClient>,
}

impl PredictionsClient {
    /// Create a new predictions client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Run a prediction and return the raw response body
    pub async fn predict(&self, task: TaskType, payload: &Value) -> UpstreamResult<Value> {
        let timeout = self.client.config().timeout;
        self.client
            .post(&task.upstream_path(), payload, timeout)
            .await
    }
}
