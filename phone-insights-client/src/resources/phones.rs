//! Phone dataset search

use crate::client::HttpClient;
use crate::error::UpstreamResult;
use phone_insights_core::SearchQuery;
use serde_json::Value;
use std::sync::Arc;

/// Client for `/api/phones/*`
#[derive(Debug, Clone)]
pub struct PhonesClient {
    client: Arc<HttpClient>,
}

impl PhonesClient {
    /// Create a new phones client
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Search the dataset and return the raw response body
    pub async fn search(&self, query: &SearchQuery) -> UpstreamResult<Value> {
        let timeout = self.client.config().timeout;
        self.client
            .get_with_query("/api/phones/search", query, timeout)
            .await
    }
}
