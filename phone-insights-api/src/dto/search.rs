use phone_insights_core::{PhoneRecord, PhoneSearchResults, SearchQuery};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::gateway::{GatewayResponse, ResponseMetadata};

#[derive(Debug, Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 1, max = 100))]
    pub q: String,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,
}

impl From<SearchParams> for SearchQuery {
    fn from(params: SearchParams) -> Self {
        let mut query = SearchQuery::new(params.q.trim());
        query.limit = params.limit;
        query.brand = params.brand;
        query
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<PhoneRecord>,
    pub total: usize,
    pub metadata: ResponseMetadata,
}

impl From<GatewayResponse<PhoneSearchResults>> for SearchResponse {
    fn from(response: GatewayResponse<PhoneSearchResults>) -> Self {
        Self {
            results: response.data.results,
            total: response.data.total,
            metadata: response.metadata,
        }
    }
}
