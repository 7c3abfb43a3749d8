use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use phone_insights_core::SearchQuery;
use validator::Validate;

use crate::{
    dto::{CacheParams, SearchParams, SearchResponse},
    error::{ApiError, ApiResult},
    AppState,
};

pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
    cache: Result<Query<CacheParams>, QueryRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Query(params) = params?;
    let Query(cache) = cache?;
    params.validate()?;
    cache.validate()?;

    if params.q.trim().is_empty() {
        return Err(ApiError::Validation("q: must not be blank".to_string()));
    }

    let query = SearchQuery::from(params);
    let response = state
        .gateway
        .search_phones(&query, cache.call_options())
        .await?;

    Ok(Json(SearchResponse::from(response)))
}
