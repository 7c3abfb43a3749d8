use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use phone_insights_core::{InputQuality, Prediction};
use tracing::debug;
use validator::Validate;

use crate::{
    dto::{CacheParams, PredictionDetails, PredictionRequest},
    error::ApiResult,
    AppState,
};

/// `POST /api/predict/{task}`: validate, forward through the gateway, shape.
///
/// Body and query rejections are mapped to 400 so no malformed request ever
/// reaches the cache or the upstream.
pub async fn predict<R: PredictionRequest>(
    State(state): State<AppState>,
    params: Result<Query<CacheParams>, QueryRejection>,
    payload: Result<Json<R>, JsonRejection>,
) -> ApiResult<Json<R::Response>> {
    let Json(request) = payload?;
    let Query(params) = params?;
    request.validate()?;
    params.validate()?;

    let input = request.to_input();
    input.validate()?;

    let quality = InputQuality::new().assess(R::TASK, &input);
    if !quality.warnings.is_empty() {
        debug!(task = %R::TASK, warnings = ?quality.warnings, "Implausible prediction input");
    }

    let response = state
        .gateway
        .predict(R::TASK, &input, params.call_options())
        .await?;

    let prediction = Prediction::new(R::TASK, input, response.data);
    let details = PredictionDetails::new(&prediction, quality, response.metadata);

    Ok(Json(R::respond(prediction.output(), details)?))
}
