use phone_insights_api::*;
use phone_insights_core::{
    InputQuality, Prediction, PredictionOutput, PredictionValue, TaskType,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use validator::Validate;

// ===== Helper Functions =====

fn price_request() -> PricePredictionRequest {
    serde_json::from_value(json!({
        "ram": 8,
        "battery": 4000,
        "screen": 6.1,
        "weight": 174,
        "year": 2024,
        "company": "Apple"
    }))
    .unwrap()
}

fn details_for(task: TaskType, output: PredictionOutput, cached: bool) -> PredictionDetails {
    let input = price_request().to_input();
    let quality = InputQuality::new().assess(task, &input);
    let prediction = Prediction::new(task, input, output);
    PredictionDetails::new(
        &prediction,
        quality,
        ResponseMetadata {
            cached,
            response_time_ms: 7,
        },
    )
}

// ===== Prediction Request DTO Tests =====

#[test]
fn test_price_request_validation_success() {
    assert!(price_request().validate().is_ok());
}

#[test]
fn test_price_request_rejects_zero_and_negative_values() {
    let mut request = price_request();
    request.ram = 0.0;
    request.screen = -6.1;
    request.year = 0;

    let errors = request.validate().unwrap_err();
    let fields = errors.field_errors();

    assert!(fields.contains_key("ram"));
    assert!(fields.contains_key("screen"));
    assert!(fields.contains_key("year"));
    assert!(!fields.contains_key("battery"));
}

#[test]
fn test_price_request_rejects_empty_company() {
    let mut request = price_request();
    request.company = String::new();
    assert!(request.validate().is_err());
}

#[test]
fn test_requests_require_every_field() {
    let missing_price = json!({
        "battery": 5000, "screen": 6.8, "weight": 233, "year": 2024, "company": "Samsung"
    });
    assert!(serde_json::from_value::<RamPredictionRequest>(missing_price).is_err());

    let missing_year = json!({
        "ram": 12, "battery": 5000, "screen": 6.8, "weight": 233, "price": 1299
    });
    assert!(serde_json::from_value::<BrandPredictionRequest>(missing_year).is_err());
}

#[test]
fn test_price_request_maps_to_input() {
    let input = price_request().to_input();

    assert_eq!(input.ram, Some(8.0));
    assert_eq!(input.screen_size, Some(6.1));
    assert_eq!(input.brand.as_deref(), Some("Apple"));
    assert_eq!(input.price, None);
    assert_eq!(
        input.to_upstream_payload(),
        json!({
            "ram": 8.0,
            "battery": 4000.0,
            "screen": 6.1,
            "weight": 174.0,
            "year": 2024,
            "company": "Apple"
        })
    );
}

#[test]
fn test_brand_request_has_no_company() {
    let request: BrandPredictionRequest = serde_json::from_value(json!({
        "ram": 12, "battery": 5000, "screen": 6.8, "weight": 233, "year": 2024, "price": 1299
    }))
    .unwrap();

    let input = request.to_input();
    assert_eq!(input.brand, None);
    assert_eq!(input.price, Some(1299.0));
    assert_eq!(BrandPredictionRequest::TASK, TaskType::Brand);
}

#[test]
fn test_request_tasks() {
    assert_eq!(PricePredictionRequest::TASK, TaskType::Price);
    assert_eq!(RamPredictionRequest::TASK, TaskType::Ram);
    assert_eq!(BatteryPredictionRequest::TASK, TaskType::Battery);
}

// ===== Prediction Response DTO Tests =====

#[test]
fn test_price_response_flattens_details() {
    let output = PredictionOutput::from_upstream(
        TaskType::Price,
        &json!({"price": 1299.5, "confidence": 0.8, "model_used": "rf-price-v2"}),
    )
    .unwrap();
    let details = details_for(TaskType::Price, output.clone(), true);

    let response = PricePredictionRequest::respond(&output, details).unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["price"], json!(1299.5));
    assert_eq!(json["formatted"], json!("$1,299.50"));
    assert_eq!(json["confidence"], json!(0.8));
    assert_eq!(json["model"], json!("rf-price-v2"));
    assert_eq!(json["metadata"], json!({"cached": true, "responseTimeMs": 7}));
    assert_eq!(json["inputQuality"]["missing"], json!([]));
    assert!(json.get("details").is_none());
    assert!(json["createdAt"].is_string());
}

#[test]
fn test_optional_details_are_omitted() {
    let output = PredictionOutput::new(PredictionValue::Number(8.0));
    let details = details_for(TaskType::Ram, output.clone(), false);

    let response = RamPredictionRequest::respond(&output, details).unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["formatted"], json!("8 GB"));
    assert!(json.get("confidence").is_none());
    assert!(json.get("model").is_none());
}

#[test]
fn test_upstream_metadata_is_surfaced() {
    let output = PredictionOutput::from_upstream(
        TaskType::Battery,
        &json!({"battery": 4500, "metadata": {"modelVersion": "3.1", "processingTime": 12.5}}),
    )
    .unwrap();
    let details = details_for(TaskType::Battery, output.clone(), false);

    let response = BatteryPredictionRequest::respond(&output, details).unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["formatted"], json!("4,500 mAh"));
    assert_eq!(json["metadata"]["modelVersion"], json!("3.1"));
    assert_eq!(json["metadata"]["processingTimeMs"], json!(12.5));
}

#[test]
fn test_wrong_value_kind_is_bad_gateway() {
    let label = PredictionOutput::new(PredictionValue::Label("Apple".into()));
    let details = details_for(TaskType::Price, label.clone(), false);
    let err = PricePredictionRequest::respond(&label, details).unwrap_err();
    assert!(matches!(err, ApiError::BadGateway(_)));

    let number = PredictionOutput::new(PredictionValue::Number(3.0));
    let details = details_for(TaskType::Brand, number.clone(), false);
    let err = BrandPredictionRequest::respond(&number, details).unwrap_err();
    assert!(matches!(err, ApiError::BadGateway(_)));
}

// ===== Cache Parameter Tests =====

#[test]
fn test_cache_params_default_to_cached_default_ttl() {
    let options = CacheParams::default().call_options();
    assert!(options.use_cache);
    assert_eq!(options.cache_ttl, None);
}

#[test]
fn test_cache_params_override() {
    let params: CacheParams =
        serde_json::from_value(json!({"cache": false, "cacheTtl": 60})).unwrap();
    let options = params.call_options();

    assert!(!options.use_cache);
    assert_eq!(options.cache_ttl, Some(Duration::from_secs(60)));
}

#[test]
fn test_cache_ttl_bounds() {
    let zero = CacheParams {
        cache: None,
        cache_ttl: Some(0),
    };
    assert!(zero.validate().is_err());

    let day = CacheParams {
        cache: None,
        cache_ttl: Some(86_400),
    };
    assert!(day.validate().is_ok());

    let too_long = CacheParams {
        cache: None,
        cache_ttl: Some(86_401),
    };
    assert!(too_long.validate().is_err());
}

// ===== Search DTO Tests =====

#[test]
fn test_search_params_validation() {
    let ok: SearchParams = serde_json::from_value(json!({"q": "pixel", "limit": 10})).unwrap();
    assert!(ok.validate().is_ok());

    let too_many: SearchParams = serde_json::from_value(json!({"q": "pixel", "limit": 500})).unwrap();
    assert!(too_many.validate().is_err());

    let empty: SearchParams = serde_json::from_value(json!({"q": ""})).unwrap();
    assert!(empty.validate().is_err());
}

#[test]
fn test_search_params_into_query_trims_text() {
    let params: SearchParams =
        serde_json::from_value(json!({"q": "  galaxy ", "brand": "Samsung"})).unwrap();
    let query = phone_insights_core::SearchQuery::from(params);

    assert_eq!(query.q, "galaxy");
    assert_eq!(query.brand.as_deref(), Some("Samsung"));
    assert_eq!(query.limit, None);
}

#[test]
fn test_error_response_round_trip() {
    let body: ErrorResponse =
        serde_json::from_value(json!({"error": "Bad gateway", "details": "boom"})).unwrap();
    assert_eq!(body.error, "Bad gateway");
    assert_eq!(body.details.as_deref(), Some("boom"));
}
