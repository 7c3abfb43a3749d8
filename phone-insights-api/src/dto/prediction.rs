use chrono::{DateTime, Utc};
use phone_insights_core::{
    format_battery, format_price, format_ram, Prediction, PredictionInput, PredictionOutput,
    QualityReport, TaskType,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::gateway::ResponseMetadata;

/// A statically typed prediction request body.
///
/// Each route accepts exactly the attributes its model was trained on, all
/// required. Field names follow the dataset columns (`screen`, `company`).
pub trait PredictionRequest: DeserializeOwned + Validate + Send + 'static {
    const TASK: TaskType;

    type Response: Serialize + Send;

    fn to_input(&self) -> PredictionInput;

    fn respond(output: &PredictionOutput, details: PredictionDetails) -> ApiResult<Self::Response>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PricePredictionRequest {
    #[validate(range(exclusive_min = 0.0))]
    pub ram: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub battery: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub screen: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
    #[validate(range(exclusive_min = 0))]
    pub year: i32,
    #[validate(length(min = 1, max = 100))]
    pub company: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RamPredictionRequest {
    #[validate(range(exclusive_min = 0.0))]
    pub battery: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub screen: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
    #[validate(range(exclusive_min = 0))]
    pub year: i32,
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 100))]
    pub company: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatteryPredictionRequest {
    #[validate(range(exclusive_min = 0.0))]
    pub ram: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub screen: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
    #[validate(range(exclusive_min = 0))]
    pub year: i32,
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
    #[validate(length(min = 1, max = 100))]
    pub company: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BrandPredictionRequest {
    #[validate(range(exclusive_min = 0.0))]
    pub ram: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub battery: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub screen: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub weight: f64,
    #[validate(range(exclusive_min = 0))]
    pub year: i32,
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
}

/// Fields shared by every prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDetails {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub input_quality: QualityReport,
    pub metadata: PredictionMetadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMetadata {
    pub cached: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
}

impl PredictionDetails {
    pub fn new(prediction: &Prediction, quality: QualityReport, gateway: ResponseMetadata) -> Self {
        let output = prediction.output();
        let upstream = output.metadata.clone().unwrap_or_default();

        Self {
            id: *prediction.id().as_uuid(),
            confidence: output.confidence,
            model: output.model.clone(),
            input_quality: quality,
            metadata: PredictionMetadata {
                cached: gateway.cached,
                response_time_ms: gateway.response_time_ms,
                model_version: upstream.model_version,
                processing_time_ms: upstream.processing_time_ms,
            },
            created_at: prediction.created_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub price: f64,
    pub formatted: String,
    #[serde(flatten)]
    pub details: PredictionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RamResponse {
    pub ram: f64,
    pub formatted: String,
    #[serde(flatten)]
    pub details: PredictionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryResponse {
    pub battery: f64,
    pub formatted: String,
    #[serde(flatten)]
    pub details: PredictionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandResponse {
    pub brand: String,
    #[serde(flatten)]
    pub details: PredictionDetails,
}

impl PredictionRequest for PricePredictionRequest {
    const TASK: TaskType = TaskType::Price;
    type Response = PriceResponse;

    fn to_input(&self) -> PredictionInput {
        PredictionInput::new()
            .with_ram(self.ram)
            .with_battery(self.battery)
            .with_screen_size(self.screen)
            .with_weight(self.weight)
            .with_year(self.year)
            .with_brand(self.company.clone())
    }

    fn respond(output: &PredictionOutput, details: PredictionDetails) -> ApiResult<PriceResponse> {
        let price = output.numeric_value()?;
        Ok(PriceResponse {
            price,
            formatted: format_price(price),
            details,
        })
    }
}

impl PredictionRequest for RamPredictionRequest {
    const TASK: TaskType = TaskType::Ram;
    type Response = RamResponse;

    fn to_input(&self) -> PredictionInput {
        PredictionInput::new()
            .with_battery(self.battery)
            .with_screen_size(self.screen)
            .with_weight(self.weight)
            .with_year(self.year)
            .with_price(self.price)
            .with_brand(self.company.clone())
    }

    fn respond(output: &PredictionOutput, details: PredictionDetails) -> ApiResult<RamResponse> {
        let ram = output.numeric_value()?;
        Ok(RamResponse {
            ram,
            formatted: format_ram(ram),
            details,
        })
    }
}

impl PredictionRequest for BatteryPredictionRequest {
    const TASK: TaskType = TaskType::Battery;
    type Response = BatteryResponse;

    fn to_input(&self) -> PredictionInput {
        PredictionInput::new()
            .with_ram(self.ram)
            .with_screen_size(self.screen)
            .with_weight(self.weight)
            .with_year(self.year)
            .with_price(self.price)
            .with_brand(self.company.clone())
    }

    fn respond(output: &PredictionOutput, details: PredictionDetails) -> ApiResult<BatteryResponse> {
        let battery = output.numeric_value()?;
        Ok(BatteryResponse {
            battery,
            formatted: format_battery(battery),
            details,
        })
    }
}

impl PredictionRequest for BrandPredictionRequest {
    const TASK: TaskType = TaskType::Brand;
    type Response = BrandResponse;

    fn to_input(&self) -> PredictionInput {
        PredictionInput::new()
            .with_ram(self.ram)
            .with_battery(self.battery)
            .with_screen_size(self.screen)
            .with_weight(self.weight)
            .with_year(self.year)
            .with_price(self.price)
    }

    fn respond(output: &PredictionOutput, details: PredictionDetails) -> ApiResult<BrandResponse> {
        Ok(BrandResponse {
            brand: output.label_value()?.to_string(),
            details,
        })
    }
}
