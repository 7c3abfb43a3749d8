//! Phone Insights prediction service client
//!
//! Typed access to the external Python service that serves the phone
//! dataset models. The service is treated as a black box: JSON in, JSON out,
//! HTTP status codes for errors.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use phone_insights_client::{PredictionServiceClient, UpstreamConfig};
//! use phone_insights_core::{PredictionInput, TaskType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PredictionServiceClient::new(UpstreamConfig::new("http://localhost:8000"))?;
//!
//!     let input = PredictionInput::new().with_ram(8.0).with_brand("Apple");
//!     let body = client
//!         .predictions()
//!         .predict(TaskType::Price, &input.to_upstream_payload())
//!         .await?;
//!     println!("{}", body);
//!
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod resources;

pub use client::HttpClient;
pub use config::{AuthConfig, UpstreamConfig};
pub use error::{UpstreamError, UpstreamResult};
pub use resources::{PhonesClient, PredictionsClient, SystemClient, UpstreamHealth};

use std::sync::Arc;

/// Entry point to every upstream endpoint group.
#[derive(Debug, Clone)]
pub struct PredictionServiceClient {
    http_client: Arc<HttpClient>,
    predictions: PredictionsClient,
    phones: PhonesClient,
    system: SystemClient,
}

impl PredictionServiceClient {
    /// Create a new client with the given configuration.
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        let http_client = Arc::new(HttpClient::new(config)?);

        Ok(Self {
            predictions: PredictionsClient::new(Arc::clone(&http_client)),
            phones: PhonesClient::new(Arc::clone(&http_client)),
            system: SystemClient::new(Arc::clone(&http_client)),
            http_client,
        })
    }

    /// Prediction endpoints
    pub fn predictions(&self) -> &PredictionsClient {
        &self.predictions
    }

    /// Dataset search endpoints
    pub fn phones(&self) -> &PhonesClient {
        &self.phones
    }

    /// Health endpoint
    pub fn system(&self) -> &SystemClient {
        &self.system
    }

    /// Get the configuration
    pub fn config(&self) -> &UpstreamConfig {
        self.http_client.config()
    }
}
