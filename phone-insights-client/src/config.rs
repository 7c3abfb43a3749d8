//! Client configuration
//!
//! Connection settings for the prediction service.

use crate::error::{UpstreamError, UpstreamResult};
use std::time::Duration;

/// Configuration for the prediction service client
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the prediction service
    pub base_url: String,

    /// Authentication method
    pub auth: AuthConfig,

    /// Request timeout for prediction and search calls
    pub timeout: Duration,

    /// Request timeout for the health check
    pub health_timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Log request and response bodies at debug level
    pub enable_logging: bool,

    /// Custom headers to add to all requests
    pub custom_headers: Vec<(String, String)>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth: AuthConfig::None,
            timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(2),
            user_agent: format!("phone-insights-client/{}", env!("CARGO_PKG_VERSION")),
            enable_logging: false,
            custom_headers: Vec::new(),
        }
    }
}

impl UpstreamConfig {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the authentication method
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Set the API key for authentication
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.auth = AuthConfig::ApiKey(api_key.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the health check timeout
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable request/response logging
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Add a custom header to all requests
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> UpstreamResult<()> {
        if self.base_url.is_empty() {
            return Err(UpstreamError::Configuration(
                "Base URL cannot be empty".to_string(),
            ));
        }

        url::Url::parse(&self.base_url)?;

        if self.timeout.is_zero() || self.health_timeout.is_zero() {
            return Err(UpstreamError::Configuration(
                "Timeouts cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,

    /// Sent as `X-API-Key`
    ApiKey(String),

    /// Sent as `Authorization: Bearer <token>`
    BearerToken(String),
}

impl AuthConfig {
    /// Check if authentication is configured
    pub fn is_configured(&self) -> bool {
        !matches!(self, AuthConfig::None)
    }
}
