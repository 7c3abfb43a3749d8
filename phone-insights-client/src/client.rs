//! HTTP client implementation
//!
//! Thin JSON transport for the prediction service. Each request is sent
//! exactly once; failure accounting is left to the caller.

use crate::config::{AuthConfig, UpstreamConfig};
use crate::error::{UpstreamError, UpstreamResult};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The HTTP client for making upstream requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<UpstreamConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        for (name, value) in &config.custom_headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::try_from(name.as_str()),
                header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(UpstreamError::Network)?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Build the full URL for an endpoint
    pub fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str, timeout: Duration) -> UpstreamResult<T> {
        let request = self.client.request(Method::GET, self.url(path));
        self.send(request, path, timeout).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        timeout: Duration,
    ) -> UpstreamResult<T> {
        let request = self.client.request(Method::GET, self.url(path)).query(query);
        self.send(request, path, timeout).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> UpstreamResult<T> {
        if self.config.enable_logging {
            if let Ok(text) = serde_json::to_string(body) {
                debug!(path, body = %text, "Upstream request body");
            }
        }
        let request = self.client.request(Method::POST, self.url(path)).json(body);
        self.send(request, path, timeout).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
        timeout: Duration,
    ) -> UpstreamResult<T> {
        let request = self.add_auth(request).timeout(timeout);

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::from_transport(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_transport(e, timeout))?;

        if self.config.enable_logging {
            debug!(path, status = status.as_u16(), body = %text, "Upstream response");
        }

        if status.is_success() {
            Ok(serde_json::from_str(&text)?)
        } else {
            warn!(path, status = status.as_u16(), "Upstream returned an error status");
            Err(UpstreamError::from_response(status.as_u16(), &text))
        }
    }

    /// Add authentication to a request
    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::ApiKey(key) => request.header("X-API-Key", key.as_str()),
            AuthConfig::BearerToken(token) => {
                request.header(header::AUTHORIZATION, format!("Bearer {}", token))
            }
        }
    }
}
