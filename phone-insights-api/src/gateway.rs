//! Single choke point between the route handlers and the prediction service.
//!
//! Every outbound call goes through the same pipeline:
//!
//! ```text
//! cache lookup ──hit──> return (cached = true)
//!      │ miss
//!      ▼
//! circuit breaker ──open──> CircuitOpen
//!      │
//!      ▼
//! timeout(upstream call) ──> decode ──> cache write ──> return
//! ```
//!
//! Only responses that decode cleanly are cached. Health checks are never
//! cached but still count towards the breaker.

mod error;
mod types;

pub use error::{GatewayError, GatewayResult};
pub use types::{CallOptions, GatewayConfig, GatewayResponse, ResponseMetadata};

use phone_insights_client::{PredictionServiceClient, UpstreamError, UpstreamHealth};
use phone_insights_core::{PhoneSearchResults, PredictionInput, PredictionOutput, SearchQuery, TaskType};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::observability::GatewayMetrics;
use crate::performance::{CacheKey, CacheService, CacheStatistics};
use crate::resilience::{with_timeout, CircuitBreaker, CircuitBreakerStats};

pub struct PredictionGateway {
    client: PredictionServiceClient,
    cache: Arc<dyn CacheService<CacheKey, Value>>,
    breaker: Arc<CircuitBreaker>,
    config: GatewayConfig,
}

impl std::fmt::Debug for PredictionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionGateway")
            .field("breaker", &self.breaker)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PredictionGateway {
    pub fn new(
        client: PredictionServiceClient,
        cache: Arc<dyn CacheService<CacheKey, Value>>,
        breaker: Arc<CircuitBreaker>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            client,
            cache,
            breaker,
            config,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub async fn breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats().await
    }

    pub async fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics().await
    }

    /// Forced invalidation of every cached response.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        debug!("Gateway cache cleared");
    }

    pub async fn predict_price(
        &self,
        input: &PredictionInput,
        options: CallOptions,
    ) -> GatewayResult<GatewayResponse<PredictionOutput>> {
        self.predict(TaskType::Price, input, options).await
    }

    pub async fn predict_ram(
        &self,
        input: &PredictionInput,
        options: CallOptions,
    ) -> GatewayResult<GatewayResponse<PredictionOutput>> {
        self.predict(TaskType::Ram, input, options).await
    }

    pub async fn predict_battery(
        &self,
        input: &PredictionInput,
        options: CallOptions,
    ) -> GatewayResult<GatewayResponse<PredictionOutput>> {
        self.predict(TaskType::Battery, input, options).await
    }

    pub async fn predict_brand(
        &self,
        input: &PredictionInput,
        options: CallOptions,
    ) -> GatewayResult<GatewayResponse<PredictionOutput>> {
        self.predict(TaskType::Brand, input, options).await
    }

    /// Runs any prediction task. The cache key is the task plus the
    /// fingerprint of the normalised input.
    #[instrument(skip_all, fields(task = %task))]
    pub async fn predict(
        &self,
        task: TaskType,
        input: &PredictionInput,
        options: CallOptions,
    ) -> GatewayResult<GatewayResponse<PredictionOutput>> {
        let key = CacheKey::prediction(task, input.fingerprint());
        let payload = input.to_upstream_payload();
        let timeout = self.config.timeouts.get_timeout("predict");

        self.fetch(
            task.as_str(),
            key,
            options,
            || async move {
                with_timeout(timeout, self.client.predictions().predict(task, &payload))
                    .await
                    .map_err(UpstreamError::from)
            },
            |body| PredictionOutput::from_upstream(task, body),
        )
        .await
    }

    #[instrument(skip_all, fields(q = %query.q))]
    pub async fn search_phones(
        &self,
        query: &SearchQuery,
        options: CallOptions,
    ) -> GatewayResult<GatewayResponse<PhoneSearchResults>> {
        let key = CacheKey::Search(query.cache_identity());
        let timeout = self.config.timeouts.get_timeout("search");

        self.fetch(
            "search",
            key,
            options,
            || async move {
                with_timeout(timeout, self.client.phones().search(query))
                    .await
                    .map_err(UpstreamError::from)
            },
            PhoneSearchResults::from_upstream,
        )
        .await
    }

    /// Checks the upstream `/health`. Never cached.
    #[instrument(skip(self))]
    pub async fn health(&self) -> GatewayResult<GatewayResponse<UpstreamHealth>> {
        let start = Instant::now();
        let timeout = self.config.timeouts.get_timeout("health");

        let result = self
            .breaker
            .call_with(
                || async move {
                    with_timeout(timeout, self.client.system().health())
                        .await
                        .map_err(UpstreamError::from)
                },
                UpstreamError::counts_as_failure,
            )
            .await
            .map_err(GatewayError::from);

        self.finish("health", start, result)
    }

    /// Shared cache / breaker / timeout pipeline.
    async fn fetch<T, F, Fut, D>(
        &self,
        endpoint: &'static str,
        key: CacheKey,
        options: CallOptions,
        call: F,
        decode: D,
    ) -> GatewayResult<GatewayResponse<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, UpstreamError>>,
        D: Fn(&Value) -> phone_insights_core::Result<T>,
    {
        let start = Instant::now();

        if options.use_cache {
            if let Some(hit) = self.cache.get(&key).await {
                match decode(&hit) {
                    Ok(data) => {
                        GatewayMetrics::cache_hit(endpoint);
                        let response_time_ms = start.elapsed().as_millis() as u64;
                        GatewayMetrics::record_call(endpoint, "cache_hit", start.elapsed());
                        debug!(%key, response_time_ms, "Cache hit");
                        return Ok(GatewayResponse {
                            data,
                            metadata: ResponseMetadata {
                                cached: true,
                                response_time_ms,
                            },
                        });
                    }
                    Err(e) => {
                        warn!(%key, error = %e, "Dropping undecodable cache entry");
                        self.cache.remove(&key).await;
                    }
                }
            }
            GatewayMetrics::cache_miss(endpoint);
        }

        let result = async {
            let body = self
                .breaker
                .call_with(call, UpstreamError::counts_as_failure)
                .await?;
            let data = decode(&body)?;

            if options.use_cache {
                let ttl = options.cache_ttl.unwrap_or(self.config.default_ttl);
                self.cache.insert_with_ttl(key, body, ttl).await;
            }
            Ok::<_, GatewayError>(data)
        }
        .await;

        self.finish(endpoint, start, result)
    }

    fn finish<T>(
        &self,
        endpoint: &'static str,
        start: Instant,
        result: GatewayResult<T>,
    ) -> GatewayResult<GatewayResponse<T>> {
        let elapsed = start.elapsed();

        match result {
            Ok(data) => {
                GatewayMetrics::record_call(endpoint, "success", elapsed);
                Ok(GatewayResponse {
                    data,
                    metadata: ResponseMetadata {
                        cached: false,
                        response_time_ms: elapsed.as_millis() as u64,
                    },
                })
            }
            Err(e) => {
                if matches!(e, GatewayError::CircuitOpen { .. }) {
                    GatewayMetrics::circuit_rejected(endpoint);
                }
                GatewayMetrics::record_call(endpoint, e.kind(), elapsed);
                warn!(endpoint, kind = e.kind(), error = %e, "Gateway call failed");
                Err(e)
            }
        }
    }
}
