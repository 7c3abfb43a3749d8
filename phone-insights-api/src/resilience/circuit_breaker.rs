//! Circuit breaker guarding calls to an external dependency.
//!
//! # States
//!
//! - **Closed**: normal operation, calls pass through
//! - **Open**: the dependency is considered down, calls fail immediately
//! - **HalfOpen**: the cool-down has elapsed and a single trial call is let through
//!
//! # Transitions
//!
//! ```text
//! Closed   -> Open      consecutive failures reach failure_threshold
//! Open     -> HalfOpen  cool_down elapsed since the last failure
//! HalfOpen -> Closed    the trial call succeeds
//! HalfOpen -> Open      the trial call fails (cool-down restarts)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use phone_insights_api::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let breaker = CircuitBreaker::new(
//!     "python-api",
//!     CircuitBreakerConfig {
//!         failure_threshold: 5,
//!         cool_down: Duration::from_secs(30),
//!     },
//! );
//!
//! match breaker.call(|| async { Ok::<_, std::io::Error>(42) }).await {
//!     Ok(value) => println!("Success: {}", value),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation, requests pass through
    Closed,
    /// Too many failures, requests are rejected
    Open,
    /// Cool-down elapsed, one trial request allowed
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening circuit
    pub failure_threshold: usize,
    /// Time to wait after the last failure before allowing a trial call
    pub cool_down: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
        }
    }
}

/// Circuit breaker errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open (or a trial call is already in flight), request rejected
    #[error("Circuit breaker is open for {name}")]
    Open { name: String },

    /// The wrapped call ran and failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(E),
}

/// Lifetime counters, updated without taking the state lock
#[derive(Debug, Default)]
struct CircuitBreakerMetrics {
    failures: AtomicU64,
    successes: AtomicU64,
    opened_count: AtomicU64,
    rejected_count: AtomicU64,
}

struct CircuitBreakerState {
    state: CircuitState,
    consecutive_failures: usize,
    last_failure_time: Option<Instant>,
    /// Set while the half-open trial call is running.
    trial_started: Option<Instant>,
}

impl CircuitBreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_time: None,
            trial_started: None,
        }
    }

    fn trip(&mut self) {
        self.state = CircuitState::Open;
        self.trial_started = None;
    }
}

/// Circuit breaker for one external dependency.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<CircuitBreakerState>,
    metrics: CircuitBreakerMetrics,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            breaker = %name,
            failure_threshold = config.failure_threshold,
            cool_down_secs = config.cool_down.as_secs_f64(),
            "Creating circuit breaker"
        );

        Self {
            name,
            config,
            state: Mutex::new(CircuitBreakerState::new()),
            metrics: CircuitBreakerMetrics::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. An open breaker whose cool-down has elapsed still
    /// reports `Open` until a call arrives to test it.
    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.state
    }

    /// Snapshot for health reporting.
    pub async fn stats(&self) -> CircuitBreakerStats {
        let state = self.state.lock().await;
        CircuitBreakerStats {
            name: self.name.clone(),
            state: state.state,
            failures: state.consecutive_failures,
            total_failures: self.metrics.failures.load(Ordering::Relaxed),
            total_successes: self.metrics.successes.load(Ordering::Relaxed),
            opened_count: self.metrics.opened_count.load(Ordering::Relaxed),
            rejected_count: self.metrics.rejected_count.load(Ordering::Relaxed),
        }
    }

    /// Run `f` under breaker protection; every `Err` counts as a failure.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call_with(f, |_| true).await
    }

    /// Run `f` under breaker protection. Errors for which `is_failure`
    /// returns false are passed through but recorded as a healthy response.
    pub async fn call_with<F, Fut, T, E, P>(
        &self,
        f: F,
        is_failure: P,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(&E) -> bool,
    {
        self.before_call().await?;

        match f().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(e) => {
                if is_failure(&e) {
                    self.on_failure().await;
                } else {
                    self.on_success().await;
                }
                Err(CircuitBreakerError::ExecutionFailed(e))
            }
        }
    }

    async fn before_call<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        let mut state = self.state.lock().await;

        match state.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let cooled_down = state
                    .last_failure_time
                    .map(|at| at.elapsed() >= self.config.cool_down)
                    .unwrap_or(true);

                if cooled_down {
                    info!(breaker = %self.name, "Circuit breaker half-open, sending trial call");
                    state.state = CircuitState::HalfOpen;
                    state.trial_started = Some(Instant::now());
                    Ok(())
                } else {
                    self.reject()
                }
            }
            CircuitState::HalfOpen => {
                // A trial call abandoned by a cancelled caller would otherwise
                // hold the breaker half-open forever.
                let trial_stale = state
                    .trial_started
                    .map(|at| at.elapsed() >= self.config.cool_down)
                    .unwrap_or(true);

                if trial_stale {
                    debug!(breaker = %self.name, "Replacing stale half-open trial call");
                    state.trial_started = Some(Instant::now());
                    Ok(())
                } else {
                    self.reject()
                }
            }
        }
    }

    fn reject<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        self.metrics.rejected_count.fetch_add(1, Ordering::Relaxed);
        Err(CircuitBreakerError::Open {
            name: self.name.clone(),
        })
    }

    async fn on_success(&self) {
        let mut state = self.state.lock().await;
        self.metrics.successes.fetch_add(1, Ordering::Relaxed);
        state.consecutive_failures = 0;

        if state.state == CircuitState::HalfOpen {
            info!(breaker = %self.name, "Trial call succeeded, closing circuit breaker");
            state.state = CircuitState::Closed;
            state.trial_started = None;
            state.last_failure_time = None;
        }
    }

    async fn on_failure(&self) {
        let mut state = self.state.lock().await;
        self.metrics.failures.fetch_add(1, Ordering::Relaxed);

        state.consecutive_failures += 1;
        state.last_failure_time = Some(Instant::now());

        match state.state {
            CircuitState::Closed => {
                if state.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        breaker = %self.name,
                        failures = state.consecutive_failures,
                        "Circuit breaker opening"
                    );
                    state.trip();
                    self.metrics.opened_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "Trial call failed, re-opening circuit breaker");
                state.trip();
                self.metrics.opened_count.fetch_add(1, Ordering::Relaxed);
            }
            CircuitState::Open => {}
        }
    }

    /// Force the breaker closed and forget past failures.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        info!(breaker = %self.name, "Manually resetting circuit breaker");
        *state = CircuitBreakerState::new();
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    /// Consecutive failures since the last success.
    pub failures: usize,
    pub total_failures: u64,
    pub total_successes: u64,
    pub opened_count: u64,
    pub rejected_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio::time::sleep;

    fn breaker(threshold: usize, cool_down: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                failure_threshold: threshold,
                cool_down,
            },
        )
    }

    async fn fail(breaker: &CircuitBreaker) {
        let _ = breaker.call(|| async { Err::<(), _>("error") }).await;
    }

    #[tokio::test]
    async fn test_circuit_breaker_starts_closed() {
        let breaker = CircuitBreaker::new("test", CircuitBreakerConfig::default());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_successful_calls_keep_circuit_closed() {
        let breaker = breaker(3, Duration::from_secs(10));

        for _ in 0..10 {
            let result = breaker.call(|| async { Ok::<_, ()>(42) }).await;
            assert!(result.is_ok());
        }

        let stats = breaker.stats().await;
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.total_successes, 10);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let breaker = breaker(3, Duration::from_secs(10));

        fail(&breaker).await;
        fail(&breaker).await;
        let _ = breaker.call(|| async { Ok::<_, ()>(1) }).await;
        fail(&breaker).await;
        fail(&breaker).await;

        let stats = breaker.stats().await;
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.failures, 2);
    }

    #[tokio::test]
    async fn test_circuit_opens_after_threshold_failures() {
        let breaker = breaker(3, Duration::from_secs(10));

        for _ in 0..3 {
            let result = breaker.call(|| async { Err::<(), _>("error") }).await;
            assert!(matches!(result, Err(CircuitBreakerError::ExecutionFailed(_))));
        }

        let stats = breaker.stats().await;
        assert_eq!(stats.state, CircuitState::Open);
        assert_eq!(stats.failures, 3);
        assert_eq!(stats.opened_count, 1);
    }

    #[tokio::test]
    async fn test_open_circuit_does_not_invoke_call() {
        let breaker = breaker(2, Duration::from_secs(10));
        fail(&breaker).await;
        fail(&breaker).await;

        let invoked = AtomicUsize::new(0);
        let result = breaker
            .call(|| async {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(42)
            })
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::Open { .. })));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        assert_eq!(breaker.stats().await.rejected_count, 1);
    }

    #[tokio::test]
    async fn test_trial_call_success_closes_circuit() {
        let breaker = breaker(2, Duration::from_millis(100));
        fail(&breaker).await;
        fail(&breaker).await;

        sleep(Duration::from_millis(150)).await;

        let result = breaker.call(|| async { Ok::<_, ()>(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert_eq!(breaker.stats().await.failures, 0);
    }

    #[tokio::test]
    async fn test_trial_call_failure_reopens_and_restarts_cool_down() {
        let breaker = breaker(2, Duration::from_millis(100));
        fail(&breaker).await;
        fail(&breaker).await;

        sleep(Duration::from_millis(150)).await;
        fail(&breaker).await;

        assert_eq!(breaker.state().await, CircuitState::Open);
        assert_eq!(breaker.stats().await.opened_count, 2);

        // Cool-down restarted by the failed trial call.
        let result = breaker.call(|| async { Ok::<_, ()>(1) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open { .. })));
    }

    #[tokio::test]
    async fn test_half_open_admits_a_single_trial_call() {
        let breaker = Arc::new(breaker(1, Duration::from_millis(100)));
        fail(&breaker).await;
        sleep(Duration::from_millis(150)).await;

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let trial_breaker = breaker.clone();
        let trial = tokio::spawn(async move {
            trial_breaker
                .call(|| async move {
                    let _ = release_rx.await;
                    Ok::<_, ()>(1)
                })
                .await
        });

        // Let the trial call enter the breaker.
        sleep(Duration::from_millis(20)).await;
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        let second = breaker.call(|| async { Ok::<_, ()>(2) }).await;
        assert!(matches!(second, Err(CircuitBreakerError::Open { .. })));

        release_tx.send(()).unwrap();
        assert!(trial.await.unwrap().is_ok());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_non_failure_errors_do_not_trip() {
        let breaker = breaker(1, Duration::from_secs(10));

        let result = breaker
            .call_with(|| async { Err::<(), _>("bad payload") }, |_| false)
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::ExecutionFailed(_))));
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_manual_reset() {
        let breaker = breaker(1, Duration::from_secs(10));
        fail(&breaker).await;
        assert_eq!(breaker.state().await, CircuitState::Open);

        breaker.reset().await;

        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert!(breaker.call(|| async { Ok::<_, ()>(42) }).await.is_ok());
    }
}
