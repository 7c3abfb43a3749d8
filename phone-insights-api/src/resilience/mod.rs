//! Resilience patterns for calls to the prediction service.
//!
//! - **Circuit Breaker**: stops hammering an upstream that keeps failing
//! - **Timeout**: bounds how long a single call may take
//!
//! # Example
//!
//! ```no_run
//! use phone_insights_api::resilience::{
//!     circuit_breaker::{CircuitBreaker, CircuitBreakerConfig},
//!     timeout::with_timeout,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new("python-api", CircuitBreakerConfig::default());
//!
//! let result = breaker.call(|| async {
//!     with_timeout(Duration::from_secs(5), async { Ok::<_, std::io::Error>(42) }).await
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod timeout;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState,
};
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
