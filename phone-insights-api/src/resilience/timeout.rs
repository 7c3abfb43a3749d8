//! Timeout utilities for upstream calls.
//!
//! # Example
//!
//! ```no_run
//! use phone_insights_api::resilience::timeout::{with_timeout, TimeoutConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TimeoutConfig::new(Duration::from_secs(10))
//!     .with_operation("health", Duration::from_secs(3));
//!
//! let result = with_timeout(
//!     config.get_timeout("predict"),
//!     async { Ok::<_, std::io::Error>(42) }
//! ).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Timeout configuration
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Default timeout for all operations
    pub default: Duration,
    /// Operation-specific timeouts
    pub operation_specific: HashMap<String, Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(10)).with_operation("health", Duration::from_secs(3))
    }
}

impl TimeoutConfig {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            operation_specific: HashMap::new(),
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>, timeout: Duration) -> Self {
        self.operation_specific.insert(operation.into(), timeout);
        self
    }

    /// Get timeout for a specific operation
    pub fn get_timeout(&self, operation: &str) -> Duration {
        self.operation_specific
            .get(operation)
            .copied()
            .unwrap_or(self.default)
    }
}

/// Timeout errors
#[derive(Debug, Clone, Error)]
pub enum TimeoutError<E> {
    #[error("Operation timed out after {elapsed:?}")]
    Elapsed { elapsed: Duration },

    /// The operation finished in time but failed
    #[error("Operation failed: {0}")]
    Inner(E),
}

/// Apply a timeout to an async operation, keeping the inner error intact.
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Elapsed { elapsed: duration }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn test_default_config_has_short_health_timeout() {
        let config = TimeoutConfig::default();
        assert_eq!(config.get_timeout("predict"), Duration::from_secs(10));
        assert_eq!(config.get_timeout("health"), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, String>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_elapsed() {
        let result = with_timeout(Duration::from_millis(20), async {
            sleep(Duration::from_millis(200)).await;
            Ok::<_, String>(42)
        })
        .await;

        assert!(matches!(result, Err(TimeoutError::Elapsed { .. })));
    }

    #[tokio::test]
    async fn test_with_timeout_keeps_inner_error() {
        let result =
            with_timeout(Duration::from_secs(1), async { Err::<(), _>("boom".to_string()) }).await;

        match result {
            Err(TimeoutError::Inner(e)) => assert_eq!(e, "boom"),
            other => panic!("expected inner error, got {:?}", other),
        }
    }
}
