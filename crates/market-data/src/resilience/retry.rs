//! Linear-backoff retry around a circuit breaker.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use super::circuit_breaker::{CircuitBreaker, CircuitOpenError};
use crate::errors::{RetryClass, Retryable};

/// Default number of attempts per request.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default unit of backoff delay.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Retry loop configuration.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_retries: u32,
    /// Delay unit; the wait after attempt `n` (0-based) is `(n + 1) * base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// A policy that performs a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::ZERO,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt + 1)
    }
}

/// Run `operation` through `breaker`, retrying transient failures.
///
/// Only errors classified [`RetryClass::WithBackoff`] are retried. An open
/// breaker ends the loop immediately. Dropping the returned future cancels
/// the pending attempt or backoff sleep.
pub async fn call_with_retry<T, E, F, Fut>(
    breaker: &CircuitBreaker,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<CircuitOpenError> + Retryable + Display,
{
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        let err = match breaker.call(&mut operation).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match err.retry_class() {
            RetryClass::WithBackoff if attempt + 1 < attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Attempt {}/{} against '{}' failed: {}; retrying in {:?}",
                    attempt + 1,
                    attempts,
                    breaker.name(),
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            RetryClass::CircuitOpen => {
                debug!("Not retrying '{}': circuit open", breaker.name());
                return Err(err);
            }
            _ => return Err(err),
        }
    }
}
