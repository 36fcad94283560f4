//! Resilience primitives for outbound HTTP.
//!
//! Every outbound call is wrapped by a [`CircuitBreaker`] and then retried by
//! [`call_with_retry`] according to a [`RetryPolicy`].

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitOpenError, CircuitState};
pub use retry::{call_with_retry, RetryPolicy};

/// Breaker and retry settings for one outbound endpoint.
#[derive(Clone, Debug, Default)]
pub struct ResilienceConfig {
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryPolicy,
}
