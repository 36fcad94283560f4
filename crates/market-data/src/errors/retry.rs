/// Classification for retry policy.
///
/// Used by the retry loop in [`crate::resilience`] to decide whether a failed
/// outbound call should be attempted again.
///
/// # Behavior Summary
///
/// | Class | Retry? | Notes |
/// |-------|--------|-------|
/// | `Never` | No | bad symbol, bad input, bad credentials |
/// | `WithBackoff` | Yes | transient upstream failure, linear backoff |
/// | `CircuitOpen` | No | breaker is short-circuiting, stop immediately |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, validation error, or terminal failure.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Retry after a delay proportional to the attempt number.
    ///
    /// Used for transient errors like rate limiting (429), timeouts or 5xx
    /// responses. Each failure is also recorded by the circuit breaker.
    WithBackoff,

    /// Circuit breaker is open for this endpoint.
    /// Retrying inside the same request would only hit the open breaker again.
    CircuitOpen,
}

/// Errors that can tell the retry loop how to treat them.
pub trait Retryable {
    /// Returns the retry classification for this error.
    fn retry_class(&self) -> RetryClass;
}
