//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`ErrorKind`]: The closed taxonomy every boundary failure maps onto
//! - [`MarketDataError`]: The main error enum for all upstream operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::{RetryClass, Retryable};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::CircuitOpenError;

/// Closed set of failure kinds exposed to callers of the price service.
///
/// Every upstream or boundary failure maps to exactly one of these. The
/// serialized form is the `code` field of the error envelope.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    SymbolNotFound,
    MarketClosed,
    RateLimitExceeded,
    ServiceUnavailable,
    InvalidInput,
    Unauthorized,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SymbolNotFound => "SYMBOL_NOT_FOUND",
            Self::MarketClosed => "MARKET_CLOSED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::InvalidInput => "INVALID_INPUT",
            Self::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during market data operations.
///
/// Each variant maps onto one [`ErrorKind`] via [`kind`](Self::kind) and is
/// classified into a [`RetryClass`] via [`retry_class`](Retryable::retry_class).
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    /// This is a terminal error - retrying won't help.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The request parameters were rejected, locally or by the provider.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider rate limited the request (HTTP 429 or a throttling envelope).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider rejected our credentials.
    #[error("Unauthorized: {provider}")]
    Unauthorized {
        /// The provider that rejected the API key
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred (non-2xx, unreadable payload, ...).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The circuit breaker guarding this provider is open.
    #[error("Circuit breaker is open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
    },

    /// The provider does not implement the requested operation.
    #[error("{operation} is not supported by {provider}")]
    NotSupported {
        operation: String,
        provider: String,
    },
}

impl MarketDataError {
    /// Maps this error onto the boundary taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SymbolNotFound(_) => ErrorKind::SymbolNotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::RateLimited { .. } => ErrorKind::RateLimitExceeded,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Timeout { .. }
            | Self::ProviderError { .. }
            | Self::CircuitOpen { .. }
            | Self::NotSupported { .. } => ErrorKind::ServiceUnavailable,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}

impl Retryable for MarketDataError {
    fn retry_class(&self) -> RetryClass {
        match self {
            // Terminal errors - never retry
            Self::SymbolNotFound(_)
            | Self::InvalidInput(_)
            | Self::Unauthorized { .. }
            | Self::NotSupported { .. } => RetryClass::Never,

            // Transient errors - retry with backoff
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::ProviderError { .. } => {
                RetryClass::WithBackoff
            }

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,
        }
    }
}

impl From<CircuitOpenError> for MarketDataError {
    fn from(err: CircuitOpenError) -> Self {
        Self::CircuitOpen { provider: err.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_never_retries() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
        assert_eq!(error.kind(), ErrorKind::SymbolNotFound);
    }

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = MarketDataError::RateLimited {
            provider: "FINNHUB".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
        assert_eq!(error.kind(), ErrorKind::RateLimitExceeded);
    }

    #[test]
    fn test_timeout_is_service_unavailable() {
        let error = MarketDataError::Timeout {
            provider: "ALPHA_VANTAGE".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_unauthorized_never_retries() {
        let error = MarketDataError::Unauthorized {
            provider: "FINNHUB".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::Never);
        assert_eq!(error.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_circuit_open_from_breaker_error() {
        let error: MarketDataError = CircuitOpenError {
            name: "FINNHUB".to_string(),
        }
        .into();
        assert!(error.is_circuit_open());
        assert_eq!(error.retry_class(), RetryClass::CircuitOpen);
        assert_eq!(error.kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_error_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::RateLimitExceeded).unwrap();
        assert_eq!(json, "\"RATE_LIMIT_EXCEEDED\"");
        assert_eq!(ErrorKind::InvalidInput.to_string(), "INVALID_INPUT");
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::ProviderError {
            provider: "ALPHA_VANTAGE".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Provider error: ALPHA_VANTAGE - HTTP 500"
        );
    }
}
