//! Core error types for the price service.
//!
//! Cache failures are kept apart from service failures: the price service
//! swallows most [`CacheError`]s (a failed read is a miss, a failed write is
//! logged) and only surfaces them for explicit invalidation.

use pricecache_market_data::{ErrorKind, MarketDataError};
use thiserror::Error;

/// Type alias for Result using the price service error.
pub type Result<T> = std::result::Result<T, PriceServiceError>;

/// Errors raised by the cache store and its backends.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid cache configuration: {0}")]
    Config(String),
}

impl CacheError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ServiceUnavailable
    }
}

/// Errors surfaced by the price service.
#[derive(Error, Debug)]
pub enum PriceServiceError {
    /// Request parameters failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// The upstream provider failed after retries.
    #[error(transparent)]
    Provider(#[from] MarketDataError),

    /// The cache store failed on an operation that cannot degrade.
    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),
}

impl PriceServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Maps this error onto the boundary taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            // Our upstream credentials being rejected is an outage, not a
            // caller authentication failure
            Self::Provider(e) if e.kind() == ErrorKind::Unauthorized => {
                ErrorKind::ServiceUnavailable
            }
            Self::Provider(e) => e.kind(),
            Self::Cache(e) => e.kind(),
        }
    }
}
