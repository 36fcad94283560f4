//! Pricecache Client
//!
//! Async HTTP client for services that consume the price service. Mirrors the
//! service operations (current prices, historical series, cache invalidation)
//! and wraps every call in the same breaker and retry primitives the service
//! uses toward its own upstreams.

mod client;
mod errors;

pub use client::{ClientConfig, HealthStatus, PriceServiceClient, HEALTH_FRESHNESS};
pub use errors::{ClientError, Result};
