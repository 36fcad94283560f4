//! Pricecache Core - Cache store and price service.
//!
//! This crate sits between the HTTP surface and the upstream providers. It
//! owns the cache key layout, the cache backends, and the read paths that
//! decide when a cached value is good enough.

pub mod cache;
pub mod constants;
pub mod errors;
pub mod prices;

// Re-export common types
pub use cache::{CacheBackend, CacheStore, CacheTtl, MemoryBackend, RedisBackend, RedisConfig};
pub use prices::{HistoricalQuery, PriceService, PriceServiceConfig, PriceServiceTrait};

// Re-export error types
pub use errors::{CacheError, PriceServiceError, Result};
