//! Cache store.
//!
//! - [`backend`] - The [`CacheBackend`] trait over a string key/value store
//! - [`redis_backend`] - Redis implementation, the production store
//! - [`memory`] - In-process implementation for single-instance runs and tests
//! - [`store`] - [`CacheStore`], typed JSON access under canonical keys

pub mod backend;
pub mod memory;
pub mod redis_backend;
pub mod store;

pub use backend::CacheBackend;
pub use memory::MemoryBackend;
pub use redis_backend::{RedisBackend, RedisConfig, RedisPolicy};
pub use store::{current_key, historical_key, symbol_keys, CacheStore, CacheTtl};
