//! Cache backend trait.
//!
//! A backend is a plain string key/value store with per-key expiry. Typed
//! access, key layout and logging live in [`super::CacheStore`].

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CacheError;

/// Storage interface for the external cache.
///
/// # Semantics
///
/// - `get` returns `Ok(None)` for a missing or expired key; `Err` is reserved
///   for backend failures.
/// - `set_ex` overwrites any existing value and resets its expiry.
/// - `delete` ignores keys that do not exist and returns how many were removed.
/// - `flush` removes every key the backend owns.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError>;

    async fn flush(&self) -> Result<(), CacheError>;
}
