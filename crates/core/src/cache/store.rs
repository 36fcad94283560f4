//! Typed JSON access to the cache under canonical keys.

use std::sync::Arc;
use std::time::Duration;

use pricecache_market_data::{CurrentPrice, HistoricalSeries, Resolution, Symbol};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::CacheBackend;
use crate::constants::{CURRENT_KEY_PREFIX, DEFAULT_TTL, HISTORICAL_KEY_PREFIX};
use crate::errors::CacheError;

/// `current:{SYMBOL}`
pub fn current_key(symbol: &Symbol) -> String {
    format!("{}:{}", CURRENT_KEY_PREFIX, symbol)
}

/// `historical:{SYMBOL}:{resolution}`
pub fn historical_key(symbol: &Symbol, resolution: Resolution) -> String {
    format!("{}:{}:{}", HISTORICAL_KEY_PREFIX, symbol, resolution)
}

/// Every key that can hold data for `symbol`.
pub fn symbol_keys(symbol: &Symbol) -> Vec<String> {
    std::iter::once(current_key(symbol))
        .chain(
            Resolution::SERVED
                .iter()
                .map(|resolution| historical_key(symbol, *resolution)),
        )
        .collect()
}

/// Write-back TTLs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CacheTtl {
    pub current: Duration,
    pub historical: Duration,
}

impl CacheTtl {
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            current: ttl,
            historical: ttl,
        }
    }
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self::uniform(DEFAULT_TTL)
    }
}

/// JSON cache over a [`CacheBackend`].
///
/// Every operation logs one structured line: hit, miss, set, delete, flush,
/// or the failure that replaced it.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    ttl: CacheTtl,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: CacheTtl) -> Self {
        Self { backend, ttl }
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Read and decode `key`. `Ok(None)` on a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return Ok(None);
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return Err(e);
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key, error = %e, "Cached payload is unreadable");
                Err(e.into())
            }
        }
    }

    /// Encode and store `value` under `key` for `ttl`.
    pub async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        match self.backend.set_ex(key, &payload, ttl).await {
            Ok(()) => {
                debug!(key, ttl_secs = ttl.as_secs(), "Cache set");
                Ok(())
            }
            Err(e) => {
                warn!(key, error = %e, "Cache write failed");
                Err(e)
            }
        }
    }

    pub async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        match self.backend.delete(keys).await {
            Ok(removed) => {
                info!(keys = ?keys, removed, "Cache delete");
                Ok(removed)
            }
            Err(e) => {
                warn!(keys = ?keys, error = %e, "Cache delete failed");
                Err(e)
            }
        }
    }

    pub async fn flush(&self) -> Result<(), CacheError> {
        match self.backend.flush().await {
            Ok(()) => {
                info!(backend = self.backend.name(), "Cache flushed");
                Ok(())
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Cache flush failed");
                Err(e)
            }
        }
    }

    pub async fn get_current(&self, symbol: &Symbol) -> Result<Option<CurrentPrice>, CacheError> {
        self.get(&current_key(symbol)).await
    }

    pub async fn set_current(&self, price: &CurrentPrice) -> Result<(), CacheError> {
        self.set(&current_key(&price.symbol), price, self.ttl.current)
            .await
    }

    pub async fn get_historical(
        &self,
        symbol: &Symbol,
        resolution: Resolution,
    ) -> Result<Option<HistoricalSeries>, CacheError> {
        self.get(&historical_key(symbol, resolution)).await
    }

    pub async fn set_historical(&self, series: &HistoricalSeries) -> Result<(), CacheError> {
        self.set(
            &historical_key(&series.symbol, series.resolution),
            series,
            self.ttl.historical,
        )
        .await
    }
}
