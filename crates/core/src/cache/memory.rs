//! In-process cache backend.
//!
//! Used for single-instance deployments (`CACHE_BACKEND=memory`) and tests.
//! Expired entries are dropped lazily on access.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::CacheBackend;
use crate::errors::CacheError;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Map-backed cache with per-key expiry.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it unless a writer refreshed it in the meantime
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let removed = keys.iter().filter(|k| entries.remove(*k).is_some()).count();
        Ok(removed as u64)
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let backend = MemoryBackend::new();
        backend
            .set_ex("current:AAPL", "{}", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            backend.get("current:AAPL").await.unwrap().as_deref(),
            Some("{}")
        );
        assert_eq!(backend.get("current:MSFT").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let backend = MemoryBackend::new();
        backend
            .set_ex("current:AAPL", "{}", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.get("current:AAPL").await.unwrap(), None);
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_and_flush() {
        let backend = MemoryBackend::new();
        let ttl = Duration::from_secs(60);
        backend.set_ex("a", "1", ttl).await.unwrap();
        backend.set_ex("b", "2", ttl).await.unwrap();
        backend.set_ex("c", "3", ttl).await.unwrap();

        let removed = backend
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(backend.len().await, 2);

        backend.flush().await.unwrap();
        backend.flush().await.unwrap();
        assert!(backend.is_empty().await);
    }
}
