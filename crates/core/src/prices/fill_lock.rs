//! Per-key fill locks.
//!
//! Concurrent misses for one cache key queue behind a single async mutex so
//! only the first caller goes upstream. Later callers re-read the cache once
//! they get the lock.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct FillLocks {
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FillLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive fill rights on `key`.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            // Drop locks nobody holds or waits on
            inflight.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(
                inflight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        debug!("Waiting for fill lock on {}", key);
        lock.lock_owned().await
    }

    /// Lock several keys. Keys are taken in sorted order so two batches
    /// sharing keys cannot deadlock.
    pub async fn acquire_many(&self, keys: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&String> = keys.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.acquire(key).await);
        }
        guards
    }

    /// Number of keys with a live lock.
    pub async fn tracked(&self) -> usize {
        self.inflight.lock().await.len()
    }
}
