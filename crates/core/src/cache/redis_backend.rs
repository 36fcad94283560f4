//! Redis cache backend.
//!
//! Every command runs under a per-attempt timeout and is retried a bounded
//! number of times. A failed attempt drops the shared connection so the next
//! one reconnects.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};
use url::Url;

use super::CacheBackend;
use crate::errors::CacheError;

const RETRY_PAUSE: Duration = Duration::from_millis(25);

/// Where the Redis server lives.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            db: 0,
        }
    }
}

impl RedisConfig {
    /// `redis://` connection URL with the password percent-encoded.
    pub fn url(&self) -> Result<Url, CacheError> {
        let mut url = Url::parse(&format!("redis://{}:{}/{}", self.host, self.port, self.db))
            .map_err(|e| CacheError::Config(format!("invalid redis address: {}", e)))?;

        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|_| CacheError::Config("cannot attach redis password".to_string()))?;
        }

        Ok(url)
    }
}

/// Timeout and retry budget for Redis commands.
#[derive(Clone, Debug)]
pub struct RedisPolicy {
    pub timeout: Duration,
    pub retry_attempts: usize,
}

impl Default for RedisPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            retry_attempts: 2,
        }
    }
}

pub struct RedisBackend {
    client: redis::Client,
    policy: RedisPolicy,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisBackend {
    /// Create a backend. No connection is made until the first command.
    pub fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        Self::with_policy(config, RedisPolicy::default())
    }

    pub fn with_policy(config: &RedisConfig, policy: RedisPolicy) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url()?.as_str())?;
        info!(host = %config.host, port = config.port, db = config.db, "Redis cache configured");
        Ok(Self {
            client,
            policy,
            connection: Mutex::new(None),
        })
    }

    /// Round-trip a PING.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let _: String = self
            .with_retry("PING", |mut conn| async move {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;
        Ok(())
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = timeout(
            self.policy.timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| CacheError::Timeout(self.policy.timeout))??;

        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn forget_connection(&self) {
        self.connection.lock().await.take();
    }

    async fn with_retry<T, F, Fut>(&self, command: &'static str, mut op: F) -> Result<T, CacheError>
    where
        F: FnMut(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let attempts = self.policy.retry_attempts.max(1);
        let mut last = None;

        for attempt in 0..attempts {
            let failure = match self.connection().await {
                Ok(conn) => match timeout(self.policy.timeout, op(conn)).await {
                    Ok(Ok(value)) => return Ok(value),
                    Ok(Err(e)) => CacheError::Redis(e),
                    Err(_) => CacheError::Timeout(self.policy.timeout),
                },
                Err(e) => e,
            };

            debug!(command, attempt = attempt + 1, error = %failure, "Redis attempt failed");
            self.forget_connection().await;
            last = Some(failure);

            if attempt + 1 < attempts {
                tokio::time::sleep(RETRY_PAUSE).await;
            }
        }

        Err(last.unwrap_or(CacheError::Timeout(self.policy.timeout)))
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.with_retry("GET", |mut conn| async move {
            redis::cmd("GET").arg(key).query_async(&mut conn).await
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let seconds = ttl.as_secs().max(1);
        self.with_retry("SET", |mut conn| async move {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(seconds)
                .query_async(&mut conn)
                .await
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.with_retry("DEL", |mut conn| async move {
            redis::cmd("DEL").arg(keys).query_async(&mut conn).await
        })
        .await
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.with_retry("FLUSHDB", |mut conn| async move {
            redis::cmd("FLUSHDB").query_async(&mut conn).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_without_password() {
        let url = RedisConfig::default().url().unwrap();
        assert_eq!(url.as_str(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_url_encodes_password() {
        let config = RedisConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            password: Some("p@ss word".to_string()),
            db: 2,
        };
        let url = config.url().unwrap();
        assert_eq!(url.as_str(), "redis://:p%40ss%20word@cache.internal:6380/2");
    }

    #[test]
    fn test_empty_password_is_ignored() {
        let config = RedisConfig {
            password: Some(String::new()),
            ..RedisConfig::default()
        };
        assert_eq!(config.url().unwrap().as_str(), "redis://localhost:6379/0");
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_fast() {
        let config = RedisConfig {
            host: "127.0.0.1".to_string(),
            // Nothing listens on the discard port
            port: 9,
            ..RedisConfig::default()
        };
        let backend = RedisBackend::with_policy(
            &config,
            RedisPolicy {
                timeout: Duration::from_millis(500),
                retry_attempts: 1,
            },
        )
        .unwrap();

        assert!(backend.get("current:AAPL").await.is_err());
    }
}
