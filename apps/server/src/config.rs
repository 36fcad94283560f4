use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use pricecache_core::cache::{CacheTtl, RedisConfig};
use pricecache_core::constants::{DEFAULT_MAX_SYMBOLS_PER_REQUEST, DEFAULT_TTL};
use pricecache_market_data::{
    AlphaVantageConfig, CircuitBreakerConfig, FinnhubConfig, HolidayRules, ResilienceConfig,
    RetryPolicy,
};

use crate::rate_limiter::RateLimitConfig;

const DEFAULT_PORT: u16 = 8081;

/// Which store backs the price cache.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

impl FromStr for CacheBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown cache backend '{}' (expected redis or memory)", other),
        }
    }
}

pub struct Config {
    pub listen_addr: SocketAddr,
    /// Server key callers must present in `X-API-Key`. `None` admits loopback only.
    pub api_key: Option<String>,
    pub finnhub: FinnhubConfig,
    pub alpha_vantage: AlphaVantageConfig,
    pub cache_backend: CacheBackendKind,
    pub redis: RedisConfig,
    pub cache_ttl: CacheTtl,
    pub max_symbols_per_request: usize,
    pub rate_limit: RateLimitConfig,
    pub holiday_rules: HolidayRules,
    pub log_level: String,
}

impl Config {
    /// Read configuration from the process environment, loading `.env` first.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from a fixed set of variables.
    pub fn from_map(vars: &HashMap<String, String>) -> anyhow::Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let port: u16 = env.parse("PORT", DEFAULT_PORT)?;
        let listen_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

        let resilience = ResilienceConfig {
            breaker: CircuitBreakerConfig {
                max_failures: env.parse("CIRCUIT_MAX_FAILURES", 5)?,
                reset_timeout: Duration::from_secs(
                    env.parse("CIRCUIT_RESET_TIMEOUT_SECONDS", 60)?,
                ),
            },
            retry: RetryPolicy {
                max_retries: env.parse("UPSTREAM_MAX_RETRIES", 3)?,
                base_delay: Duration::from_millis(env.parse("UPSTREAM_RETRY_DELAY_MS", 1000)?),
            },
        };

        let mut finnhub = FinnhubConfig::new(env.string("FINNHUB_API_KEY").unwrap_or_default());
        if let Some(base_url) = env.string("FINNHUB_BASE_URL") {
            finnhub.base_url = base_url;
        }
        finnhub.resilience = resilience.clone();

        let mut alpha_vantage =
            AlphaVantageConfig::new(env.string("ALPHA_VANTAGE_API_KEY").unwrap_or_else(|| "demo".into()));
        if let Some(base_url) = env.string("ALPHA_VANTAGE_BASE_URL") {
            alpha_vantage.base_url = base_url;
        }
        alpha_vantage.use_fixtures = env.flag("ALPHA_VANTAGE_USE_FIXTURES", true)?;
        alpha_vantage.resilience = resilience;

        let redis = RedisConfig {
            host: env.string("REDIS_HOST").unwrap_or_else(|| "localhost".into()),
            port: env.parse("REDIS_PORT", 6379)?,
            password: env.string("REDIS_PASSWORD"),
            db: env.parse("REDIS_DB", 0)?,
        };

        let default_ttl_minutes: u64 = env.parse("DEFAULT_TTL_MINUTES", DEFAULT_TTL.as_secs() / 60)?;
        let historical_ttl_minutes: u64 = env.parse("HISTORICAL_TTL_MINUTES", default_ttl_minutes)?;
        if default_ttl_minutes == 0 || historical_ttl_minutes == 0 {
            bail!("cache TTLs must be at least one minute");
        }
        let cache_ttl = CacheTtl {
            current: minutes(default_ttl_minutes),
            historical: minutes(historical_ttl_minutes),
        };

        let max_symbols_per_request =
            env.parse("MAX_SYMBOLS_PER_REQUEST", DEFAULT_MAX_SYMBOLS_PER_REQUEST)?;
        if max_symbols_per_request == 0 {
            bail!("MAX_SYMBOLS_PER_REQUEST must be at least 1");
        }

        let window_minutes: u64 = env.parse("RATE_LIMIT_WINDOW_MINUTES", 1)?;
        if window_minutes == 0 {
            bail!("RATE_LIMIT_WINDOW_MINUTES must be at least 1");
        }
        let rate_limit = RateLimitConfig {
            requests: env.parse("RATE_LIMIT_REQUESTS", 100)?,
            window: minutes(window_minutes),
        };

        let holiday_rules = HolidayRules {
            good_friday: env.flag("CALENDAR_GOOD_FRIDAY", true)?,
            observe_weekend_holidays: env.flag("CALENDAR_OBSERVE_WEEKEND_HOLIDAYS", true)?,
        };

        Ok(Self {
            listen_addr,
            api_key: env.string("API_KEY"),
            finnhub,
            alpha_vantage,
            cache_backend: env.parse("CACHE_BACKEND", CacheBackendKind::Redis)?,
            redis,
            cache_ttl,
            max_symbols_per_request,
            rate_limit,
            holiday_rules,
            log_level: env.string("LOG_LEVEL").unwrap_or_else(|| "info".into()),
        })
    }
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-blank value of `key`, trimmed.
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        }
    }

    fn flag(&self, key: &str, default: bool) -> anyhow::Result<bool> {
        match self.string(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(default),
            Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => Ok(true),
            Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => Ok(false),
            Some(v) => bail!("Invalid {}: '{}' (expected true or false)", key, v),
        }
    }
}
