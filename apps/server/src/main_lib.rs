use std::sync::Arc;

use anyhow::Context;
use pricecache_core::{
    CacheBackend, CacheStore, MemoryBackend, PriceService, PriceServiceConfig, PriceServiceTrait,
    RedisBackend,
};
use pricecache_market_data::{
    AlphaVantageProvider, FinnhubProvider, MarketCalendar, PriceProvider, ProviderMap,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{CacheBackendKind, Config};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};

pub const SERVICE_NAME: &str = "price-service";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
    pub price_service: Arc<dyn PriceServiceTrait>,
    /// Key non-loopback callers must present. `None` admits loopback only.
    pub api_key: Option<String>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        price_service: Arc<dyn PriceServiceTrait>,
        api_key: Option<String>,
        rate_limit: RateLimitConfig,
    ) -> Self {
        Self {
            price_service,
            api_key,
            rate_limiter: Arc::new(RateLimiter::new(rate_limit)),
        }
    }
}

/// Install the JSON subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_current_span(false))
        .init();
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let backend: Arc<dyn CacheBackend> = match config.cache_backend {
        CacheBackendKind::Memory => Arc::new(MemoryBackend::new()),
        CacheBackendKind::Redis => {
            let redis =
                RedisBackend::new(&config.redis).context("Failed to configure Redis cache")?;
            // Reads degrade to upstream while Redis is down, so start anyway
            if let Err(e) = redis.ping().await {
                tracing::warn!(error = %e, "Redis is not reachable; serving from upstream until it is");
            }
            Arc::new(redis)
        }
    };
    let cache = CacheStore::new(backend, config.cache_ttl);
    tracing::info!(
        backend = cache.backend_name(),
        current_ttl = ?config.cache_ttl.current,
        historical_ttl = ?config.cache_ttl.historical,
        "Cache store ready"
    );

    if config.finnhub.api_key.is_empty() {
        tracing::warn!("FINNHUB_API_KEY is not set; current-price misses will fail upstream");
    }
    if config.api_key.is_none() {
        tracing::warn!("API_KEY is not set; only loopback callers will be admitted");
    }

    let quotes: Arc<dyn PriceProvider> = Arc::new(FinnhubProvider::new(config.finnhub.clone()));
    let series: Arc<dyn PriceProvider> =
        Arc::new(AlphaVantageProvider::new(config.alpha_vantage.clone()));
    let providers = Arc::new(ProviderMap::new(quotes, series));

    let price_service = PriceService::new(
        cache,
        providers,
        MarketCalendar::new(config.holiday_rules),
        PriceServiceConfig {
            max_symbols_per_request: config.max_symbols_per_request,
        },
    );

    Ok(Arc::new(AppState::new(
        Arc::new(price_service),
        config.api_key.clone(),
        config.rate_limit.clone(),
    )))
}
