//! Finnhub market data provider implementation.
//!
//! Quote-style upstream: current prices via the /quote endpoint, one request
//! per symbol. Finnhub has no batch quote endpoint, so a batch is fetched
//! sequentially and per-symbol failures are skipped.
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{ErrorKind, MarketDataError};
use crate::models::{CurrentPrice, Symbol};
use crate::provider::http::UpstreamClient;
use crate::provider::PriceProvider;
use crate::resilience::{CircuitBreaker, ResilienceConfig};

pub const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

/// Finnhub quotes are for U.S. listings and carry no currency field.
const QUOTE_CURRENCY: &str = "USD";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Previous close price
    pc: Option<f64>,
    /// Timestamp (Unix)
    t: Option<i64>,
    // Note: d, dp, h, l, o exist but change is derived from c and pc
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Connection settings for [`FinnhubProvider`].
#[derive(Clone, Debug)]
pub struct FinnhubConfig {
    pub api_key: String,
    pub base_url: String,
    pub resilience: ResilienceConfig,
}

impl FinnhubConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            resilience: ResilienceConfig::default(),
        }
    }
}

/// Finnhub quote provider.
pub struct FinnhubProvider {
    http: UpstreamClient,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    pub fn new(config: FinnhubConfig) -> Self {
        Self {
            http: UpstreamClient::new(PROVIDER_ID, &config.resilience),
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Breaker guarding the Finnhub endpoint.
    pub fn breaker(&self) -> &CircuitBreaker {
        self.http.breaker()
    }

    fn quote_url(&self, symbol: &Symbol) -> Result<Url, MarketDataError> {
        Url::parse_with_params(
            &format!("{}/quote", self.base_url),
            &[("symbol", symbol.as_str())],
        )
        .map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to build URL: {}", e),
        })
    }

    /// Fetch the latest quote for one symbol.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<CurrentPrice, MarketDataError> {
        let url = self.quote_url(symbol)?;
        let text = self
            .http
            .get_text(&url, &[("X-Finnhub-Token", &self.api_key)], &self.api_key)
            .await?;
        Self::parse_quote(symbol, &text, Utc::now())
    }

    /// Parse a /quote payload.
    fn parse_quote(
        symbol: &Symbol,
        text: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<CurrentPrice, MarketDataError> {
        let response: QuoteResponse =
            serde_json::from_str(text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse quote response: {}", e),
            })?;

        let current = response.c.unwrap_or(0.0);
        let timestamp = response.t.unwrap_or(0);

        // Finnhub returns zeros for unknown symbols instead of an error
        if current == 0.0 && timestamp == 0 {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }

        let current = Decimal::try_from(current).map_err(|_| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Invalid current price for {}: {}", symbol, current),
        })?;
        let previous_close = response
            .pc
            .and_then(|v| Decimal::try_from(v).ok())
            .unwrap_or(Decimal::ZERO);

        Ok(CurrentPrice::new(
            symbol.clone(),
            current,
            previous_close,
            QUOTE_CURRENCY,
            fetched_at,
        ))
    }
}

/// Keep the most informative failure: anything beats "not found".
fn keep_worst(previous: Option<MarketDataError>, next: MarketDataError) -> Option<MarketDataError> {
    match previous {
        Some(prev) if prev.kind() != ErrorKind::SymbolNotFound => Some(prev),
        _ => Some(next),
    }
}

#[async_trait]
impl PriceProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_current_prices(
        &self,
        symbols: &[Symbol],
    ) -> Result<Vec<CurrentPrice>, MarketDataError> {
        let mut prices = Vec::with_capacity(symbols.len());
        let mut failure = None;

        for symbol in symbols {
            match self.fetch_quote(symbol).await {
                Ok(price) => {
                    debug!(symbol = %symbol, price = %price.current_price, "Fetched quote");
                    prices.push(price);
                }
                Err(e) if e.is_circuit_open() => {
                    warn!(symbol = %symbol, "Circuit open, abandoning remaining symbols");
                    failure = keep_worst(failure, e);
                    break;
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Skipping symbol");
                    failure = keep_worst(failure, e);
                }
            }
        }

        match failure {
            Some(err) if prices.is_empty() => Err(err),
            _ => Ok(prices),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
