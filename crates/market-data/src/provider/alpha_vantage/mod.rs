//! Alpha Vantage market data provider implementation.
//!
//! Series-style upstream: historical closes via the TIME_SERIES_DAILY,
//! TIME_SERIES_WEEKLY and TIME_SERIES_MONTHLY functions.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute and
//! reports quota exhaustion inside a 200 response, not as an HTTP status.

mod fixtures;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::errors::MarketDataError;
use crate::models::{ClosePrice, HistoricalSeries, Resolution, Symbol, DATE_FORMAT};
use crate::provider::http::UpstreamClient;
use crate::provider::PriceProvider;
use crate::resilience::{CircuitBreaker, ResilienceConfig};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// TIME_SERIES_* response. Each function names its series key differently.
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(
        rename = "Time Series (Daily)",
        alias = "Weekly Time Series",
        alias = "Monthly Time Series"
    )]
    time_series: Option<HashMap<String, SeriesBar>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// The two fields Alpha Vantage uses to report throttling.
#[derive(Debug, Deserialize)]
struct ThrottleEnvelope {
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeriesBar {
    #[serde(rename = "4. close")]
    close: String,
}

// ============================================================================
// AlphaVantageProvider
// ============================================================================

/// Connection settings for [`AlphaVantageProvider`].
#[derive(Clone, Debug)]
pub struct AlphaVantageConfig {
    pub api_key: String,
    pub base_url: String,
    /// Serve embedded payloads for recorded symbol/resolution pairs.
    pub use_fixtures: bool,
    pub resilience: ResilienceConfig,
}

impl AlphaVantageConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            use_fixtures: true,
            resilience: ResilienceConfig::default(),
        }
    }
}

/// Alpha Vantage series provider.
pub struct AlphaVantageProvider {
    http: UpstreamClient,
    api_key: String,
    base_url: String,
    use_fixtures: bool,
}

impl AlphaVantageProvider {
    pub fn new(config: AlphaVantageConfig) -> Self {
        Self {
            http: UpstreamClient::new(PROVIDER_ID, &config.resilience),
            api_key: config.api_key,
            base_url: config.base_url,
            use_fixtures: config.use_fixtures,
        }
    }

    /// Breaker guarding the Alpha Vantage endpoint.
    pub fn breaker(&self) -> &CircuitBreaker {
        self.http.breaker()
    }

    fn function_for(resolution: Resolution) -> Result<&'static str, MarketDataError> {
        match resolution {
            Resolution::Daily => Ok("TIME_SERIES_DAILY"),
            Resolution::Weekly => Ok("TIME_SERIES_WEEKLY"),
            Resolution::Monthly => Ok("TIME_SERIES_MONTHLY"),
            Resolution::Intraday => Err(MarketDataError::InvalidInput(
                "intraday resolution is not supported".to_string(),
            )),
        }
    }

    fn series_url(&self, symbol: &Symbol, function: &str) -> Result<Url, MarketDataError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("function", function),
                ("symbol", symbol.as_str()),
                ("outputsize", "compact"),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to build URL: {}", e),
        })
    }

    /// Check for API-level errors in the response.
    fn check_api_error(
        symbol: &Symbol,
        response: &TimeSeriesResponse,
    ) -> Result<(), MarketDataError> {
        if let Some(ref msg) = response.error_message {
            // Unknown tickers come back as a generic "Invalid API call"
            if msg.contains("Invalid API call") {
                return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
            }
            return Err(MarketDataError::InvalidInput(msg.clone()));
        }

        Self::check_throttled(response.note.as_deref(), response.information.as_deref())?;

        if let Some(ref msg) = response.information {
            warn!("Alpha Vantage info: {}", msg);
        }

        Ok(())
    }

    /// `Note` always means quota exhaustion; `Information` only when it says so.
    fn check_throttled(
        note: Option<&str>,
        information: Option<&str>,
    ) -> Result<(), MarketDataError> {
        if let Some(msg) = note {
            debug!("Alpha Vantage note: {}", msg);
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if let Some(msg) = information {
            let lower = msg.to_lowercase();
            if lower.contains("rate limit")
                || lower.contains("call frequency")
                || lower.contains("requests per day")
            {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Throttle check run on every attempt, so quota envelopes are retried
    /// and counted by the breaker. Bodies that do not parse pass through to
    /// [`parse_series`](Self::parse_series).
    fn screen_body(text: &str) -> Result<(), MarketDataError> {
        match serde_json::from_str::<ThrottleEnvelope>(text) {
            Ok(envelope) => {
                Self::check_throttled(envelope.note.as_deref(), envelope.information.as_deref())
            }
            Err(_) => Ok(()),
        }
    }

    /// Parse a TIME_SERIES_* payload into a newest-first series.
    fn parse_series(
        symbol: &Symbol,
        resolution: Resolution,
        text: &str,
    ) -> Result<HistoricalSeries, MarketDataError> {
        let response: TimeSeriesResponse =
            serde_json::from_str(text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse series response: {}", e),
            })?;

        Self::check_api_error(symbol, &response)?;

        let bars = response
            .time_series
            .ok_or_else(|| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("No time series in response for {}", symbol),
            })?;

        let rows = bars
            .into_iter()
            .filter_map(|(date, bar)| {
                let day = NaiveDate::parse_from_str(&date, DATE_FORMAT).ok();
                let close = Decimal::from_str(&bar.close).ok();
                match (day, close) {
                    (Some(day), Some(close)) => Some(ClosePrice::new(day, close)),
                    _ => {
                        warn!(symbol = %symbol, date = %date, "Skipping malformed bar");
                        None
                    }
                }
            })
            .collect();

        Ok(HistoricalSeries::from_rows(symbol.clone(), resolution, rows))
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_historical_prices(
        &self,
        symbol: &Symbol,
        resolution: Resolution,
    ) -> Result<HistoricalSeries, MarketDataError> {
        let function = Self::function_for(resolution)?;

        if self.use_fixtures {
            if let Some(body) = fixtures::lookup(symbol, resolution) {
                info!(symbol = %symbol, resolution = %resolution, "Serving recorded series");
                return Self::parse_series(symbol, resolution, body);
            }
        }

        let url = self.series_url(symbol, function)?;
        let text = self
            .http
            .get_screened(&url, &[], &self.api_key, Self::screen_body)
            .await?;
        let series = Self::parse_series(symbol, resolution, &text)?;

        debug!(
            symbol = %symbol,
            resolution = %resolution,
            rows = series.prices.len(),
            "Fetched series"
        );
        Ok(series)
    }
}

// ============================================================================
// Tests
// ============================================================================
