//! HTTP client for the price service.
//!
//! Every request carries `X-API-Key`, runs through a circuit breaker and is
//! retried on transient failures. Any 2xx answer refreshes the client's
//! notion of when the service was last seen healthy.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use pricecache_market_data::{
    call_with_retry, CircuitBreaker, CurrentPrice, DateFilter, ErrorKind, HistoricalSeries,
    ResilienceConfig, Resolution, RetryPolicy, Symbol,
};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{ClientError, Result};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A 2xx answer within this window counts as healthy.
pub const HEALTH_FRESHNESS: Duration = Duration::from_secs(5 * 60);

const API_KEY_HEADER: &str = "X-API-Key";

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: ErrorKind,
    message: String,
}

/// Body of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub resilience: ResilienceConfig,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            resilience: ResilienceConfig::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Client for the price service HTTP API.
///
/// # Example
///
/// ```ignore
/// let client = PriceServiceClient::new(
///     ClientConfig::new("http://prices.internal:8081").with_api_key("secret"),
/// )?;
/// let prices = client.get_current_prices(&[Symbol::parse("AAPL")?]).await?;
/// ```
pub struct PriceServiceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    last_healthy: RwLock<Option<Instant>>,
}

impl PriceServiceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL: {}", e)))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key,
            breaker: CircuitBreaker::with_config("price-service", config.resilience.breaker),
            retry: config.resilience.retry,
            last_healthy: RwLock::new(None),
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// When the service last answered with a 2xx, if ever.
    pub fn last_healthy(&self) -> Option<Instant> {
        *self
            .last_healthy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// True when a 2xx answer was seen within the last five minutes.
    ///
    /// Purely a freshness check: no request is made.
    pub fn is_healthy(&self) -> bool {
        self.last_healthy()
            .is_some_and(|seen| seen.elapsed() < HEALTH_FRESHNESS)
    }

    fn mark_healthy(&self) {
        let mut slot = self
            .last_healthy
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Instant::now());
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ClientError::Config(format!("invalid path {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Endpoints
    // ─────────────────────────────────────────────────────────────────────────

    /// Probe `GET /health`, refreshing [`last_healthy`](Self::last_healthy)
    /// on success.
    pub async fn check_health(&self) -> Result<HealthStatus> {
        let url = self.url("/health", &[])?;
        let body = self.send(Method::GET, &url).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn get_current_prices(&self, symbols: &[Symbol]) -> Result<Vec<CurrentPrice>> {
        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.url("/api/v1/price/current", &[("symbols", joined)])?;
        self.request(Method::GET, &url).await
    }

    pub async fn get_historical_prices(
        &self,
        symbol: &Symbol,
        resolution: Resolution,
        filter: DateFilter,
    ) -> Result<HistoricalSeries> {
        let mut query = vec![
            ("symbol", symbol.to_string()),
            ("resolution", resolution.to_string()),
        ];
        query.extend(filter.query_params());
        let url = self.url("/api/v1/price/historical", &query)?;
        self.request(Method::GET, &url).await
    }

    /// Invalidate cached prices, for one symbol or for everything.
    pub async fn invalidate_cache(&self, symbol: Option<&Symbol>) -> Result<()> {
        let query: Vec<(&str, String)> = symbol
            .map(|s| vec![("symbol", s.to_string())])
            .unwrap_or_default();
        let url = self.url("/api/v1/invalid-cache", &query)?;
        let _: serde_json::Value = self.request(Method::POST, &url).await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────────

    /// Send and unwrap the `{success, data, error}` envelope.
    async fn request<T: DeserializeOwned>(&self, method: Method, url: &Url) -> Result<T> {
        let body = self.send(method, url).await?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

        match envelope {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            Envelope {
                error: Some(error), ..
            } => Err(ClientError::Api {
                status: 200,
                code: error.code,
                message: error.message,
            }),
            _ => Err(ClientError::Decode("envelope carried no data".to_string())),
        }
    }

    /// Send through the breaker and retry loop, returning the 2xx body.
    ///
    /// 4xx answers are the caller's problem: they are neither retried nor
    /// counted against the breaker.
    async fn send(&self, method: Method, url: &Url) -> Result<String> {
        debug!(method = %method, url = %url, "Price service request");

        let outcome = call_with_retry(&self.breaker, &self.retry, || {
            self.send_once(method.clone(), url)
        })
        .await;

        match outcome {
            Ok(inner) => inner,
            Err(e) => {
                warn!(method = %method, url = %url, error = %e, "Price service request failed");
                Err(e)
            }
        }
    }

    /// One attempt. The outer error is a breaker-visible failure; the inner
    /// one a client-side rejection.
    async fn send_once(&self, method: Method, url: &Url) -> Result<Result<String>> {
        let mut request = self.http.request(method, url.clone());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            self.mark_healthy();
            return Ok(Ok(body));
        }

        let (code, message) = match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            Ok(Envelope {
                error: Some(error), ..
            }) => (error.code, error.message),
            _ => (
                fallback_kind(status.as_u16()),
                format!("HTTP {}", status),
            ),
        };
        let err = ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        };

        if status.is_server_error() || status.as_u16() == 429 {
            Err(err)
        } else {
            Ok(Err(err))
        }
    }
}

fn fallback_kind(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::InvalidInput,
        401 | 403 => ErrorKind::Unauthorized,
        404 => ErrorKind::SymbolNotFound,
        429 => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::ServiceUnavailable,
    }
}
