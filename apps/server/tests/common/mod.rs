#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use pricecache_core::{CacheStore, CacheTtl, MemoryBackend, PriceService, PriceServiceConfig};
use pricecache_market_data::{
    ClosePrice, CurrentPrice, HistoricalSeries, MarketCalendar, MarketDataError, PriceProvider,
    Resolution, Symbol,
};
use pricecache_server::api::app_router;
use pricecache_server::rate_limiter::RateLimitConfig;
use pricecache_server::AppState;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

pub const API_KEY: &str = "test-key";

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).unwrap()
}

pub fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn price(raw: &str, current: Decimal) -> CurrentPrice {
    CurrentPrice::new(symbol(raw), current, current - Decimal::ONE, "USD", Utc::now())
}

pub fn series(raw: &str, rows: &[(&str, Decimal)]) -> HistoricalSeries {
    HistoricalSeries::from_rows(
        symbol(raw),
        Resolution::Daily,
        rows.iter()
            .map(|(date, close)| ClosePrice::new(day(date), *close))
            .collect(),
    )
}

/// Provider double recording every upstream call.
#[derive(Default)]
pub struct MockProvider {
    quotes: HashMap<Symbol, Decimal>,
    series: HashMap<Symbol, HistoricalSeries>,
    pub current_calls: Mutex<Vec<Vec<String>>>,
    pub historical_calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn with_quote(mut self, raw: &str, current: Decimal) -> Self {
        self.quotes.insert(symbol(raw), current);
        self
    }

    pub fn with_series(mut self, series: HistoricalSeries) -> Self {
        self.series.insert(series.symbol.clone(), series);
        self
    }

    pub fn current_calls(&self) -> Vec<Vec<String>> {
        self.current_calls.lock().unwrap().clone()
    }

    pub fn historical_calls(&self) -> Vec<String> {
        self.historical_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn id(&self) -> &'static str {
        "MOCK"
    }

    async fn get_current_prices(
        &self,
        symbols: &[Symbol],
    ) -> Result<Vec<CurrentPrice>, MarketDataError> {
        self.current_calls
            .lock()
            .unwrap()
            .push(symbols.iter().map(|s| s.to_string()).collect());

        let prices: Vec<_> = symbols
            .iter()
            .filter_map(|s| self.quotes.get(s).map(|p| price(s.as_str(), *p)))
            .collect();
        if prices.is_empty() {
            return Err(MarketDataError::SymbolNotFound(
                symbols.first().map(|s| s.to_string()).unwrap_or_default(),
            ));
        }
        Ok(prices)
    }

    async fn get_historical_prices(
        &self,
        symbol: &Symbol,
        _resolution: Resolution,
    ) -> Result<HistoricalSeries, MarketDataError> {
        self.historical_calls.lock().unwrap().push(symbol.to_string());
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub cache: CacheStore,
    pub provider: Arc<MockProvider>,
}

pub struct AppBuilder {
    provider: Arc<dyn PriceProvider>,
    api_key: Option<String>,
    rate_limit: RateLimitConfig,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            provider: Arc::new(MockProvider::default()),
            api_key: Some(API_KEY.to_string()),
            rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn api_key(mut self, key: Option<&str>) -> Self {
        self.api_key = key.map(str::to_string);
        self
    }

    pub fn rate_limit(mut self, requests: u32) -> Self {
        self.rate_limit.requests = requests;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn PriceProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Router and cache over `provider`.
    pub fn build(self) -> (Router, CacheStore) {
        let cache = CacheStore::new(Arc::new(MemoryBackend::new()), CacheTtl::default());
        let service = PriceService::new(
            cache.clone(),
            self.provider,
            MarketCalendar::default(),
            PriceServiceConfig::default(),
        );
        let state = Arc::new(AppState::new(
            Arc::new(service),
            self.api_key,
            self.rate_limit,
        ));
        (app_router(state), cache)
    }
}

impl TestApp {
    pub fn new(provider: MockProvider) -> Self {
        let provider = Arc::new(provider);
        let (router, cache) = AppBuilder::new().provider(provider.clone()).build();
        Self {
            router,
            cache,
            provider,
        }
    }
}

pub fn loopback() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

pub fn remote(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(203, 0, 113, last))
}

/// Request from `peer`, carrying the test API key when `with_key`.
pub fn request(method: Method, uri: &str, peer: IpAddr, with_key: bool) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if with_key {
        builder = builder.header("x-api-key", API_KEY);
    }
    let mut request = builder.body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(peer, 40000)));
    request
}

pub fn get(uri: &str) -> Request<Body> {
    request(Method::GET, uri, remote(1), true)
}

pub fn post(uri: &str) -> Request<Body> {
    request(Method::POST, uri, remote(1), true)
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Send and decode the JSON body.
pub async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(router, request).await;
    let status = response.status();
    let body = body_bytes(response).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
