//! Pricecache Market Data Crate
//!
//! Upstream side of the price service: provider adapters, the resilience
//! layer wrapping every outbound request, and the U.S. market calendar.
//!
//! # Overview
//!
//! - Two adapters: Finnhub for current quotes, Alpha Vantage for series
//! - A [`ProviderMap`] dispatching each operation to its adapter
//! - One circuit breaker and retry policy per upstream
//! - A holiday-aware calendar used for cache coverage decisions
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  Price service   |  (pricecache-core)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   ProviderMap    |  (dispatch by operation)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |     Adapter      | --> | Breaker + retry  |  (one per upstream)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   Upstream HTTP  |
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Symbol`] - Normalized ticker, the basis of every cache key
//! - [`CurrentPrice`] - Latest quote with derived change fields
//! - [`HistoricalSeries`] - Newest-first close prices at one [`Resolution`]
//! - [`MarketDataError`] / [`ErrorKind`] - Upstream failures and their taxonomy

pub mod calendar;
pub mod errors;
pub mod models;
pub mod provider;
pub mod resilience;

// Re-export all public types from models
pub use models::{
    date_key, ClosePrice, CurrentPrice, DateFilter, HistoricalSeries, Resolution, Symbol,
    DATE_FORMAT, MAX_TICKER_LEN,
};

// Re-export error types
pub use errors::{ErrorKind, MarketDataError, RetryClass, Retryable};

// Re-export provider types
pub use provider::alpha_vantage::{AlphaVantageConfig, AlphaVantageProvider};
pub use provider::finnhub::{FinnhubConfig, FinnhubProvider};
pub use provider::{PriceProvider, ProviderMap, UPSTREAM_TIMEOUT};

// Re-export resilience types
pub use resilience::{
    call_with_retry, CircuitBreaker, CircuitBreakerConfig, CircuitOpenError, CircuitState,
    ResilienceConfig, RetryPolicy,
};

// Re-export calendar types
pub use calendar::{classify_coverage, CacheCoverage, HolidayRules, MarketCalendar};
