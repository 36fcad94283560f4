//! Price provider trait definition.
//!
//! This module defines the capability surface every upstream adapter
//! implements: current quotes and historical series.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{CurrentPrice, HistoricalSeries, Resolution, Symbol};

/// Trait for upstream price providers.
///
/// Implement this trait to add support for a new market data source. An
/// adapter implements the operations its upstream supports; the defaults
/// return [`MarketDataError::NotSupported`].
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use pricecache_market_data::provider::PriceProvider;
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl PriceProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn get_current_prices(
///         &self,
///         symbols: &[Symbol],
///     ) -> Result<Vec<CurrentPrice>, MarketDataError> {
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "FINNHUB", "ALPHA_VANTAGE", etc.
    /// Used for logging and circuit breaker naming.
    fn id(&self) -> &'static str;

    /// Fetch current prices for a batch of symbols.
    ///
    /// Adapters without native batching may return fewer prices than
    /// requested: symbols that fail individually are logged and skipped.
    /// An error is returned only when nothing could be fetched.
    async fn get_current_prices(
        &self,
        symbols: &[Symbol],
    ) -> Result<Vec<CurrentPrice>, MarketDataError> {
        let _ = symbols;
        Err(MarketDataError::NotSupported {
            operation: "current prices".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Fetch the full historical series for a symbol.
    ///
    /// The returned series is sorted newest first with unique dates.
    async fn get_historical_prices(
        &self,
        symbol: &Symbol,
        resolution: Resolution,
    ) -> Result<HistoricalSeries, MarketDataError> {
        let _ = (symbol, resolution);
        Err(MarketDataError::NotSupported {
            operation: "historical prices".to_string(),
            provider: self.id().to_string(),
        })
    }
}
