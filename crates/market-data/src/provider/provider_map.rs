//! Routes each operation to the adapter that serves it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{CurrentPrice, HistoricalSeries, Resolution, Symbol};
use crate::provider::PriceProvider;

/// One adapter for current quotes, one for historical series.
///
/// Dispatch is by operation only. A failing adapter is never replaced by the
/// other one.
#[derive(Clone)]
pub struct ProviderMap {
    quotes: Arc<dyn PriceProvider>,
    series: Arc<dyn PriceProvider>,
}

impl ProviderMap {
    pub fn new(quotes: Arc<dyn PriceProvider>, series: Arc<dyn PriceProvider>) -> Self {
        Self { quotes, series }
    }

    pub fn quotes(&self) -> &Arc<dyn PriceProvider> {
        &self.quotes
    }

    pub fn series(&self) -> &Arc<dyn PriceProvider> {
        &self.series
    }
}

#[async_trait]
impl PriceProvider for ProviderMap {
    fn id(&self) -> &'static str {
        "PROVIDER_MAP"
    }

    async fn get_current_prices(
        &self,
        symbols: &[Symbol],
    ) -> Result<Vec<CurrentPrice>, MarketDataError> {
        self.quotes.get_current_prices(symbols).await
    }

    async fn get_historical_prices(
        &self,
        symbol: &Symbol,
        resolution: Resolution,
    ) -> Result<HistoricalSeries, MarketDataError> {
        self.series.get_historical_prices(symbol, resolution).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct QuotesOnly;

    #[async_trait]
    impl PriceProvider for QuotesOnly {
        fn id(&self) -> &'static str {
            "QUOTES"
        }

        async fn get_current_prices(
            &self,
            symbols: &[Symbol],
        ) -> Result<Vec<CurrentPrice>, MarketDataError> {
            Ok(symbols
                .iter()
                .map(|s| CurrentPrice::new(s.clone(), dec!(10), dec!(8), "USD", Utc::now()))
                .collect())
        }
    }

    struct SeriesDown;

    #[async_trait]
    impl PriceProvider for SeriesDown {
        fn id(&self) -> &'static str {
            "SERIES"
        }

        async fn get_historical_prices(
            &self,
            _symbol: &Symbol,
            _resolution: Resolution,
        ) -> Result<HistoricalSeries, MarketDataError> {
            Err(MarketDataError::Timeout {
                provider: "SERIES".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_dispatches_by_operation_without_failover() {
        let map = ProviderMap::new(Arc::new(QuotesOnly), Arc::new(SeriesDown));
        let aapl = Symbol::parse("AAPL").unwrap();

        let prices = map.get_current_prices(&[aapl.clone()]).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].change, dec!(2));

        // The quotes adapter is not consulted when the series adapter fails
        let err = map
            .get_historical_prices(&aapl, Resolution::Daily)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::Timeout { .. }));
    }
}
