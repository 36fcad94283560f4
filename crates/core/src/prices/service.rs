//! Price service: cache-first reads with upstream fill.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use pricecache_market_data::{
    classify_coverage, CacheCoverage, CurrentPrice, DateFilter, HistoricalSeries, MarketCalendar,
    PriceProvider, Symbol,
};
use tracing::{debug, info, warn};

use super::fill_lock::FillLocks;
use super::validation::HistoricalQuery;
use crate::cache::{current_key, historical_key, symbol_keys, CacheStore};
use crate::constants::DEFAULT_MAX_SYMBOLS_PER_REQUEST;
use crate::errors::{PriceServiceError, Result};

/// Trait defining the contract for price service operations.
#[async_trait]
pub trait PriceServiceTrait: Send + Sync {
    /// Current prices for `symbols`, served from cache where possible.
    ///
    /// The list must hold between one and
    /// [`max_symbols_per_request`](Self::max_symbols_per_request) entries.
    /// Duplicates are collapsed. Ordering of the result is unspecified.
    async fn get_current_prices(&self, symbols: &[Symbol]) -> Result<Vec<CurrentPrice>>;

    /// Historical closes for a validated query, filtered to its window.
    async fn get_historical_prices(&self, query: &HistoricalQuery) -> Result<HistoricalSeries>;

    /// Remove every cached price. Never calls upstream.
    async fn invalidate_all(&self) -> Result<()>;

    /// Remove every cached entry for one symbol. Returns the number of keys
    /// removed.
    async fn invalidate_symbol(&self, symbol: &Symbol) -> Result<u64>;

    fn max_symbols_per_request(&self) -> usize;
}

#[derive(Clone, Debug)]
pub struct PriceServiceConfig {
    pub max_symbols_per_request: usize,
}

impl Default for PriceServiceConfig {
    fn default() -> Self {
        Self {
            max_symbols_per_request: DEFAULT_MAX_SYMBOLS_PER_REQUEST,
        }
    }
}

pub struct PriceService {
    cache: CacheStore,
    providers: Arc<dyn PriceProvider>,
    calendar: MarketCalendar,
    fill_locks: FillLocks,
    config: PriceServiceConfig,
}

impl PriceService {
    pub fn new(
        cache: CacheStore,
        providers: Arc<dyn PriceProvider>,
        calendar: MarketCalendar,
        config: PriceServiceConfig,
    ) -> Self {
        Self {
            cache,
            providers,
            calendar,
            fill_locks: FillLocks::new(),
            config,
        }
    }

    pub fn calendar(&self) -> &MarketCalendar {
        &self.calendar
    }

    fn check_batch(&self, symbols: &[Symbol]) -> Result<Vec<Symbol>> {
        if symbols.is_empty() {
            return Err(PriceServiceError::invalid("at least one symbol is required"));
        }
        if symbols.len() > self.config.max_symbols_per_request {
            return Err(PriceServiceError::invalid(format!(
                "too many symbols: {} (maximum {})",
                symbols.len(),
                self.config.max_symbols_per_request
            )));
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        Ok(symbols
            .iter()
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect())
    }

    /// Cache read where any failure counts as a miss.
    async fn cached_current(&self, symbol: &Symbol) -> Option<CurrentPrice> {
        self.cache.get_current(symbol).await.unwrap_or_default()
    }

    async fn cached_series(&self, query: &HistoricalQuery) -> Option<HistoricalSeries> {
        self.cache
            .get_historical(&query.symbol, query.resolution)
            .await
            .unwrap_or_default()
    }

    /// Split `symbols` into cached prices and symbols still missing.
    async fn partition(&self, symbols: Vec<Symbol>) -> (Vec<CurrentPrice>, Vec<Symbol>) {
        let mut hits = Vec::with_capacity(symbols.len());
        let mut misses = Vec::new();
        for symbol in symbols {
            match self.cached_current(&symbol).await {
                Some(price) => hits.push(price),
                None => misses.push(symbol),
            }
        }
        (hits, misses)
    }

    /// Whether `series` can answer `filter` without going upstream.
    fn covers(&self, series: &HistoricalSeries, filter: &DateFilter) -> bool {
        match filter.window() {
            None => !series.is_empty(),
            Some((from, to)) => {
                let coverage = classify_coverage(&self.calendar, series, from, to);
                debug!(
                    symbol = %series.symbol,
                    resolution = %series.resolution,
                    coverage = coverage.as_str(),
                    "Classified cache coverage"
                );
                coverage == CacheCoverage::Full
            }
        }
    }
}

#[async_trait]
impl PriceServiceTrait for PriceService {
    async fn get_current_prices(&self, symbols: &[Symbol]) -> Result<Vec<CurrentPrice>> {
        let symbols = self.check_batch(symbols)?;
        let (mut hits, misses) = self.partition(symbols).await;
        if misses.is_empty() {
            return Ok(hits);
        }

        let keys: Vec<String> = misses.iter().map(current_key).collect();
        let _guards = self.fill_locks.acquire_many(&keys).await;

        // Another request may have filled some of these while we waited
        let (filled, misses) = self.partition(misses).await;
        hits.extend(filled);
        if misses.is_empty() {
            return Ok(hits);
        }

        debug!(hits = hits.len(), misses = ?misses, "Fetching current prices upstream");
        let fetched = match self.providers.get_current_prices(&misses).await {
            Ok(fetched) => fetched,
            Err(e) if !hits.is_empty() => {
                warn!(error = %e, misses = ?misses, "Upstream failed, serving cached subset");
                return Ok(hits);
            }
            Err(e) => return Err(e.into()),
        };

        let wanted: HashSet<&Symbol> = misses.iter().collect();
        let mut served: HashSet<Symbol> = hits.iter().map(|p| p.symbol.clone()).collect();
        for price in fetched {
            if !wanted.contains(&price.symbol) || !served.insert(price.symbol.clone()) {
                continue;
            }
            if let Err(e) = self.cache.set_current(&price).await {
                warn!(symbol = %price.symbol, error = %e, "Write-back failed");
            }
            hits.push(price);
        }

        Ok(hits)
    }

    async fn get_historical_prices(&self, query: &HistoricalQuery) -> Result<HistoricalSeries> {
        if let Some(series) = self.cached_series(query).await {
            if self.covers(&series, &query.filter) {
                return Ok(series.filtered(&query.filter));
            }
        }

        let key = historical_key(&query.symbol, query.resolution);
        let _guard = self.fill_locks.acquire(&key).await;

        if let Some(series) = self.cached_series(query).await {
            if self.covers(&series, &query.filter) {
                debug!(key = %key, "Filled by a concurrent request");
                return Ok(series.filtered(&query.filter));
            }
        }

        let series = self
            .providers
            .get_historical_prices(&query.symbol, query.resolution)
            .await?;

        info!(
            symbol = %query.symbol,
            resolution = %query.resolution,
            rows = series.prices.len(),
            "Refreshed historical series"
        );

        if let Err(e) = self.cache.set_historical(&series).await {
            warn!(key = %key, error = %e, "Write-back failed");
        }

        Ok(series.filtered(&query.filter))
    }

    async fn invalidate_all(&self) -> Result<()> {
        self.cache.flush().await?;
        Ok(())
    }

    async fn invalidate_symbol(&self, symbol: &Symbol) -> Result<u64> {
        Ok(self.cache.delete(&symbol_keys(symbol)).await?)
    }

    fn max_symbols_per_request(&self) -> usize {
        self.config.max_symbols_per_request
    }
}
