use chrono::NaiveDate;

use super::MarketCalendar;
use crate::models::{date_key, HistoricalSeries};

/// How well a cached series covers a requested window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheCoverage {
    /// Serve from cache.
    Full,
    /// Cache is behind the window; refetch.
    Partial,
    /// Cache has nothing usable for the window; refetch.
    None,
}

impl CacheCoverage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::None => "none",
        }
    }
}

/// Classify `series` against the inclusive window `[from, to]`.
///
/// The newest cached row must reach the last trading day on or before `to`,
/// and some row must sit on or after the last trading day on or before `from`.
/// A series whose newest row predates `from` has no coverage at all.
pub fn classify_coverage(
    calendar: &MarketCalendar,
    series: &HistoricalSeries,
    from: NaiveDate,
    to: NaiveDate,
) -> CacheCoverage {
    let Some(newest) = series.newest_date() else {
        return CacheCoverage::None;
    };

    let target = date_key(calendar.last_trading_day(to));
    let earliest_needed = date_key(calendar.last_trading_day(from));

    let reaches_target = newest >= target.as_str();
    let reaches_start = series
        .prices
        .iter()
        .any(|row| row.date.as_str() >= earliest_needed.as_str());

    if reaches_target && reaches_start {
        CacheCoverage::Full
    } else if newest < date_key(from).as_str() {
        CacheCoverage::None
    } else {
        CacheCoverage::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClosePrice, Resolution, Symbol};
    use rust_decimal_macros::dec;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn cached(dates: &[&str]) -> HistoricalSeries {
        HistoricalSeries::from_rows(
            Symbol::parse("AAPL").unwrap(),
            Resolution::Daily,
            dates
                .iter()
                .map(|d| ClosePrice {
                    date: d.to_string(),
                    price: dec!(200),
                })
                .collect(),
        )
    }

    #[test]
    fn test_full_coverage_when_newest_reaches_window_end() {
        let cal = MarketCalendar::default();
        let series = cached(&["2025-07-23", "2025-07-22"]);
        assert_eq!(
            classify_coverage(&cal, &series, day("2025-07-20"), day("2025-07-23")),
            CacheCoverage::Full
        );
    }

    #[test]
    fn test_partial_when_window_extends_past_cache() {
        let cal = MarketCalendar::default();
        let series = cached(&["2025-07-23", "2025-07-22"]);
        assert_eq!(
            classify_coverage(&cal, &series, day("2025-07-20"), day("2025-07-25")),
            CacheCoverage::Partial
        );
    }

    #[test]
    fn test_holiday_weekend_counts_as_covered() {
        let cal = MarketCalendar::default();
        let series = cached(&["2025-07-03", "2025-07-02"]);
        assert_eq!(
            classify_coverage(&cal, &series, day("2025-07-01"), day("2025-07-06")),
            CacheCoverage::Full
        );
    }

    #[test]
    fn test_none_when_cache_predates_window() {
        let cal = MarketCalendar::default();
        let series = cached(&["2025-06-30", "2025-06-27"]);
        assert_eq!(
            classify_coverage(&cal, &series, day("2025-07-07"), day("2025-07-10")),
            CacheCoverage::None
        );
    }

    #[test]
    fn test_empty_series_has_no_coverage() {
        let cal = MarketCalendar::default();
        let series = cached(&[]);
        assert_eq!(
            classify_coverage(&cal, &series, day("2025-07-01"), day("2025-07-02")),
            CacheCoverage::None
        );
    }

    #[test]
    fn test_single_day_on_weekend_uses_prior_session() {
        let cal = MarketCalendar::default();
        let series = cached(&["2025-07-18", "2025-07-17"]);
        assert_eq!(
            classify_coverage(&cal, &series, day("2025-07-19"), day("2025-07-19")),
            CacheCoverage::Full
        );
    }
}
