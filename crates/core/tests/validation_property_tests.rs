//! Property-based tests for request validation and series filtering.

use chrono::{Duration, NaiveDate};
use pricecache_core::prices::{parse_date, parse_date_filter, parse_symbol_list};
use pricecache_market_data::{date_key, ClosePrice, DateFilter, HistoricalSeries, Resolution, Symbol};
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 25).unwrap()
}

/// Any date from 1990-01-01 up to and including `today()`.
fn arb_past_date() -> impl Strategy<Value = NaiveDate> {
    let span = (today() - NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()).num_days();
    (0..=span).prop_map(|back| today() - Duration::days(back))
}

/// Up to 60 rows over the 90 days before `today()`, duplicates allowed.
fn arb_series() -> impl Strategy<Value = HistoricalSeries> {
    proptest::collection::vec((0i64..90, 1u32..100_000), 0..60).prop_map(|rows| {
        HistoricalSeries::from_rows(
            Symbol::parse("AAPL").unwrap(),
            Resolution::Daily,
            rows.into_iter()
                .map(|(back, cents)| {
                    ClosePrice::new(today() - Duration::days(back), Decimal::new(cents.into(), 2))
                })
                .collect(),
        )
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every canonical past date is accepted and parses back to itself.
    #[test]
    fn prop_past_dates_round_trip(date in arb_past_date()) {
        prop_assert_eq!(parse_date("date", &date_key(date), today()).unwrap(), date);
    }

    /// Anything after today is rejected.
    #[test]
    fn prop_future_dates_rejected(ahead in 1i64..5_000) {
        let date = today() + Duration::days(ahead);
        prop_assert!(parse_date("date", &date_key(date), today()).is_err());
    }

    /// A range is accepted exactly when `from <= to`.
    #[test]
    fn prop_range_order(from in arb_past_date(), to in arb_past_date()) {
        let parsed = parse_date_filter(None, Some(&date_key(from)), Some(&date_key(to)), today());
        prop_assert_eq!(parsed.is_ok(), from <= to);
    }

    /// Series rows are newest first with unique dates, and filtering keeps
    /// exactly the rows inside the window.
    #[test]
    fn prop_filtered_series_stays_in_window(
        series in arb_series(),
        a in arb_past_date(),
        b in arb_past_date(),
    ) {
        for pair in series.prices.windows(2) {
            prop_assert!(pair[0].date > pair[1].date);
        }

        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        let filtered = series.filtered(&DateFilter::Range { from, to });
        let (from_key, to_key) = (date_key(from), date_key(to));

        let expected = series
            .prices
            .iter()
            .filter(|p| p.date >= from_key && p.date <= to_key)
            .count();
        prop_assert_eq!(filtered.prices.len(), expected);
        for row in &filtered.prices {
            prop_assert!(row.date >= from_key && row.date <= to_key);
        }
    }

    /// Symbols come back trimmed and uppercased, in request order.
    #[test]
    fn prop_symbol_list_normalizes(raw in proptest::collection::vec("[a-zA-Z]{1,5}", 1..10)) {
        let joined = raw.iter().map(|s| format!(" {} ", s)).collect::<Vec<_>>().join(",");
        let symbols = parse_symbol_list(&joined).unwrap();

        let expected: Vec<String> = raw.iter().map(|s| s.to_ascii_uppercase()).collect();
        let actual: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        prop_assert_eq!(actual, expected);
    }
}
