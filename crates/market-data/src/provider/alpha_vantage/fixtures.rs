//! Embedded Alpha Vantage payloads.
//!
//! The public `demo` key only answers for IBM, so IBM/daily is served from a
//! recorded response instead of spending quota on it.

use crate::models::{Resolution, Symbol};

struct Fixture {
    symbol: &'static str,
    resolution: Resolution,
    body: &'static str,
}

const FIXTURES: &[Fixture] = &[Fixture {
    symbol: "IBM",
    resolution: Resolution::Daily,
    body: include_str!("fixtures/ibm_daily.json"),
}];

/// Recorded upstream body for `(symbol, resolution)`, if one is embedded.
pub(super) fn lookup(symbol: &Symbol, resolution: Resolution) -> Option<&'static str> {
    FIXTURES
        .iter()
        .find(|f| f.symbol == symbol.as_str() && f.resolution == resolution)
        .map(|f| f.body)
}
