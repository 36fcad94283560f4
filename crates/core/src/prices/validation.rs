//! Request parameter validation.
//!
//! Raw query strings come in, typed values go out. Dates are strict
//! `YYYY-MM-DD` and must exist on the calendar.

use chrono::NaiveDate;
use pricecache_market_data::{DateFilter, Resolution, Symbol, DATE_FORMAT};

use crate::errors::{PriceServiceError, Result};

/// Split a comma-separated symbols parameter.
///
/// Blank entries are skipped. Count limits are enforced by the price service.
pub fn parse_symbol_list(raw: &str) -> Result<Vec<Symbol>> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| Symbol::parse(part).map_err(|e| PriceServiceError::invalid(e.to_string())))
        .collect()
}

/// Parse a resolution accepted over HTTP. Missing means daily.
pub fn parse_resolution(raw: Option<&str>) -> Result<Resolution> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Resolution::Daily);
    };

    let resolution: Resolution = raw
        .parse()
        .map_err(|e: pricecache_market_data::MarketDataError| {
            PriceServiceError::invalid(e.to_string())
        })?;

    if !resolution.is_served() {
        return Err(PriceServiceError::invalid(format!(
            "unsupported resolution: {} (expected daily, weekly or monthly)",
            resolution
        )));
    }
    Ok(resolution)
}

/// Parse a strict `YYYY-MM-DD` date that is not after `today`.
pub fn parse_date(name: &str, raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let raw = raw.trim();
    let well_formed = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(PriceServiceError::invalid(format!(
            "{name} must be formatted as YYYY-MM-DD: {raw}"
        )));
    }

    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| PriceServiceError::invalid(format!("{name} is not a valid date: {raw}")))?;

    if date > today {
        return Err(PriceServiceError::invalid(format!(
            "{name} cannot be in the future: {raw}"
        )));
    }
    Ok(date)
}

/// Build the date filter from the optional `date`, `from` and `to` parameters.
///
/// Either `date` alone, or `from` and `to` together, or none of them.
pub fn parse_date_filter(
    date: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<DateFilter> {
    fn present(v: Option<&str>) -> Option<&str> {
        v.filter(|s| !s.trim().is_empty())
    }

    match (present(date), present(from), present(to)) {
        (None, None, None) => Ok(DateFilter::All),
        (Some(date), None, None) => Ok(DateFilter::On(parse_date("date", date, today)?)),
        (Some(_), _, _) => Err(PriceServiceError::invalid(
            "date cannot be combined with from/to",
        )),
        (None, Some(from), Some(to)) => {
            let from = parse_date("from", from, today)?;
            let to = parse_date("to", to, today)?;
            if from > to {
                return Err(PriceServiceError::invalid(format!(
                    "from ({from}) must not be after to ({to})"
                )));
            }
            Ok(DateFilter::Range { from, to })
        }
        (None, _, _) => Err(PriceServiceError::invalid(
            "from and to must be supplied together",
        )),
    }
}

/// A validated historical request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoricalQuery {
    pub symbol: Symbol,
    pub resolution: Resolution,
    pub filter: DateFilter,
}

impl HistoricalQuery {
    pub fn new(symbol: Symbol, resolution: Resolution, filter: DateFilter) -> Self {
        Self {
            symbol,
            resolution,
            filter,
        }
    }

    /// Validate raw query parameters as received over HTTP.
    pub fn from_params(
        symbol: Option<&str>,
        resolution: Option<&str>,
        date: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self> {
        let symbol = Symbol::parse(symbol.unwrap_or_default())
            .map_err(|e| PriceServiceError::invalid(e.to_string()))?;
        let resolution = parse_resolution(resolution)?;
        let filter = parse_date_filter(date, from, to, today)?;
        Ok(Self::new(symbol, resolution, filter))
    }
}
