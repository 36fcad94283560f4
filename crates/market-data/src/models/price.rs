use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::query::{date_key, DateFilter};
use super::symbol::Symbol;
use crate::errors::MarketDataError;

/// Latest quote for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentPrice {
    pub symbol: Symbol,
    pub current_price: Decimal,
    pub currency: String,
    /// `current_price - previous_close`
    pub change: Decimal,
    /// `change / previous_close`, or zero when there is no previous close.
    pub change_percent: Decimal,
    pub previous_close: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl CurrentPrice {
    /// Build a price, deriving `change` and `change_percent`.
    pub fn new(
        symbol: Symbol,
        current_price: Decimal,
        previous_close: Decimal,
        currency: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let change = current_price - previous_close;
        let change_percent = if previous_close > Decimal::ZERO {
            change / previous_close
        } else {
            Decimal::ZERO
        };

        Self {
            symbol,
            current_price,
            currency: currency.into(),
            change,
            change_percent,
            previous_close,
            fetched_at,
        }
    }
}

/// Granularity of a historical series.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Daily,
    Weekly,
    Monthly,
    /// Reserved; never served over HTTP.
    Intraday,
}

impl Resolution {
    /// Resolutions the HTTP surface accepts.
    pub const SERVED: [Resolution; 3] = [Resolution::Daily, Resolution::Weekly, Resolution::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Intraday => "intraday",
        }
    }

    pub fn is_served(&self) -> bool {
        Self::SERVED.contains(self)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "intraday" => Ok(Self::Intraday),
            other => Err(MarketDataError::InvalidInput(format!(
                "invalid resolution: {other}"
            ))),
        }
    }
}

/// One row of a historical series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosePrice {
    /// `YYYY-MM-DD`
    pub date: String,
    pub price: Decimal,
}

impl ClosePrice {
    pub fn new(date: NaiveDate, price: Decimal) -> Self {
        Self {
            date: date_key(date),
            price,
        }
    }
}

/// Close prices for one symbol at one resolution, newest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub symbol: Symbol,
    pub resolution: Resolution,
    pub prices: Vec<ClosePrice>,
}

impl HistoricalSeries {
    /// Build a series from rows in any order.
    ///
    /// Rows are sorted newest first and duplicate dates are dropped, keeping
    /// the first occurrence.
    pub fn from_rows(symbol: Symbol, resolution: Resolution, mut prices: Vec<ClosePrice>) -> Self {
        prices.sort_by(|a, b| b.date.cmp(&a.date));
        prices.dedup_by(|a, b| a.date == b.date);
        Self {
            symbol,
            resolution,
            prices,
        }
    }

    /// Date of the newest row, if any.
    pub fn newest_date(&self) -> Option<&str> {
        self.prices.first().map(|p| p.date.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Copy of this series restricted to `filter`, order preserved.
    ///
    /// Comparisons are lexical on `YYYY-MM-DD` strings.
    pub fn filtered(&self, filter: &DateFilter) -> HistoricalSeries {
        let prices = match filter {
            DateFilter::All => self.prices.clone(),
            DateFilter::On(date) => {
                let key = date_key(*date);
                self.prices
                    .iter()
                    .filter(|p| p.date == key)
                    .take(1)
                    .cloned()
                    .collect()
            }
            DateFilter::Range { from, to } => {
                let (from, to) = (date_key(*from), date_key(*to));
                self.prices
                    .iter()
                    .filter(|p| p.date.as_str() >= from.as_str() && p.date.as_str() <= to.as_str())
                    .cloned()
                    .collect()
            }
        };

        HistoricalSeries {
            symbol: self.symbol.clone(),
            resolution: self.resolution,
            prices,
        }
    }
}
