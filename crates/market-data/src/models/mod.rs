//! Price data model shared by providers, the cache and the HTTP surface.

mod price;
mod query;
mod symbol;

pub use price::{ClosePrice, CurrentPrice, HistoricalSeries, Resolution};
pub use query::{date_key, DateFilter, DATE_FORMAT};
pub use symbol::{Symbol, MAX_TICKER_LEN};
