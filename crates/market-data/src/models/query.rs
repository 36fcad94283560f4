use chrono::NaiveDate;

/// Date format used for series rows, cache payloads and query parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` rendering of a date.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Date restriction for a historical request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DateFilter {
    /// Whole series.
    All,
    /// Exactly one day.
    On(NaiveDate),
    /// Inclusive window, `from <= to`.
    Range { from: NaiveDate, to: NaiveDate },
}

impl DateFilter {
    /// The inclusive window this filter covers, if any.
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            Self::All => None,
            Self::On(date) => Some((date, date)),
            Self::Range { from, to } => Some((from, to)),
        }
    }

    /// Query parameters that express this filter over HTTP.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match *self {
            Self::All => Vec::new(),
            Self::On(date) => vec![("date", date_key(date))],
            Self::Range { from, to } => vec![("from", date_key(from)), ("to", date_key(to))],
        }
    }
}
