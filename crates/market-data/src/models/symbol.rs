use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Maximum length of the ticker part (before any `.XX` suffix).
pub const MAX_TICKER_LEN: usize = 10;

/// Maximum length of an exchange suffix such as `.TO` or `.L`.
const MAX_SUFFIX_LEN: usize = 2;

/// Normalized ticker symbol.
///
/// Always trimmed and uppercased; `[A-Z0-9]{1,10}` with an optional `.XX`
/// exchange suffix. This is the form used inside cache keys. Deserializing
/// goes through [`Symbol::parse`] as well.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Trim, uppercase and validate a raw symbol.
    pub fn parse(raw: &str) -> Result<Self, MarketDataError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(MarketDataError::InvalidInput("symbol is required".to_string()));
        }

        let (ticker, suffix) = match normalized.split_once('.') {
            Some((ticker, suffix)) => (ticker, Some(suffix)),
            None => (normalized.as_str(), None),
        };

        let ticker_ok = !ticker.is_empty()
            && ticker.len() <= MAX_TICKER_LEN
            && ticker.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        let suffix_ok = suffix.map_or(true, |s| {
            !s.is_empty() && s.len() <= MAX_SUFFIX_LEN && s.bytes().all(|b| b.is_ascii_uppercase())
        });

        if !ticker_ok || !suffix_ok {
            return Err(MarketDataError::InvalidInput(format!(
                "invalid symbol: {}",
                raw.trim()
            )));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = MarketDataError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
