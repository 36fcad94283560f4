//! Wire types for the HTTP surface.

use chrono::{DateTime, Utc};
use pricecache_market_data::ErrorKind;
use serde::{Deserialize, Serialize};

/// `{success: true, data, timestamp?}`
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl<T: Serialize> SuccessEnvelope<T> {
    /// Envelope without a timestamp, so identical data serializes identically.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: None,
        }
    }

    /// Envelope stamped with the current time.
    pub fn stamped(data: T) -> Self {
        Self {
            timestamp: Some(Utc::now()),
            ..Self::new(data)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
}

/// `{success: false, error: {code, message}}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InvalidationResponse {
    pub message: String,
    /// Keys removed, for symbol-scoped invalidation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrentPriceParams {
    pub symbols: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoricalParams {
    pub symbol: Option<String>,
    pub resolution: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvalidateParams {
    pub symbol: Option<String>,
}
