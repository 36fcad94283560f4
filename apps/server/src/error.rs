use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pricecache_core::PriceServiceError;
use pricecache_market_data::ErrorKind;
use thiserror::Error;

use crate::models::ErrorEnvelope;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] PriceServiceError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Rate limit exceeded")]
    RateLimited,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Service(e) => e.kind(),
            ApiError::BadRequest(_) => ErrorKind::InvalidInput,
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::RateLimited => ErrorKind::RateLimitExceeded,
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::SymbolNotFound => StatusCode::NOT_FOUND,
        ErrorKind::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ServiceUnavailable | ErrorKind::MarketClosed => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = %kind, error = %message, "Request failed");
        } else {
            tracing::debug!(code = %kind, error = %message, "Request rejected");
        }

        (status, Json(ErrorEnvelope::new(kind, message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
