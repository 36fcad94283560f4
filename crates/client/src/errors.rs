use pricecache_market_data::{CircuitOpenError, ErrorKind, RetryClass, Retryable};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by [`crate::PriceServiceClient`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// The service answered with an error envelope.
    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: ErrorKind,
        message: String,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    /// The response did not match the envelope format.
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Circuit breaker is open: {0}")]
    CircuitOpen(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { code, .. } => *code,
            Self::Config(_) => ErrorKind::InvalidInput,
            Self::Transport(_) | Self::Timeout | Self::Decode(_) | Self::CircuitOpen(_) => {
                ErrorKind::ServiceUnavailable
            }
        }
    }
}

impl Retryable for ClientError {
    fn retry_class(&self) -> RetryClass {
        match self {
            Self::Transport(_) | Self::Timeout => RetryClass::WithBackoff,
            Self::Api { status, .. } if *status == 429 || *status >= 500 => RetryClass::WithBackoff,
            Self::CircuitOpen(_) => RetryClass::CircuitOpen,
            Self::Api { .. } | Self::Decode(_) | Self::Config(_) => RetryClass::Never,
        }
    }
}

impl From<CircuitOpenError> for ClientError {
    fn from(err: CircuitOpenError) -> Self {
        Self::CircuitOpen(err.name)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}
