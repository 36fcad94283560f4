use std::time::Duration;

/// Default TTL for cached prices (15 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Default ceiling on symbols per current-price request.
pub const DEFAULT_MAX_SYMBOLS_PER_REQUEST: usize = 10;

/// Cache key prefix for current prices.
pub const CURRENT_KEY_PREFIX: &str = "current";

/// Cache key prefix for historical series.
pub const HISTORICAL_KEY_PREFIX: &str = "historical";
