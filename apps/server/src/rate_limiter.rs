//! Per-client fixed-window rate limiting.
//!
//! Each client IP gets `requests` requests per `window`. Counters are kept in
//! memory and swept once a client has been idle for two windows.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::auth::peer_ip;
use crate::error::ApiError;
use crate::main_lib::AppState;

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct Visitor {
    window_start: Instant,
    count: u32,
    last_seen: Instant,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    visitors: RwLock<HashMap<IpAddr, Visitor>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            visitors: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request from `ip`. Returns false once the window is spent.
    pub async fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut visitors = self.visitors.write().await;
        let visitor = visitors.entry(ip).or_insert(Visitor {
            window_start: now,
            count: 0,
            last_seen: now,
        });

        if now.duration_since(visitor.window_start) >= self.config.window {
            visitor.window_start = now;
            visitor.count = 0;
        }
        visitor.last_seen = now;

        if visitor.count >= self.config.requests {
            return false;
        }
        visitor.count += 1;
        true
    }

    /// Drop clients idle for more than two windows. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let idle_limit = self.config.window.saturating_mul(2);
        let mut visitors = self.visitors.write().await;
        let before = visitors.len();
        visitors.retain(|_, v| v.last_seen.elapsed() <= idle_limit);
        before - visitors.len()
    }

    pub async fn tracked(&self) -> usize {
        self.visitors.read().await.len()
    }
}

/// Reject requests over the caller's budget with 429.
///
/// Requests without a peer address share one bucket.
pub async fn enforce_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = peer_ip(&request).unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.rate_limiter.allow(ip).await {
        tracing::info!(peer = %ip, "Rate limit exceeded");
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(requests: u32, window: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig { requests, window })
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[tokio::test]
    async fn test_fixed_window_per_client() {
        let limiter = limiter(2, Duration::from_secs(60));

        assert!(limiter.allow(ip(1)).await);
        assert!(limiter.allow(ip(1)).await);
        assert!(!limiter.allow(ip(1)).await);

        // Other clients have their own budget
        assert!(limiter.allow(ip(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.allow(ip(1)).await);
        assert!(!limiter.allow(ip(1)).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.allow(ip(1)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_idle_clients() {
        let limiter = limiter(5, Duration::from_secs(60));
        limiter.allow(ip(1)).await;

        tokio::time::advance(Duration::from_secs(90)).await;
        limiter.allow(ip(2)).await;
        assert_eq!(limiter.sweep().await, 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(limiter.sweep().await, 1);
        assert_eq!(limiter.tracked().await, 1);
    }
}
