use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::main_lib::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Address of the connected peer, when the server was started with connect info.
pub fn peer_ip(request: &Request<Body>) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical())
}

fn is_loopback(ip: Option<IpAddr>) -> bool {
    ip.is_some_and(|ip| ip.is_loopback())
}

/// Admit loopback callers unconditionally; everyone else must present the
/// configured key. With no key configured only loopback callers get through.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = peer_ip(&request);
    if is_loopback(ip) {
        return Ok(next.run(request).await);
    }

    let Some(expected) = state.api_key.as_deref() else {
        tracing::warn!(peer = ?ip, "Rejected non-loopback request: no API key configured");
        return Err(ApiError::Unauthorized("API key required".to_string()));
    };

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("API key required".to_string()))?;

    if presented != expected {
        tracing::warn!(peer = ?ip, "Rejected request with invalid API key");
        return Err(ApiError::Unauthorized("Invalid API key".to_string()));
    }

    Ok(next.run(request).await)
}
