use std::sync::Arc;

use axum::{routing::get, Json, Router};

use crate::main_lib::{AppState, SERVICE_NAME, SERVICE_VERSION};
use crate::models::HealthResponse;

/// Liveness only: answers without touching the cache or any upstream.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
