use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::require_api_key;
use crate::main_lib::AppState;
use crate::rate_limiter::enforce_rate_limit;

mod cache;
mod health;
mod prices;

/// Full router: `/health` is open, `/api/v1/*` needs an API key, and
/// everything is rate limited per client IP.
pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(prices::router())
        .merge(cache::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .merge(health::router())
        .nest("/api/v1", api)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, enforce_rate_limit))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
}
