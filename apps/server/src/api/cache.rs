use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::post,
    Json, Router,
};
use pricecache_market_data::Symbol;

use super::prices::query;
use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use crate::models::{InvalidateParams, InvalidationResponse, SuccessEnvelope};

/// Flush the whole cache, or only the entries of `?symbol=`.
async fn invalidate_cache(
    State(state): State<Arc<AppState>>,
    params: Result<Query<InvalidateParams>, QueryRejection>,
) -> ApiResult<Json<SuccessEnvelope<InvalidationResponse>>> {
    let params = query(params)?;
    let symbol = params
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let response = match symbol {
        Some(raw) => {
            let symbol = Symbol::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;
            let removed = state.price_service.invalidate_symbol(&symbol).await?;
            tracing::info!(symbol = %symbol, removed, "Cache invalidated for symbol");
            InvalidationResponse {
                message: format!("Cache invalidated for {}", symbol),
                removed: Some(removed),
            }
        }
        None => {
            state.price_service.invalidate_all().await?;
            tracing::info!("Cache invalidated");
            InvalidationResponse {
                message: "Cache invalidated".to_string(),
                removed: None,
            }
        }
    };

    Ok(Json(SuccessEnvelope::stamped(response)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/invalid-cache", post(invalidate_cache))
}
