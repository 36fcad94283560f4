use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use pricecache_core::prices::parse_symbol_list;
use pricecache_core::HistoricalQuery;
use pricecache_market_data::{CurrentPrice, HistoricalSeries};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use crate::models::{CurrentPriceParams, HistoricalParams, SuccessEnvelope};

pub(super) fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(inner)| inner)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

async fn get_current_prices(
    State(state): State<Arc<AppState>>,
    params: Result<Query<CurrentPriceParams>, QueryRejection>,
) -> ApiResult<Json<SuccessEnvelope<Vec<CurrentPrice>>>> {
    let params = query(params)?;
    let symbols = parse_symbol_list(params.symbols.as_deref().unwrap_or_default())?;
    let prices = state.price_service.get_current_prices(&symbols).await?;
    Ok(Json(SuccessEnvelope::stamped(prices)))
}

async fn get_historical_prices(
    State(state): State<Arc<AppState>>,
    params: Result<Query<HistoricalParams>, QueryRejection>,
) -> ApiResult<Json<SuccessEnvelope<HistoricalSeries>>> {
    let params = query(params)?;
    let query = HistoricalQuery::from_params(
        params.symbol.as_deref(),
        params.resolution.as_deref(),
        params.date.as_deref(),
        params.from.as_deref(),
        params.to.as_deref(),
        Utc::now().date_naive(),
    )?;
    let series = state.price_service.get_historical_prices(&query).await?;
    // No timestamp: repeated reads of a warm window stay byte-identical
    Ok(Json(SuccessEnvelope::new(series)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/price/current", get(get_current_prices))
        .route("/price/historical", get(get_historical_prices))
}
