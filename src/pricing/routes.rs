//! Pricing route handlers

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::requests::WindowQuery;
use super::responses::PriceQuoteResponse;
use super::services::calculate_price_with_breakdown;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cars/:id/price", get(car_price))
}

/// Day-by-day price of a car for a window
async fn car_price(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<PriceQuoteResponse>> {
    let window = query.window()?;

    let quote = calculate_price_with_breakdown(
        &state.db,
        &state.cache,
        car_id,
        &window,
        state.config.pricing_timeout,
    )
    .await?;

    Ok(Json(PriceQuoteResponse::new(quote, window, &state.config.currency)))
}
