//! Availability route handler

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::dates::RentalWindow;
use crate::error::Result;
use crate::pricing::requests::WindowQuery;
use crate::AppState;

use super::check_availability_or_closed;

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub car_id: Uuid,
    pub available: bool,
    pub window: RentalWindow,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cars/:id/availability", get(car_availability))
}

async fn car_availability(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<AvailabilityResponse>> {
    let window = query.window()?;

    // 404 for unknown cars instead of a silent "unavailable"
    let car = state.cache.car(&state.db, car_id).await?;
    let available = car.available
        && check_availability_or_closed(
            &state.db,
            &state.cache,
            car_id,
            &window,
            Utc::now(),
            state.config.availability_timeout,
        )
        .await;

    Ok(Json(AvailabilityResponse {
        car_id,
        available,
        window,
    }))
}
