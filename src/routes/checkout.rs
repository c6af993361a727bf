//! Checkout helper route handlers: extras, delivery and discounts

use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::delivery::{calculate_delivery_fee_by_id, DeliveryQuote};
use crate::error::{AppError, Result};
use crate::extras::{calculate_total, ExtraSelection, ExtrasTotal, SelectedExtras};
use crate::platform::DiscountValidation;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtrasTotalRequest {
    pub rental_days: u32,
    #[serde(default)]
    pub extras: Vec<ExtraSelection>,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryFeeRequest {
    pub pickup_location_id: Uuid,
    /// Defaults to the pickup location
    #[serde(default)]
    pub return_location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateDiscountBody {
    pub code: String,
}

/// Total of the selected extras for a rental length
pub async fn extras_total(
    State(state): State<AppState>,
    Json(request): Json<ExtrasTotalRequest>,
) -> Result<Json<ExtrasTotal>> {
    if request.rental_days == 0 {
        return Err(AppError::InvalidInput(
            "rental_days must be at least 1".to_string(),
        ));
    }
    if request.extras.is_empty() {
        return Ok(Json(ExtrasTotal::empty()));
    }

    let catalog = state.cache.active_extras(&state.db).await?;
    let selected = SelectedExtras::from_selections(&catalog, &request.extras)?;
    Ok(Json(calculate_total(&selected, request.rental_days)))
}

pub async fn delivery_fee(
    State(state): State<AppState>,
    Json(request): Json<DeliveryFeeRequest>,
) -> Result<Json<DeliveryQuote>> {
    let return_location_id = request
        .return_location_id
        .unwrap_or(request.pickup_location_id);

    let quote = calculate_delivery_fee_by_id(
        &state.db,
        &state.cache,
        request.pickup_location_id,
        return_location_id,
    )
    .await?;

    Ok(Json(quote))
}

/// Check a discount code with the platform
pub async fn validate_discount(
    State(state): State<AppState>,
    Json(body): Json<ValidateDiscountBody>,
) -> Result<Json<DiscountValidation>> {
    let code = body.code.trim();
    if code.is_empty() {
        return Err(AppError::InvalidInput("Discount code is empty".to_string()));
    }

    Ok(Json(state.platform.validate_discount_code(code).await?))
}
