//! Database queries for the pricing engine.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::SeasonalPricing;

/// All active overrides for a car, highest priority first
pub async fn find_seasonal_pricings_for_car(
    pool: &PgPool,
    car_id: Uuid,
) -> Result<Vec<SeasonalPricing>, AppError> {
    let pricings = sqlx::query_as::<_, SeasonalPricing>(
        r#"
        SELECT
            id, car_id, name, valid_from, valid_to,
            price_per_day, priority, active, created_at
        FROM seasonal_pricing
        WHERE car_id = $1
          AND active = true
        ORDER BY priority DESC, created_at DESC, id ASC
        "#,
    )
    .bind(car_id)
    .fetch_all(pool)
    .await?;

    Ok(pricings)
}

/// Active overrides for a car that touch any day of `[start, end]`
pub async fn find_seasonal_pricings_in_range(
    pool: &PgPool,
    car_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<SeasonalPricing>, AppError> {
    let pricings = sqlx::query_as::<_, SeasonalPricing>(
        r#"
        SELECT
            id, car_id, name, valid_from, valid_to,
            price_per_day, priority, active, created_at
        FROM seasonal_pricing
        WHERE car_id = $1
          AND active = true
          AND valid_from <= $3
          AND valid_to >= $2
        ORDER BY priority DESC, created_at DESC, id ASC
        "#,
    )
    .bind(car_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(pricings)
}
