//! Database queries for the rental catalog: cars, locations and extras

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Car, Extra, Location};

/// Get a car by id
pub async fn get_car<'e, E>(executor: E, car_id: Uuid) -> Result<Car>
where
    E: PgExecutor<'e>,
{
    let car = sqlx::query_as::<_, Car>(
        r#"
        SELECT
            id, make, model, year, price_per_day, category,
            seats, doors, transmission, fuel_type, image_urls, available
        FROM cars
        WHERE id = $1
        "#,
    )
    .bind(car_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Car {}", car_id)))?;

    Ok(car)
}

/// Cars flagged as available for rent, cheapest base rate first
pub async fn list_available_cars(pool: &PgPool) -> Result<Vec<Car>> {
    let cars = sqlx::query_as::<_, Car>(
        r#"
        SELECT
            id, make, model, year, price_per_day, category,
            seats, doors, transmission, fuel_type, image_urls, available
        FROM cars
        WHERE available = true
        ORDER BY price_per_day, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(cars)
}

/// Get an active location by id
pub async fn get_location(pool: &PgPool, location_id: Uuid) -> Result<Location> {
    let location = sqlx::query_as::<_, Location>(
        r#"
        SELECT id, name, category, delivery_fee, active
        FROM locations
        WHERE id = $1
          AND active = true
        "#,
    )
    .bind(location_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Location {}", location_id)))?;

    Ok(location)
}

/// All active extras
pub async fn list_active_extras(pool: &PgPool) -> Result<Vec<Extra>> {
    let extras = sqlx::query_as::<_, Extra>(
        r#"
        SELECT
            id, name, price, price_type, category,
            stock_quantity, max_per_booking, active
        FROM extras
        WHERE active = true
        ORDER BY category, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(extras)
}
