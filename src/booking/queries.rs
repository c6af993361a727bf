//! Database queries for bookings and their extras

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::availability::queries::BOOKING_COLUMNS;
use crate::error::{AppError, Result};

use super::models::{Booking, BookingExtraRecord, BookingStatus};

/// Lock a car row so concurrent booking attempts for it run one at a time
pub async fn lock_car<'e, E>(executor: E, car_id: Uuid) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM cars WHERE id = $1 FOR UPDATE")
        .bind(car_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Car {}", car_id)))?;

    Ok(())
}

/// Get a booking by id, optionally locking the row
pub async fn get_booking<'e, E>(executor: E, booking_id: Uuid, for_update: bool) -> Result<Booking>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM bookings WHERE id = $1{}",
        BOOKING_COLUMNS,
        if for_update { " FOR UPDATE" } else { "" }
    );

    sqlx::query_as::<_, Booking>(&sql)
        .bind(booking_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {}", booking_id)))
}

/// A renter's bookings, newest first, without lapsed drafts
pub async fn list_bookings_for_renter(
    pool: &PgPool,
    renter_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<Booking>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM bookings
        WHERE renter_id = $1
          AND NOT (status = 'draft' AND (expires_at IS NULL OR expires_at <= $2))
        ORDER BY start_date DESC, created_at DESC
        "#,
        BOOKING_COLUMNS
    );

    let bookings = sqlx::query_as::<_, Booking>(&sql)
        .bind(renter_id)
        .bind(now)
        .fetch_all(pool)
        .await?;

    Ok(bookings)
}

/// Insert a new booking row
pub async fn insert_booking<'e, E>(executor: E, booking: &Booking) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, car_id, renter_id, start_date, end_date, pickup_time, return_time,
            pickup_location_id, return_location_id, status, expires_at,
            car_rental_subtotal, pickup_delivery_fee, return_delivery_fee,
            extras_total, discount_amount, grand_total, requires_delivery_quote,
            payment_intent_id, discount_code_id, created_at, updated_at
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
            $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
        )
        "#,
    )
    .bind(booking.id)
    .bind(booking.car_id)
    .bind(booking.renter_id)
    .bind(booking.start_date)
    .bind(booking.end_date)
    .bind(booking.pickup_time)
    .bind(booking.return_time)
    .bind(booking.pickup_location_id)
    .bind(booking.return_location_id)
    .bind(booking.status)
    .bind(booking.expires_at)
    .bind(booking.car_rental_subtotal)
    .bind(booking.pickup_delivery_fee)
    .bind(booking.return_delivery_fee)
    .bind(booking.extras_total)
    .bind(booking.discount_amount)
    .bind(booking.grand_total)
    .bind(booking.requires_delivery_quote)
    .bind(&booking.payment_intent_id)
    .bind(booking.discount_code_id)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Insert one booking_extras line
pub async fn insert_booking_extra<'e, E>(executor: E, record: &BookingExtraRecord) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO booking_extras (booking_id, extra_id, quantity, unit_price, total_price)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(record.booking_id)
    .bind(record.extra_id)
    .bind(record.quantity)
    .bind(record.unit_price)
    .bind(record.total_price)
    .execute(executor)
    .await?;

    Ok(())
}

/// All extras stored for a booking
pub async fn list_booking_extras<'e, E>(executor: E, booking_id: Uuid) -> Result<Vec<BookingExtraRecord>>
where
    E: PgExecutor<'e>,
{
    let records = sqlx::query_as::<_, BookingExtraRecord>(
        r#"
        SELECT booking_id, extra_id, quantity, unit_price, total_price
        FROM booking_extras
        WHERE booking_id = $1
        ORDER BY extra_id
        "#,
    )
    .bind(booking_id)
    .fetch_all(executor)
    .await?;

    Ok(records)
}

/// Persist a status change, guarded on the status it was read with.
///
/// Returns a conflict if another request changed the booking in between.
pub async fn update_status<'e, E>(executor: E, booking: &Booking, previous: BookingStatus) -> Result<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET status = $2, expires_at = $3, updated_at = $4
        WHERE id = $1 AND status = $5
        "#,
    )
    .bind(booking.id)
    .bind(booking.status)
    .bind(booking.expires_at)
    .bind(booking.updated_at)
    .bind(previous)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(format!(
            "Booking {} changed while being updated",
            booking.id
        )));
    }
    Ok(())
}

/// Store the payment intent created for a live draft.
///
/// Returns a conflict when the booking is no longer a live draft or already
/// carries an intent.
pub async fn set_payment_intent<'e, E>(
    executor: E,
    booking_id: Uuid,
    payment_intent_id: &str,
    now: DateTime<Utc>,
) -> Result<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE bookings
        SET payment_intent_id = $2, updated_at = $3
        WHERE id = $1
          AND status = 'draft'
          AND expires_at > $3
          AND payment_intent_id IS NULL
        "#,
    )
    .bind(booking_id)
    .bind(payment_intent_id)
    .bind(now)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict(format!(
            "Booking {} can no longer take a payment intent",
            booking_id
        )));
    }
    Ok(())
}

/// Take `quantity` units of a stock-tracked extra. Returns the units actually taken.
pub async fn reserve_extra_stock<'e, E>(executor: E, extra_id: Uuid, quantity: i32) -> Result<i32>
where
    E: PgExecutor<'e>,
{
    let taken = sqlx::query_scalar::<_, i32>(
        r#"
        WITH before AS (
            SELECT stock_quantity FROM extras WHERE id = $1 FOR UPDATE
        )
        UPDATE extras
        SET stock_quantity = GREATEST(extras.stock_quantity - $2, 0)
        FROM before
        WHERE extras.id = $1
          AND extras.stock_quantity IS NOT NULL
        RETURNING LEAST(before.stock_quantity, $2)
        "#,
    )
    .bind(extra_id)
    .bind(quantity)
    .fetch_optional(executor)
    .await?;

    Ok(taken.unwrap_or(quantity))
}

/// Return units of a stock-tracked extra
pub async fn release_extra_stock<'e, E>(executor: E, extra_id: Uuid, quantity: i32) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE extras
        SET stock_quantity = stock_quantity + $2
        WHERE id = $1
          AND stock_quantity IS NOT NULL
        "#,
    )
    .bind(extra_id)
    .bind(quantity)
    .execute(executor)
    .await?;

    Ok(())
}
