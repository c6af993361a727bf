//! Booking lookups used by availability checks

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::booking::models::Booking;
use crate::error::AppError;

pub(crate) const BOOKING_COLUMNS: &str = r#"
    id, car_id, renter_id, start_date, end_date, pickup_time, return_time,
    pickup_location_id, return_location_id, status, expires_at,
    car_rental_subtotal, pickup_delivery_fee, return_delivery_fee,
    extras_total, discount_amount, grand_total, requires_delivery_quote,
    payment_intent_id, discount_code_id, created_at, updated_at
"#;

/// Bookings that hold `car_id` on any calendar day of `[start, end]`.
///
/// Confirmed bookings and drafts still inside their hold period. The exact
/// time-of-day overlap is checked by the caller.
pub async fn find_blocking_bookings<'e, E>(
    executor: E,
    car_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Vec<Booking>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {}
        FROM bookings
        WHERE car_id = $1
          AND start_date <= $3
          AND end_date >= $2
          AND (
                status = 'confirmed'
             OR (status = 'draft' AND expires_at > $4)
          )
        ORDER BY start_date, pickup_time
        "#,
        BOOKING_COLUMNS
    );

    let bookings = sqlx::query_as::<_, Booking>(&sql)
        .bind(car_id)
        .bind(start)
        .bind(end)
        .bind(now)
        .fetch_all(executor)
        .await?;

    Ok(bookings)
}
