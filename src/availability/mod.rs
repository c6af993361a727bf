//! Availability of a car for a pickup/return window.
//!
//! Two bookings collide when their `[pickup, return)` instants overlap, so a
//! car returned at 10:00 can be picked up again at 10:00 the same day.

pub mod queries;
pub mod routes;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::booking::models::Booking;
use crate::cache::AppCache;
use crate::dates::RentalWindow;
use crate::error::Result;

pub use routes::router;

/// Half-open interval overlap of `[a_start, a_end)` and `[b_start, b_end)`
pub fn windows_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Whether `booking` holds the car during any part of `window`
pub fn conflicts_with(booking: &Booking, window: &RentalWindow, now: DateTime<Utc>) -> bool {
    booking.blocks_availability(now)
        && windows_overlap(
            booking.pickup_at(),
            booking.return_at(),
            window.pickup_at(),
            window.return_at(),
        )
}

/// No blocking booking other than `exclude` overlaps the window
pub fn is_window_free(
    bookings: &[Booking],
    window: &RentalWindow,
    now: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> bool {
    !bookings
        .iter()
        .filter(|b| Some(b.id) != exclude)
        .any(|b| conflicts_with(b, window, now))
}

/// Check whether a car is free for the window.
pub async fn is_car_available(
    pool: &PgPool,
    car_id: Uuid,
    window: &RentalWindow,
    now: DateTime<Utc>,
) -> Result<bool> {
    let bookings =
        queries::find_blocking_bookings(pool, car_id, window.start_date, window.end_date, now).await?;
    Ok(is_window_free(&bookings, window, now, None))
}

/// Availability for listings: any failure or timeout counts as unavailable.
///
/// Repeated checks for the same car and window share one cached lookup.
pub async fn check_availability_or_closed(
    pool: &PgPool,
    cache: &AppCache,
    car_id: Uuid,
    window: &RentalWindow,
    now: DateTime<Utc>,
    limit: Duration,
) -> bool {
    match tokio::time::timeout(limit, cache.car_availability(pool, car_id, window, now)).await {
        Ok(Ok(available)) => available,
        Ok(Err(e)) => {
            warn!("Availability check failed for car {}, treating as unavailable: {}", car_id, e);
            false
        }
        Err(_) => {
            warn!(
                "Availability check timed out after {:?} for car {}, treating as unavailable",
                limit, car_id
            );
            false
        }
    }
}
