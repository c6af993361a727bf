//! Booking service functions with database access.
//!
//! Creating a draft re-checks availability inside a transaction that holds the
//! car row lock, so two renters racing for the same dates cannot both get a
//! draft. Status changes lock the booking row and are guarded on the status
//! they were read with.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::{self, queries::find_blocking_bookings};
use crate::cache::AppCache;
use crate::checkout::compute_totals;
use crate::config::Config;
use crate::db;
use crate::delivery::{calculate_delivery_fee_by_id, DeliveryQuote};
use crate::error::{AppError, Result};
use crate::extras::{calculate_total, SelectedExtras};
use crate::models::Car;
use crate::platform::schemas::{PaymentIntentRequest, PaymentMetadata};
use crate::platform::{DiscountCode, DiscountValidation, PaymentIntent, PaymentStatus, PlatformApi};
use crate::pricing::services::authoritative_subtotal;

use super::models::{filter_active_bookings, Booking, BookingStatus, NewDraft};
use super::queries;
use super::requests::CreateBookingRequest;
use super::responses::BookingDetails;

/// Pickup/return pair to charge delivery for.
///
/// A single location given on either side is used for both ends.
pub fn resolve_locations(pickup: Option<Uuid>, return_location: Option<Uuid>) -> Option<(Uuid, Uuid)> {
    match (pickup, return_location) {
        (Some(p), Some(r)) => Some((p, r)),
        (Some(id), None) | (None, Some(id)) => Some((id, id)),
        (None, None) => None,
    }
}

/// Validate an optional discount code with the platform.
///
/// Blank codes are ignored. A code the platform rejects is invalid input.
pub async fn resolve_discount(
    platform: &dyn PlatformApi,
    code: Option<&str>,
) -> Result<Option<DiscountCode>> {
    let code = match code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => code,
        None => return Ok(None),
    };

    match platform.validate_discount_code(code).await? {
        DiscountValidation::Valid { discount, .. } => Ok(Some(discount)),
        DiscountValidation::Invalid { message } => Err(AppError::InvalidInput(message)),
    }
}

/// Open a draft booking holding the car for the configured TTL.
pub async fn create_draft_booking(
    pool: &PgPool,
    cache: &AppCache,
    platform: &dyn PlatformApi,
    config: &Config,
    request: CreateBookingRequest,
    now: DateTime<Utc>,
) -> Result<BookingDetails> {
    let window = request.window()?;

    let car = db::get_car(pool, request.car_id).await?;
    if !car.available {
        return Err(AppError::InvalidInput(format!(
            "Car {} is not offered for rent",
            car.id
        )));
    }

    let locations = resolve_locations(request.pickup_location_id, request.return_location_id);
    let delivery = match locations {
        Some((pickup_id, return_id)) => {
            calculate_delivery_fee_by_id(pool, cache, pickup_id, return_id).await?
        }
        None => DeliveryQuote::none(),
    };

    let catalog = cache.active_extras(pool).await?;
    let selected = SelectedExtras::from_selections(&catalog, &request.extras)?;
    let extras = calculate_total(&selected, window.rental_days);

    let discount = resolve_discount(platform, request.discount_code.as_deref()).await?;

    let subtotal = authoritative_subtotal(pool, &car, &window).await?;
    let totals = compute_totals(subtotal, &delivery, &extras, discount.as_ref());

    let mut tx = pool.begin().await?;

    queries::lock_car(&mut *tx, car.id).await?;
    let holding =
        find_blocking_bookings(&mut *tx, car.id, window.start_date, window.end_date, now).await?;
    if !availability::is_window_free(&holding, &window, now, None) {
        warn!(
            "Booking rejected: car {} already held between {} and {}",
            car.id,
            window.pickup_at(),
            window.return_at()
        );
        return Err(AppError::Conflict(format!(
            "Car {} is no longer available for the selected dates",
            car.id
        )));
    }

    let booking = Booking::new_draft(
        NewDraft {
            car_id: car.id,
            renter_id: request.renter_id,
            window,
            pickup_location_id: locations.map(|(p, _)| p),
            return_location_id: locations.map(|(_, r)| r),
            totals,
            discount_code_id: discount.as_ref().map(|d| d.id),
        },
        now,
        config.draft_ttl,
    );

    queries::insert_booking(&mut *tx, &booking).await?;
    let records = selected.to_booking_extra_records(booking.id, window.rental_days);
    for record in &records {
        queries::insert_booking_extra(&mut *tx, record).await?;
    }

    tx.commit().await?;
    cache.invalidate_availability(car.id);

    info!(
        "Draft booking {} created for car {} ({} days, total {}), expires at {:?}",
        booking.id, car.id, window.rental_days, booking.grand_total, booking.expires_at
    );

    Ok(BookingDetails {
        booking,
        extras: records,
    })
}

/// A renter's bookings without lapsed drafts
pub async fn list_active_bookings(
    pool: &PgPool,
    renter_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<Booking>> {
    let bookings = queries::list_bookings_for_renter(pool, renter_id, now).await?;
    Ok(filter_active_bookings(bookings, now))
}

/// A booking with its extras
pub async fn get_booking_details(pool: &PgPool, booking_id: Uuid) -> Result<BookingDetails> {
    let booking = queries::get_booking(pool, booking_id, false).await?;
    let extras = queries::list_booking_extras(pool, booking_id).await?;
    Ok(BookingDetails { booking, extras })
}

/// Only a draft still inside its hold, with no intent yet, can be paid for
pub fn ensure_payable(booking: &Booking, now: DateTime<Utc>) -> Result<()> {
    if booking.is_live_draft(now) {
        if let Some(existing) = &booking.payment_intent_id {
            return Err(AppError::Conflict(format!(
                "Booking {} already has payment intent {}",
                booking.id, existing
            )));
        }
        return Ok(());
    }
    if booking.is_expired_draft(now) {
        return Err(AppError::Conflict(format!(
            "Booking {} expired, start a new booking",
            booking.id
        )));
    }
    Err(AppError::Conflict(format!(
        "Booking {} is {} and cannot be paid",
        booking.id, booking.status
    )))
}

pub fn payment_metadata(booking: &Booking, car: &Car, currency: &str) -> PaymentMetadata {
    PaymentMetadata {
        car: car.display_name(),
        start_date: booking.start_date,
        end_date: booking.end_date,
        grand_total: booking.grand_total,
        currency: currency.to_string(),
    }
}

/// Create a payment intent for a live draft and remember its id.
///
/// The draft row stays locked until the intent is stored, so the booking can
/// neither lapse into a cancel nor receive a second intent in between. A draft
/// that already has an intent is refused.
pub async fn attach_payment_intent(
    pool: &PgPool,
    platform: &dyn PlatformApi,
    config: &Config,
    booking_id: Uuid,
    now: DateTime<Utc>,
) -> Result<PaymentIntent> {
    let mut tx = pool.begin().await?;
    let booking = queries::get_booking(&mut *tx, booking_id, true).await?;
    ensure_payable(&booking, now)?;

    let car = db::get_car(&mut *tx, booking.car_id).await?;
    let request = PaymentIntentRequest {
        booking_id,
        metadata: payment_metadata(&booking, &car, &config.currency),
    };

    let intent = platform.create_payment_intent(&request).await?;
    queries::set_payment_intent(&mut *tx, booking_id, &intent.payment_intent_id, now).await?;

    tx.commit().await?;

    info!(
        "Payment intent {} attached to booking {}",
        intent.payment_intent_id, booking_id
    );
    Ok(intent)
}

/// Confirm a draft against the payment intent that paid for it.
///
/// Confirming an already confirmed booking with the same intent is a no-op.
pub async fn confirm_booking(
    pool: &PgPool,
    booking_id: Uuid,
    payment_intent_id: &str,
    now: DateTime<Utc>,
) -> Result<Booking> {
    let mut tx = pool.begin().await?;
    let mut booking = queries::get_booking(&mut *tx, booking_id, true).await?;

    if booking.status == BookingStatus::Confirmed
        && booking.payment_intent_id.as_deref() == Some(payment_intent_id)
    {
        return Ok(booking);
    }

    let previous = booking.status;
    booking.confirm(payment_intent_id, now)?;
    queries::update_status(&mut *tx, &booking, previous).await?;
    reserve_stock(&mut tx, booking_id).await?;

    tx.commit().await?;

    info!("Booking {} confirmed with payment {}", booking_id, payment_intent_id);
    Ok(booking)
}

/// Confirm after the client reports success, checked with the payment processor.
pub async fn confirm_paid_booking(
    pool: &PgPool,
    platform: &dyn PlatformApi,
    booking_id: Uuid,
    payment_intent_id: &str,
    now: DateTime<Utc>,
) -> Result<Booking> {
    match platform.check_payment_status(booking_id).await? {
        PaymentStatus::Succeeded { payment_intent_id: Some(reported) }
            if reported != payment_intent_id =>
        {
            Err(AppError::Conflict(format!(
                "Payment {} was not made for booking {}",
                payment_intent_id, booking_id
            )))
        }
        PaymentStatus::Succeeded { .. } => {
            confirm_booking(pool, booking_id, payment_intent_id, now).await
        }
        PaymentStatus::Pending => Err(AppError::Conflict(format!(
            "Payment for booking {} has not completed",
            booking_id
        ))),
    }
}

/// Poll the payment processor and confirm the booking once it has been paid.
///
/// A pending payment leaves the booking unchanged.
pub async fn reconcile_payment_status(
    pool: &PgPool,
    platform: &dyn PlatformApi,
    booking_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Booking> {
    let booking = queries::get_booking(pool, booking_id, false).await?;
    if booking.status != BookingStatus::Draft {
        return Ok(booking);
    }

    match platform.check_payment_status(booking_id).await? {
        PaymentStatus::Pending => Ok(booking),
        PaymentStatus::Succeeded { payment_intent_id } => {
            let intent = payment_intent_id
                .or_else(|| booking.payment_intent_id.clone())
                .ok_or_else(|| {
                    AppError::Conflict(format!("Booking {} has no payment intent", booking_id))
                })?;
            confirm_booking(pool, booking_id, &intent, now).await
        }
    }
}

/// Cancel a draft or confirmed booking. Stock taken at confirmation is returned.
pub async fn cancel_booking(pool: &PgPool, booking_id: Uuid, now: DateTime<Utc>) -> Result<Booking> {
    end_booking(pool, booking_id, Booking::cancel, now).await
}

/// Close a confirmed rental once the car is back. Its extras return to stock.
pub async fn complete_booking(pool: &PgPool, booking_id: Uuid, now: DateTime<Utc>) -> Result<Booking> {
    end_booking(pool, booking_id, Booking::complete, now).await
}

async fn end_booking(
    pool: &PgPool,
    booking_id: Uuid,
    transition: fn(&mut Booking, DateTime<Utc>) -> Result<()>,
    now: DateTime<Utc>,
) -> Result<Booking> {
    let mut tx = pool.begin().await?;
    let mut booking = queries::get_booking(&mut *tx, booking_id, true).await?;

    let previous = booking.status;
    transition(&mut booking, now)?;
    queries::update_status(&mut *tx, &booking, previous).await?;
    if previous.returns_stock_on(booking.status) {
        release_stock(&mut tx, booking_id).await?;
    }

    tx.commit().await?;

    info!("Booking {} {} (was {})", booking_id, booking.status, previous);
    Ok(booking)
}

async fn reserve_stock(conn: &mut PgConnection, booking_id: Uuid) -> Result<()> {
    let records = queries::list_booking_extras(&mut *conn, booking_id).await?;
    for record in records {
        let taken = queries::reserve_extra_stock(&mut *conn, record.extra_id, record.quantity).await?;
        if taken < record.quantity {
            warn!(
                "Extra {} short by {} units for booking {}",
                record.extra_id,
                record.quantity - taken,
                booking_id
            );
        }
    }
    Ok(())
}

async fn release_stock(conn: &mut PgConnection, booking_id: Uuid) -> Result<()> {
    let records = queries::list_booking_extras(&mut *conn, booking_id).await?;
    for record in records {
        queries::release_extra_stock(&mut *conn, record.extra_id, record.quantity).await?;
    }
    Ok(())
}
