//! Booking route handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::models::Booking;
use super::requests::{ConfirmBookingRequest, CreateBookingRequest, ListBookingsQuery};
use super::responses::{BookingDetails, BookingListResponse, PaymentIntentResponse};
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_bookings))
        .route("/api/bookings/:id", get(get_booking))
        .route("/api/bookings/:id/payment-intent", post(create_payment_intent))
        .route("/api/bookings/:id/confirm", post(confirm_booking))
        .route("/api/bookings/:id/payment-status", post(payment_status))
        .route("/api/bookings/:id/cancel", post(cancel_booking))
        .route("/api/bookings/:id/complete", post(complete_booking))
}

/// Open a draft booking
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingDetails>)> {
    let details = services::create_draft_booking(
        &state.db,
        &state.cache,
        state.platform.as_ref(),
        &state.config,
        request,
        Utc::now(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(details)))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<BookingListResponse>> {
    let bookings = services::list_active_bookings(&state.db, query.renter_id, Utc::now()).await?;
    Ok(Json(BookingListResponse { bookings }))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetails>> {
    Ok(Json(services::get_booking_details(&state.db, booking_id).await?))
}

async fn create_payment_intent(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<PaymentIntentResponse>> {
    let intent = services::attach_payment_intent(
        &state.db,
        state.platform.as_ref(),
        &state.config,
        booking_id,
        Utc::now(),
    )
    .await?;

    Ok(Json(PaymentIntentResponse { booking_id, intent }))
}

/// Client-side payment succeeded; verify and confirm
async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<ConfirmBookingRequest>,
) -> Result<Json<Booking>> {
    let booking = services::confirm_paid_booking(
        &state.db,
        state.platform.as_ref(),
        booking_id,
        &request.payment_intent_id,
        Utc::now(),
    )
    .await?;

    Ok(Json(booking))
}

/// Poll the payment processor for a booking still in draft
async fn payment_status(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = services::reconcile_payment_status(
        &state.db,
        state.platform.as_ref(),
        booking_id,
        Utc::now(),
    )
    .await?;

    Ok(Json(booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = services::cancel_booking(&state.db, booking_id, Utc::now()).await?;
    state.cache.invalidate_availability(booking.car_id);
    Ok(Json(booking))
}

async fn complete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Booking>> {
    Ok(Json(services::complete_booking(&state.db, booking_id, Utc::now()).await?))
}
