//! Response DTOs for booking endpoints.

use serde::Serialize;

use crate::platform::PaymentIntent;

use super::models::{Booking, BookingExtraRecord};

/// A booking with its stored extras
#[derive(Debug, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub extras: Vec<BookingExtraRecord>,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
}

/// Payment intent handed to the client for card entry
#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub booking_id: uuid::Uuid,
    #[serde(flatten)]
    pub intent: PaymentIntent,
}
