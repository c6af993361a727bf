//! Request DTOs for booking endpoints.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::dates::{deserialize_local_date, deserialize_optional_time, RentalWindow};
use crate::error::Result;
use crate::extras::ExtraSelection;

/// Request to open a draft booking
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub renter_id: Uuid,
    #[serde(deserialize_with = "deserialize_local_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_local_date")]
    pub end_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub pickup_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub return_time: Option<NaiveTime>,
    #[serde(default)]
    pub pickup_location_id: Option<Uuid>,
    #[serde(default)]
    pub return_location_id: Option<Uuid>,
    #[serde(default)]
    pub extras: Vec<ExtraSelection>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

impl CreateBookingRequest {
    pub fn window(&self) -> Result<RentalWindow> {
        RentalWindow::new(self.start_date, self.end_date, self.pickup_time, self.return_time)
    }
}

/// Query for a renter's bookings
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub renter_id: Uuid,
}

/// Client report that a payment went through
#[derive(Debug, Deserialize)]
pub struct ConfirmBookingRequest {
    pub payment_intent_id: String,
}
