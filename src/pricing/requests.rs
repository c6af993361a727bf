//! Request DTOs for pricing API endpoints.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::dates::{deserialize_local_date, deserialize_optional_time, RentalWindow};
use crate::error::Result;

/// Pickup/return window from the query string.
///
/// Times default to 10:00 when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowQuery {
    #[serde(deserialize_with = "deserialize_local_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_local_date")]
    pub end_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub pickup_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub return_time: Option<NaiveTime>,
}

impl WindowQuery {
    pub fn window(&self) -> Result<RentalWindow> {
        RentalWindow::new(self.start_date, self.end_date, self.pickup_time, self.return_time)
    }
}
