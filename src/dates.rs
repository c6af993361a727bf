//! Date and rental-duration utilities.
//!
//! Every calendar date handled by the pricing, availability and booking layers is
//! a `NaiveDate` built from its `YYYY-MM-DD` components. Nothing is routed through
//! a UTC instant, so a date never drifts by a day for renters west of UTC.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Longest rental accepted, in billable days
pub const MAX_RENTAL_DAYS: u32 = 365;

/// Pickup and return time used when the renter did not choose one (10:00).
pub fn default_rental_time() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default()
}

/// Number of billable days between pickup and return, rounded up.
///
/// Any positive partial day counts as a full day. The result is not validated:
/// inverted or same-instant windows yield zero or a negative count. Use
/// [`RentalWindow::new`] when the value is going to be billed.
pub fn calculate_rental_duration(
    start_date: NaiveDate,
    end_date: NaiveDate,
    pickup_time: Option<NaiveTime>,
    return_time: Option<NaiveTime>,
) -> i64 {
    let start = start_date.and_time(pickup_time.unwrap_or_else(default_rental_time));
    let end = end_date.and_time(return_time.unwrap_or_else(default_rental_time));
    ceil_div((end - start).num_seconds(), SECONDS_PER_DAY)
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    if numerator % denominator > 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Parse a `YYYY-MM-DD` string into the calendar date it names.
pub fn parse_date_in_local_timezone(value: &str) -> Result<NaiveDate> {
    let invalid = || AppError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", value));

    let mut parts = value.trim().splitn(3, '-');
    let year = parts
        .next()
        .and_then(|p| p.parse::<i32>().ok())
        .ok_or_else(invalid)?;
    let month = parts
        .next()
        .and_then(|p| p.parse::<u32>().ok())
        .ok_or_else(invalid)?;
    let day = parts
        .next()
        .and_then(|p| p.parse::<u32>().ok())
        .ok_or_else(invalid)?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parse a clock time in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| AppError::InvalidInput(format!("Invalid time '{}', expected HH:MM", value)))
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Serde adapter routing request dates through [`parse_date_in_local_timezone`].
pub fn deserialize_local_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_in_local_timezone(&raw).map_err(serde::de::Error::custom)
}

/// Serde adapter for optional `HH:MM` request times.
pub fn deserialize_optional_time<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_time_of_day(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// A validated pickup/return window with at least one billable day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RentalWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub return_time: NaiveTime,
    pub rental_days: u32,
}

impl RentalWindow {
    /// Build a window, rejecting return instants at or before pickup and
    /// rentals longer than [`MAX_RENTAL_DAYS`].
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        pickup_time: Option<NaiveTime>,
        return_time: Option<NaiveTime>,
    ) -> Result<Self> {
        let pickup_time = pickup_time.unwrap_or_else(default_rental_time);
        let return_time = return_time.unwrap_or_else(default_rental_time);
        let days = calculate_rental_duration(start_date, end_date, Some(pickup_time), Some(return_time));

        if days <= 0 {
            return Err(AppError::InvalidInput(format!(
                "Return {} {} must be after pickup {} {}",
                format_date(end_date),
                return_time.format("%H:%M"),
                format_date(start_date),
                pickup_time.format("%H:%M"),
            )));
        }

        let rental_days = u32::try_from(days)
            .ok()
            .filter(|d| *d <= MAX_RENTAL_DAYS)
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Rental window of {} days exceeds the {} day maximum",
                    days, MAX_RENTAL_DAYS
                ))
            })?;

        Ok(Self {
            start_date,
            end_date,
            pickup_time,
            return_time,
            rental_days,
        })
    }

    pub fn pickup_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.pickup_time)
    }

    pub fn return_at(&self) -> NaiveDateTime {
        self.end_date.and_time(self.return_time)
    }

    /// Calendar days billed for this window, starting at the pickup date.
    pub fn billable_dates(&self) -> impl Iterator<Item = NaiveDate> {
        self.start_date.iter_days().take(self.rental_days as usize)
    }
}
