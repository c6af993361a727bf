//! Booking model and its lifecycle.
//!
//! ```text
//! draft ──► confirmed ──► completed
//!   │           │
//!   └──► cancelled ◄──┘
//! ```
//!
//! A draft holds the car for a limited time. Once `expires_at` has passed the
//! draft no longer blocks availability and no longer shows up in listings.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::checkout::BookingTotals;
use crate::dates::RentalWindow;
use crate::error::{AppError, Result};

/// How long a draft holds the car before it lapses
pub const DEFAULT_DRAFT_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Draft,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Draft => "draft",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Extras taken at confirmation go back once a confirmed booking ends,
    /// whether it was cancelled or the rental completed.
    pub fn returns_stock_on(&self, next: BookingStatus) -> bool {
        *self == BookingStatus::Confirmed && next.is_terminal()
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Draft, Confirmed) | (Draft, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking from the bookings table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub car_id: Uuid,
    pub renter_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub return_time: NaiveTime,
    pub pickup_location_id: Option<Uuid>,
    pub return_location_id: Option<Uuid>,
    pub status: BookingStatus,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "rust_decimal::serde::str")]
    pub car_rental_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub pickup_delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub return_delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub extras_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub grand_total: Decimal,
    pub requires_delivery_quote: bool,
    pub payment_intent_id: Option<String>,
    pub discount_code_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to open a draft
#[derive(Debug, Clone)]
pub struct NewDraft {
    pub car_id: Uuid,
    pub renter_id: Uuid,
    pub window: RentalWindow,
    pub pickup_location_id: Option<Uuid>,
    pub return_location_id: Option<Uuid>,
    pub totals: BookingTotals,
    pub discount_code_id: Option<Uuid>,
}

impl Booking {
    /// New draft expiring `ttl` after `now`
    pub fn new_draft(draft: NewDraft, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            car_id: draft.car_id,
            renter_id: draft.renter_id,
            start_date: draft.window.start_date,
            end_date: draft.window.end_date,
            pickup_time: draft.window.pickup_time,
            return_time: draft.window.return_time,
            pickup_location_id: draft.pickup_location_id,
            return_location_id: draft.return_location_id,
            status: BookingStatus::Draft,
            expires_at: Some(now + ttl),
            car_rental_subtotal: draft.totals.car_rental_subtotal,
            pickup_delivery_fee: draft.totals.pickup_delivery_fee,
            return_delivery_fee: draft.totals.return_delivery_fee,
            extras_total: draft.totals.extras_total,
            discount_amount: draft.totals.discount_amount,
            grand_total: draft.totals.grand_total,
            requires_delivery_quote: draft.totals.requires_delivery_quote,
            payment_intent_id: None,
            discount_code_id: draft.discount_code_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pickup_at(&self) -> NaiveDateTime {
        self.start_date.and_time(self.pickup_time)
    }

    pub fn return_at(&self) -> NaiveDateTime {
        self.end_date.and_time(self.return_time)
    }

    /// A draft still inside its hold period
    pub fn is_live_draft(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Draft && self.expires_at.is_some_and(|at| now < at)
    }

    /// A draft whose hold has lapsed; treated as if it never existed
    pub fn is_expired_draft(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Draft && !self.is_live_draft(now)
    }

    /// Everything except a lapsed draft
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_draft(now)
    }

    /// Whether this booking holds the car
    pub fn blocks_availability(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Confirmed || self.is_live_draft(now)
    }

    fn transition(&mut self, next: BookingStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        if next != BookingStatus::Draft {
            self.expires_at = None;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Confirm a paid draft.
    ///
    /// The payment intent reported as successful must be the one stored on the
    /// booking, and the draft must not have lapsed.
    pub fn confirm(&mut self, payment_intent_id: &str, now: DateTime<Utc>) -> Result<()> {
        if self.status == BookingStatus::Draft && self.is_expired_draft(now) {
            return Err(AppError::Conflict(format!(
                "Booking {} expired before payment was confirmed",
                self.id
            )));
        }
        match self.payment_intent_id.as_deref() {
            Some(stored) if stored == payment_intent_id => {}
            _ => {
                return Err(AppError::Conflict(format!(
                    "Payment intent {} does not belong to booking {}",
                    payment_intent_id, self.id
                )))
            }
        }
        self.transition(BookingStatus::Confirmed, now)
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(BookingStatus::Cancelled, now)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(BookingStatus::Completed, now)
    }
}

/// Drop drafts whose hold has lapsed; everything else is kept in order
pub fn filter_active_bookings(bookings: Vec<Booking>, now: DateTime<Utc>) -> Vec<Booking> {
    bookings
        .into_iter()
        .filter(|b| b.is_active(now))
        .collect()
}

/// One persisted line of booking_extras
#[derive(Debug, Clone, PartialEq, Eq, Hash, FromRow, Serialize, Deserialize)]
pub struct BookingExtraRecord {
    pub booking_id: Uuid,
    pub extra_id: Uuid,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dates::parse_date_in_local_timezone;
    use rust_decimal_macros::dec;

    pub(crate) fn draft_at(now: DateTime<Utc>) -> Booking {
        let window = RentalWindow::new(
            parse_date_in_local_timezone("2025-06-01").unwrap(),
            parse_date_in_local_timezone("2025-06-04").unwrap(),
            None,
            None,
        )
        .unwrap();

        Booking::new_draft(
            NewDraft {
                car_id: Uuid::new_v4(),
                renter_id: Uuid::new_v4(),
                window,
                pickup_location_id: None,
                return_location_id: None,
                totals: BookingTotals {
                    car_rental_subtotal: dec!(120),
                    pickup_delivery_fee: dec!(0),
                    return_delivery_fee: dec!(0),
                    extras_total: dec!(0),
                    discount_amount: dec!(0),
                    grand_total: dec!(120),
                    requires_delivery_quote: false,
                },
                discount_code_id: None,
            },
            now,
            Duration::minutes(DEFAULT_DRAFT_TTL_MINUTES),
        )
    }

    // ==================== status transition tests ====================

    #[test]
    fn test_transition_table() {
        use BookingStatus::*;
        assert!(Draft.can_transition_to(Confirmed));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Draft));
        for terminal in [Cancelled, Completed] {
            assert!(terminal.is_terminal());
            for next in [Draft, Confirmed, Cancelled, Completed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_stock_returns_when_confirmed_booking_ends() {
        use BookingStatus::*;
        assert!(Confirmed.returns_stock_on(Cancelled));
        assert!(Confirmed.returns_stock_on(Completed));

        // Drafts never took stock
        assert!(!Draft.returns_stock_on(Cancelled));
        assert!(!Draft.returns_stock_on(Confirmed));
    }

    #[test]
    fn test_new_draft_expires_in_thirty_minutes() {
        let now = Utc::now();
        let booking = draft_at(now);
        assert_eq!(booking.status, BookingStatus::Draft);
        assert_eq!(booking.expires_at, Some(now + Duration::minutes(30)));
    }

    // ==================== expiry tests ====================

    #[test]
    fn test_filter_active_bookings_drops_lapsed_drafts() {
        let now = Utc::now();
        let booking = draft_at(now);

        let at_29 = filter_active_bookings(vec![booking.clone()], now + Duration::minutes(29));
        assert_eq!(at_29.len(), 1);

        let at_31 = filter_active_bookings(vec![booking], now + Duration::minutes(31));
        assert!(at_31.is_empty());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let booking = draft_at(now);
        assert!(booking.is_live_draft(now + Duration::minutes(30) - Duration::seconds(1)));
        assert!(!booking.is_live_draft(now + Duration::minutes(30)));
    }

    #[test]
    fn test_confirmed_and_cancelled_survive_filter() {
        let now = Utc::now();
        let mut confirmed = draft_at(now);
        confirmed.payment_intent_id = Some("pi_1".into());
        confirmed.confirm("pi_1", now).unwrap();
        let mut cancelled = draft_at(now);
        cancelled.cancel(now).unwrap();

        let later = now + Duration::hours(5);
        let kept = filter_active_bookings(vec![confirmed, cancelled], later);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_blocks_availability() {
        let now = Utc::now();
        let draft = draft_at(now);
        assert!(draft.blocks_availability(now + Duration::minutes(10)));
        assert!(!draft.blocks_availability(now + Duration::minutes(45)));

        let mut cancelled = draft_at(now);
        cancelled.cancel(now).unwrap();
        assert!(!cancelled.blocks_availability(now));
    }

    // ==================== confirm tests ====================

    #[test]
    fn test_confirm_clears_expiry() {
        let now = Utc::now();
        let mut booking = draft_at(now);
        booking.payment_intent_id = Some("pi_123".into());

        booking.confirm("pi_123", now + Duration::minutes(5)).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.expires_at, None);
        // Never expirable again
        assert!(booking.blocks_availability(now + Duration::days(30)));
    }

    #[test]
    fn test_confirm_rejects_wrong_intent() {
        let now = Utc::now();
        let mut booking = draft_at(now);
        booking.payment_intent_id = Some("pi_123".into());
        assert!(matches!(booking.confirm("pi_999", now), Err(AppError::Conflict(_))));

        let mut no_intent = draft_at(now);
        assert!(no_intent.confirm("pi_123", now).is_err());
        assert_eq!(no_intent.status, BookingStatus::Draft);
    }

    #[test]
    fn test_confirm_rejects_lapsed_draft() {
        let now = Utc::now();
        let mut booking = draft_at(now);
        booking.payment_intent_id = Some("pi_123".into());
        let err = booking.confirm("pi_123", now + Duration::minutes(31)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_complete_requires_confirmation() {
        let now = Utc::now();
        let mut booking = draft_at(now);
        assert!(matches!(
            booking.complete(now),
            Err(AppError::InvalidTransition { .. })
        ));

        booking.payment_intent_id = Some("pi_1".into());
        booking.confirm("pi_1", now).unwrap();
        booking.complete(now).unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.cancel(now).is_err());
    }
}
