//! Booking lifecycle: drafts, payment and confirmation.

pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use models::{filter_active_bookings, Booking, BookingExtraRecord, BookingStatus};
pub use routes::router;
