//! Client for the backend platform's edge functions.
//!
//! Discount validation and payment intents live with the payment processor and
//! are reached over HTTP. Everything else in this crate talks to the database.

pub mod client;
pub mod schemas;

use std::time::Duration;

pub use client::{HttpPlatform, PlatformApi};
pub use schemas::{DiscountCode, DiscountValidation, PaymentIntent, PaymentStatus};

/// Failures talking to the platform
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlatformError {
    #[error("Platform unreachable: {0}")]
    Unreachable(String),

    #[error("Platform timed out after {0:?}")]
    Timeout(Duration),

    #[error("Platform returned HTTP {0}")]
    Status(u16),

    #[error("Platform rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected platform response: {0}")]
    InvalidResponse(String),
}
