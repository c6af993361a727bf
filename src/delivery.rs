//! Delivery fee calculation for pickup and return locations.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::Result;
use crate::models::{DeliveryFee, Location};

/// Delivery surcharge for a pickup/return pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryQuote {
    /// None when the pickup location needs a manual quote
    #[serde(with = "rust_decimal::serde::str_option")]
    pub pickup_fee: Option<Decimal>,
    /// None when the return location needs a manual quote
    #[serde(with = "rust_decimal::serde::str_option")]
    pub return_fee: Option<Decimal>,
    /// Amount to charge automatically; zero while a quote is pending
    #[serde(with = "rust_decimal::serde::str")]
    pub total_fee: Decimal,
    pub requires_quote: bool,
}

impl DeliveryQuote {
    /// No delivery: both ends at the base office
    pub fn none() -> Self {
        Self {
            pickup_fee: Some(Decimal::ZERO),
            return_fee: Some(Decimal::ZERO),
            total_fee: Decimal::ZERO,
            requires_quote: false,
        }
    }
}

fn fixed(fee: DeliveryFee) -> Option<Decimal> {
    match fee {
        DeliveryFee::Fixed(amount) => Some(amount),
        DeliveryFee::QuoteRequired => None,
    }
}

/// Delivery fee for a pickup/return pair.
///
/// The same location is charged once. Different locations are charged the
/// average of both fees, rounded up. If either side needs a manual quote
/// nothing is charged automatically.
pub fn calculate_delivery_fee(pickup: &Location, return_location: &Location) -> DeliveryQuote {
    let pickup_fee = fixed(pickup.fee());
    let return_fee = fixed(return_location.fee());

    let (total_fee, requires_quote) = match (pickup_fee, return_fee) {
        (Some(p), Some(_)) if pickup.id == return_location.id => (p, false),
        (Some(p), Some(r)) => (((p + r) / Decimal::TWO).ceil(), false),
        _ => (Decimal::ZERO, true),
    };

    DeliveryQuote {
        pickup_fee,
        return_fee,
        total_fee,
        requires_quote,
    }
}

/// Resolve both locations and calculate their delivery fee.
pub async fn calculate_delivery_fee_by_id(
    pool: &PgPool,
    cache: &AppCache,
    pickup_location_id: Uuid,
    return_location_id: Uuid,
) -> Result<DeliveryQuote> {
    let pickup = cache.location(pool, pickup_location_id).await?;
    let return_location = if return_location_id == pickup_location_id {
        pickup.clone()
    } else {
        cache.location(pool, return_location_id).await?
    };

    let quote = calculate_delivery_fee(&pickup, &return_location);
    if quote.requires_quote {
        tracing::info!(
            "Delivery between {} and {} requires a manual quote",
            pickup.name,
            return_location.name
        );
    }
    Ok(quote)
}
