//! Pickup and return locations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored delivery_fee value meaning "requires a manual quote".
pub const QUOTE_REQUIRED_SENTINEL: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "location_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    Base,
    Airport,
    Hotel,
    Custom,
}

/// Location from the locations table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub category: LocationCategory,
    pub delivery_fee: i32,
    pub active: bool,
}

/// Delivery surcharge for one location, parsed from the stored integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFee {
    Fixed(Decimal),
    QuoteRequired,
}

impl Location {
    /// Resolve the stored fee.
    ///
    /// Base locations never charge. `-1` maps to [`DeliveryFee::QuoteRequired`];
    /// any other negative value is treated the same way rather than as a credit.
    pub fn fee(&self) -> DeliveryFee {
        if self.category == LocationCategory::Base {
            return DeliveryFee::Fixed(Decimal::ZERO);
        }
        match self.delivery_fee {
            QUOTE_REQUIRED_SENTINEL => DeliveryFee::QuoteRequired,
            fee if fee < 0 => DeliveryFee::QuoteRequired,
            fee => DeliveryFee::Fixed(Decimal::from(fee)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(category: LocationCategory, delivery_fee: i32) -> Location {
        Location {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            category,
            delivery_fee,
            active: true,
        }
    }

    #[test]
    fn test_fee_parsing() {
        assert_eq!(
            location(LocationCategory::Airport, 40).fee(),
            DeliveryFee::Fixed(Decimal::from(40))
        );
        assert_eq!(
            location(LocationCategory::Hotel, -1).fee(),
            DeliveryFee::QuoteRequired
        );
        assert_eq!(
            location(LocationCategory::Base, 25).fee(),
            DeliveryFee::Fixed(Decimal::ZERO)
        );
    }
}
