//! Pricing models.
//!
//! `SeasonalPricing` is read straight from the database; the remaining types are
//! derived per request and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Seasonal or promotional override from seasonal_pricing
#[derive(Debug, Clone, FromRow)]
pub struct SeasonalPricing {
    pub id: Uuid,
    pub car_id: Uuid,
    pub name: String,
    /// Inclusive
    pub valid_from: NaiveDate,
    /// Inclusive
    pub valid_to: NaiveDate,
    pub price_per_day: Decimal,
    pub priority: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl SeasonalPricing {
    /// Check if this override applies to the given car on the given day
    pub fn applies_to(&self, car_id: Uuid, date: NaiveDate) -> bool {
        self.active && self.car_id == car_id && self.valid_from <= date && date <= self.valid_to
    }

    pub fn band(&self) -> PricingBand {
        PricingBand::from_priority(self.priority)
    }
}

/// Conventional priority labels; not enforced anywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingBand {
    Promotion,
    PeakSeason,
    OffPeak,
}

impl PricingBand {
    pub fn from_priority(priority: i32) -> Self {
        match priority {
            p if p >= 100 => PricingBand::Promotion,
            p if p >= 50 => PricingBand::PeakSeason,
            _ => PricingBand::OffPeak,
        }
    }
}

/// Price of one car on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPrice {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub is_special_price: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_band: Option<PricingBand>,
}

/// Aggregate price over a rental window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceCalculationResult {
    pub base_price_days: u32,
    pub special_price_days: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub average_per_day: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub daily_breakdown: Vec<DailyPrice>,
}

impl PriceCalculationResult {
    pub fn total_days(&self) -> u32 {
        self.base_price_days + self.special_price_days
    }
}

/// Where a quote's numbers came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Day-by-day with seasonal overrides applied
    Seasonal,
    /// Flat base rate; seasonal data was unavailable
    Standard,
}

/// Price result plus the mode it was produced in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    pub car_id: Uuid,
    pub mode: PricingMode,
    #[serde(flatten)]
    pub result: PriceCalculationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_band_thresholds() {
        assert_eq!(PricingBand::from_priority(150), PricingBand::Promotion);
        assert_eq!(PricingBand::from_priority(100), PricingBand::Promotion);
        assert_eq!(PricingBand::from_priority(99), PricingBand::PeakSeason);
        assert_eq!(PricingBand::from_priority(50), PricingBand::PeakSeason);
        assert_eq!(PricingBand::from_priority(49), PricingBand::OffPeak);
        assert_eq!(PricingBand::from_priority(-5), PricingBand::OffPeak);
    }
}
