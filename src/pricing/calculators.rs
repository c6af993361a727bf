//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::dates::RentalWindow;
use crate::models::Car;

use super::models::{DailyPrice, PriceCalculationResult, SeasonalPricing};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use carrental_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Pick the override that wins for `date`, if any.
///
/// Highest priority wins. Equal priorities fall back to the most recently
/// created record, then to the lowest id, so the choice never depends on the
/// order the rows were loaded in.
pub fn winning_override<'a>(
    car: &Car,
    seasonal_pricings: &'a [SeasonalPricing],
    date: NaiveDate,
) -> Option<&'a SeasonalPricing> {
    seasonal_pricings
        .iter()
        .filter(|sp| sp.applies_to(car.id, date))
        .max_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.created_at.cmp(&b.created_at))
                .then(b.id.cmp(&a.id))
        })
}

/// Price for one car on one day.
pub fn get_daily_price(car: &Car, seasonal_pricings: &[SeasonalPricing], date: NaiveDate) -> DailyPrice {
    match winning_override(car, seasonal_pricings, date) {
        Some(sp) => DailyPrice {
            date,
            price: sp.price_per_day,
            is_special_price: true,
            pricing_name: Some(sp.name.clone()),
            pricing_band: Some(sp.band()),
        },
        None => DailyPrice {
            date,
            price: car.price_per_day,
            is_special_price: false,
            pricing_name: None,
            pricing_band: None,
        },
    }
}

/// Fold a day-by-day breakdown into totals.
pub fn summarize_breakdown(daily_breakdown: Vec<DailyPrice>) -> PriceCalculationResult {
    let mut base_price_days = 0u32;
    let mut special_price_days = 0u32;
    let mut total_price = Decimal::ZERO;

    for day in &daily_breakdown {
        if day.is_special_price {
            special_price_days += 1;
        } else {
            base_price_days += 1;
        }
        total_price += day.price;
    }

    let days = base_price_days + special_price_days;
    let average_per_day = if days > 0 {
        round_money(total_price / Decimal::from(days), 2)
    } else {
        Decimal::ZERO
    };

    PriceCalculationResult {
        base_price_days,
        special_price_days,
        average_per_day,
        total_price,
        daily_breakdown,
    }
}

/// Price every billable day of the window with seasonal overrides applied.
pub fn calculate_price_breakdown(
    car: &Car,
    seasonal_pricings: &[SeasonalPricing],
    window: &RentalWindow,
) -> PriceCalculationResult {
    let daily = window
        .billable_dates()
        .map(|date| get_daily_price(car, seasonal_pricings, date))
        .collect();

    summarize_breakdown(daily)
}

/// Standard pricing: the car's base rate for every billable day.
///
/// Used when seasonal data cannot be loaded in time.
pub fn flat_rate_result(car: &Car, window: &RentalWindow) -> PriceCalculationResult {
    calculate_price_breakdown(car, &[], window)
}
