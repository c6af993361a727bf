//! Pricing engine for the rental fleet.
//!
//! Prices a car day by day for a rental window, applying the seasonal
//! override with the highest priority on each day.

pub mod calculators;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{calculate_price_breakdown, get_daily_price, round_money};
pub use models::{PriceCalculationResult, PriceQuote, PricingMode, SeasonalPricing};
pub use routes::router;
