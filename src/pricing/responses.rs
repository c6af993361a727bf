//! Response DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::dates::RentalWindow;

use super::models::PriceQuote;

/// Money value for JSON responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Response for a car price calculation
#[derive(Debug, Serialize)]
pub struct PriceQuoteResponse {
    #[serde(flatten)]
    pub quote: PriceQuote,
    pub window: RentalWindow,
    pub total: MoneyResponse,
    pub per_day: MoneyResponse,
}

impl PriceQuoteResponse {
    pub fn new(quote: PriceQuote, window: RentalWindow, currency: &str) -> Self {
        Self {
            total: MoneyResponse::new(quote.result.total_price, currency),
            per_day: MoneyResponse::new(quote.result.average_per_day, currency),
            quote,
            window,
        }
    }
}
