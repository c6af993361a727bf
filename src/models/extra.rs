//! Booking add-on extras

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "extra_price_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    PerDay,
    OneTime,
}

/// Extra from the extras table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Extra {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub price_type: PriceType,
    pub category: String,
    /// None means unlimited stock
    pub stock_quantity: Option<i32>,
    pub max_per_booking: i32,
    pub active: bool,
}

impl Extra {
    /// Highest quantity a single booking may hold
    pub fn quantity_limit(&self) -> u32 {
        let max = self.max_per_booking.max(0) as u32;
        match self.stock_quantity {
            Some(stock) => max.min(stock.max(0) as u32),
            None => max,
        }
    }
}
