//! Rental fleet models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle class shown in search filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "car_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CarCategory {
    Economy,
    Compact,
    Midsize,
    Suv,
    Luxury,
    Van,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transmission_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "fuel_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
}

/// Car from the cars table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_day: Decimal,
    pub category: CarCategory,
    pub seats: i32,
    pub doors: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub image_urls: Vec<String>,
    pub available: bool,
}

impl Car {
    /// "Year Make Model" label used in breakdowns and payment metadata
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}
