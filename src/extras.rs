//! Selected extras for a booking in progress and their totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::models::BookingExtraRecord;
use crate::error::{AppError, Result};
use crate::models::{Extra, PriceType};

/// One extra and how many of it the renter wants
#[derive(Debug, Clone)]
pub struct SelectedExtra {
    pub extra: Extra,
    pub quantity: u32,
}

impl SelectedExtra {
    /// Line total: per-day extras are billed for every rental day
    pub fn line_total(&self, rental_days: u32) -> Decimal {
        let base = self.extra.price * Decimal::from(self.quantity);
        match self.extra.price_type {
            PriceType::PerDay => base * Decimal::from(rental_days),
            PriceType::OneTime => base,
        }
    }
}

/// Quantity requested for one extra
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ExtraSelection {
    pub extra_id: Uuid,
    pub quantity: u32,
}

/// Display line of the extras breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtraLine {
    pub extra_id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub price_type: PriceType,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Extras total and its ordered breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtrasTotal {
    #[serde(with = "rust_decimal::serde::str")]
    pub extras_total: Decimal,
    pub breakdown: Vec<ExtraLine>,
}

impl ExtrasTotal {
    pub fn empty() -> Self {
        Self {
            extras_total: Decimal::ZERO,
            breakdown: vec![],
        }
    }
}

/// Working set of extras for the booking being configured.
///
/// Lines keep the order they were first added in. A line whose quantity drops
/// to zero is removed.
#[derive(Debug, Clone, Default)]
pub struct SelectedExtras {
    items: Vec<SelectedExtra>,
}

impl SelectedExtras {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the working set from a request, checking every id and quantity.
    pub fn from_selections(catalog: &[Extra], selections: &[ExtraSelection]) -> Result<Self> {
        let mut selected = Self::new();
        for selection in selections {
            let extra = find_extra(catalog, selection.extra_id)?;
            let quantity = selected
                .quantity(extra.id)
                .checked_add(selection.quantity)
                .ok_or_else(|| {
                    AppError::InvalidInput(format!("Quantity for {} is out of range", extra.name))
                })?;
            selected.set_quantity(extra, quantity)?;
        }
        Ok(selected)
    }

    /// Rebuild the working set from persisted booking_extras rows.
    pub fn from_records(catalog: &[Extra], records: &[BookingExtraRecord]) -> Result<Self> {
        let mut selected = Self::new();
        for record in records {
            let extra = find_extra(catalog, record.extra_id)?;
            let quantity = u32::try_from(record.quantity).map_err(|_| {
                AppError::InvalidInput(format!("Negative quantity for extra {}", record.extra_id))
            })?;
            let mut extra = extra.clone();
            // Bill at the price the renter agreed to
            extra.price = record.unit_price;
            selected.upsert(extra, quantity);
        }
        Ok(selected)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedExtra> {
        self.items.iter()
    }

    pub fn quantity(&self, extra_id: Uuid) -> u32 {
        self.items
            .iter()
            .find(|item| item.extra.id == extra_id)
            .map(|item| item.quantity)
            .unwrap_or(0)
    }

    /// Add one. Returns false and changes nothing when already at the limit.
    pub fn increment(&mut self, extra: &Extra) -> bool {
        let next = self.quantity(extra.id) + 1;
        if next > extra.quantity_limit() {
            return false;
        }
        self.upsert(extra.clone(), next);
        true
    }

    /// Remove one. Returns false when the extra was not selected.
    pub fn decrement(&mut self, extra_id: Uuid) -> bool {
        let Some(pos) = self.items.iter().position(|item| item.extra.id == extra_id) else {
            return false;
        };
        self.items[pos].quantity -= 1;
        if self.items[pos].quantity == 0 {
            self.items.remove(pos);
        }
        true
    }

    /// Set an exact quantity; zero removes the line.
    pub fn set_quantity(&mut self, extra: &Extra, quantity: u32) -> Result<()> {
        let limit = extra.quantity_limit();
        if quantity > limit {
            return Err(AppError::InvalidInput(format!(
                "At most {} x {} allowed per booking, requested {}",
                limit, extra.name, quantity
            )));
        }
        self.upsert(extra.clone(), quantity);
        Ok(())
    }

    pub fn remove(&mut self, extra_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.extra.id != extra_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn upsert(&mut self, extra: Extra, quantity: u32) {
        match self.items.iter().position(|item| item.extra.id == extra.id) {
            Some(pos) if quantity == 0 => {
                self.items.remove(pos);
            }
            Some(pos) => {
                self.items[pos].quantity = quantity;
                self.items[pos].extra = extra;
            }
            None if quantity == 0 => {}
            None => self.items.push(SelectedExtra { extra, quantity }),
        }
    }

    /// Lines to insert into booking_extras at checkout
    pub fn to_booking_extra_records(&self, booking_id: Uuid, rental_days: u32) -> Vec<BookingExtraRecord> {
        self.items
            .iter()
            .map(|item| BookingExtraRecord {
                booking_id,
                extra_id: item.extra.id,
                quantity: item.quantity as i32,
                unit_price: item.extra.price,
                total_price: item.line_total(rental_days),
            })
            .collect()
    }
}

fn find_extra(catalog: &[Extra], extra_id: Uuid) -> Result<&Extra> {
    catalog
        .iter()
        .find(|extra| extra.id == extra_id)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown or inactive extra {}", extra_id)))
}

/// Fold the selected extras into a total and display breakdown.
pub fn calculate_total(selected: &SelectedExtras, rental_days: u32) -> ExtrasTotal {
    let breakdown: Vec<ExtraLine> = selected
        .iter()
        .map(|item| ExtraLine {
            extra_id: item.extra.id,
            name: item.extra.name.clone(),
            price: item.extra.price,
            price_type: item.extra.price_type,
            quantity: item.quantity,
            total: item.line_total(rental_days),
        })
        .collect();

    let extras_total = breakdown.iter().map(|line| line.total).sum();

    ExtrasTotal {
        extras_total,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn extra(name: &str, price: Decimal, price_type: PriceType, max: i32) -> Extra {
        Extra {
            id: Uuid::new_v4(),
            name: name.to_string(),
            price,
            price_type,
            category: "equipment".to_string(),
            stock_quantity: None,
            max_per_booking: max,
            active: true,
        }
    }

    // ==================== calculate_total tests ====================

    #[test]
    fn test_mixed_price_types() {
        let cleaning = extra("Cleaning", dec!(20), PriceType::OneTime, 5);
        let gps = extra("GPS", dec!(10), PriceType::PerDay, 2);

        let mut selected = SelectedExtras::new();
        selected.set_quantity(&cleaning, 2).unwrap();
        selected.set_quantity(&gps, 1).unwrap();

        let total = calculate_total(&selected, 3);
        assert_eq!(total.extras_total, dec!(70));
        assert_eq!(total.breakdown.len(), 2);
        assert_eq!(total.breakdown[0].name, "Cleaning");
        assert_eq!(total.breakdown[0].total, dec!(40));
        assert_eq!(total.breakdown[1].total, dec!(30));
    }

    #[test]
    fn test_empty_selection() {
        let total = calculate_total(&SelectedExtras::new(), 5);
        assert_eq!(total, ExtrasTotal::empty());
    }

    // ==================== working set tests ====================

    #[test]
    fn test_increment_stops_at_max() {
        let seat = extra("Child seat", dec!(8), PriceType::PerDay, 2);
        let mut selected = SelectedExtras::new();

        assert!(selected.increment(&seat));
        assert!(selected.increment(&seat));
        assert!(!selected.increment(&seat));
        assert_eq!(selected.quantity(seat.id), 2);
    }

    #[test]
    fn test_increment_respects_stock() {
        let mut chains = extra("Snow chains", dec!(15), PriceType::OneTime, 4);
        chains.stock_quantity = Some(1);
        let mut selected = SelectedExtras::new();

        assert!(selected.increment(&chains));
        assert!(!selected.increment(&chains));
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let gps = extra("GPS", dec!(10), PriceType::PerDay, 2);
        let mut selected = SelectedExtras::new();
        selected.increment(&gps);

        assert!(selected.decrement(gps.id));
        assert!(selected.is_empty());
        assert!(!selected.decrement(gps.id));
    }

    #[test]
    fn test_set_quantity_over_limit_is_rejected() {
        let gps = extra("GPS", dec!(10), PriceType::PerDay, 1);
        let mut selected = SelectedExtras::new();
        assert!(matches!(
            selected.set_quantity(&gps, 2),
            Err(AppError::InvalidInput(_))
        ));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_from_selections_rejects_unknown_and_sums_duplicates() {
        let gps = extra("GPS", dec!(10), PriceType::PerDay, 3);
        let catalog = vec![gps.clone()];

        let selected = SelectedExtras::from_selections(
            &catalog,
            &[
                ExtraSelection { extra_id: gps.id, quantity: 1 },
                ExtraSelection { extra_id: gps.id, quantity: 2 },
            ],
        )
        .unwrap();
        assert_eq!(selected.quantity(gps.id), 3);

        let unknown = SelectedExtras::from_selections(
            &catalog,
            &[ExtraSelection { extra_id: Uuid::new_v4(), quantity: 1 }],
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn test_from_selections_rejects_overflowing_quantity() {
        let gps = extra("GPS", dec!(10), PriceType::PerDay, 3);
        let catalog = vec![gps.clone()];

        let result = SelectedExtras::from_selections(
            &catalog,
            &[
                ExtraSelection { extra_id: gps.id, quantity: 1 },
                ExtraSelection { extra_id: gps.id, quantity: u32::MAX },
            ],
        );
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let single = SelectedExtras::from_selections(
            &catalog,
            &[ExtraSelection { extra_id: gps.id, quantity: u32::MAX }],
        );
        assert!(matches!(single, Err(AppError::InvalidInput(_))));
    }

    // ==================== persistence tests ====================

    #[test]
    fn test_booking_extras_round_trip() {
        let cleaning = extra("Cleaning", dec!(20), PriceType::OneTime, 5);
        let gps = extra("GPS", dec!(10), PriceType::PerDay, 2);
        let catalog = vec![cleaning.clone(), gps.clone()];
        let booking_id = Uuid::new_v4();

        let mut selected = SelectedExtras::new();
        selected.set_quantity(&cleaning, 2).unwrap();
        selected.set_quantity(&gps, 1).unwrap();

        let records = selected.to_booking_extra_records(booking_id, 3);
        let reloaded = SelectedExtras::from_records(&catalog, &records).unwrap();
        let again = reloaded.to_booking_extra_records(booking_id, 3);

        let a: HashSet<_> = records.into_iter().collect();
        let b: HashSet<_> = again.into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reload_keeps_agreed_unit_price() {
        let mut gps = extra("GPS", dec!(10), PriceType::PerDay, 2);
        let booking_id = Uuid::new_v4();
        let mut selected = SelectedExtras::new();
        selected.set_quantity(&gps, 1).unwrap();
        let records = selected.to_booking_extra_records(booking_id, 2);

        gps.price = dec!(12);
        let reloaded = SelectedExtras::from_records(&[gps], &records).unwrap();
        assert_eq!(calculate_total(&reloaded, 2).extras_total, dec!(20));
    }
}
