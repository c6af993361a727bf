//! Checkout totals: car subtotal, delivery, extras and discount combined into
//! the price fields stored on a booking.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::delivery::DeliveryQuote;
use crate::extras::ExtrasTotal;
use crate::platform::DiscountCode;
use crate::pricing::round_money;

/// Price breakdown persisted on a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingTotals {
    #[serde(with = "rust_decimal::serde::str")]
    pub car_rental_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub pickup_delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub return_delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub extras_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub grand_total: Decimal,
    /// Delivery still has to be quoted by staff and is not included above
    pub requires_delivery_quote: bool,
}

/// Split the delivery total over the two stored fee columns.
///
/// The pickup side takes any odd cent so both columns add back up to the total.
fn split_delivery(total: Decimal) -> (Decimal, Decimal) {
    let return_half = (total / Decimal::TWO).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    (total - return_half, return_half)
}

/// Discount on the car subtotal plus extras. Delivery is never discounted.
pub fn discount_amount(discountable: Decimal, discount: Option<&DiscountCode>) -> Decimal {
    match discount {
        Some(code) => {
            let pct = code.discount_percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
            round_money(discountable * pct / Decimal::ONE_HUNDRED, 2)
        }
        None => Decimal::ZERO,
    }
}

/// Combine the parts of a booking into its grand total.
pub fn compute_totals(
    car_rental_subtotal: Decimal,
    delivery: &DeliveryQuote,
    extras: &ExtrasTotal,
    discount: Option<&DiscountCode>,
) -> BookingTotals {
    let (pickup_delivery_fee, return_delivery_fee) = if delivery.requires_quote {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        split_delivery(delivery.total_fee)
    };

    let discount_amount = discount_amount(car_rental_subtotal + extras.extras_total, discount);
    let grand_total = car_rental_subtotal + pickup_delivery_fee + return_delivery_fee
        + extras.extras_total
        - discount_amount;

    BookingTotals {
        car_rental_subtotal,
        pickup_delivery_fee,
        return_delivery_fee,
        extras_total: extras.extras_total,
        discount_amount,
        grand_total,
        requires_delivery_quote: delivery.requires_quote,
    }
}
