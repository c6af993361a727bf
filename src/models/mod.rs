//! Catalog models shared across the pricing, availability and booking modules

pub mod car;
pub mod extra;
pub mod location;

pub use car::{Car, CarCategory, FuelType, Transmission};
pub use extra::{Extra, PriceType};
pub use location::{DeliveryFee, Location, LocationCategory};
