//! Pricing service functions with database access.
//!
//! Seasonal data is loaded through the cache with a time limit. When it cannot
//! be loaded the quote degrades to standard (flat-rate) pricing instead of
//! failing the request.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::dates::RentalWindow;
use crate::error::Result;
use crate::models::Car;

use super::calculators::{calculate_price_breakdown, flat_rate_result};
use super::models::{PriceQuote, PricingMode, SeasonalPricing};

/// Price a car, falling back to standard pricing if the lookup fails or is late.
pub async fn resolve_price_quote<F>(
    car: &Car,
    window: &RentalWindow,
    limit: Duration,
    seasonal_lookup: F,
) -> PriceQuote
where
    F: Future<Output = Result<Arc<Vec<SeasonalPricing>>>>,
{
    match tokio::time::timeout(limit, seasonal_lookup).await {
        Ok(Ok(pricings)) => PriceQuote {
            car_id: car.id,
            mode: PricingMode::Seasonal,
            result: calculate_price_breakdown(car, &pricings, window),
        },
        Ok(Err(e)) => {
            warn!("Seasonal pricing unavailable for car {}, using standard pricing: {}", car.id, e);
            standard_quote(car, window)
        }
        Err(_) => {
            warn!(
                "Seasonal pricing timed out after {:?} for car {}, using standard pricing",
                limit, car.id
            );
            standard_quote(car, window)
        }
    }
}

fn standard_quote(car: &Car, window: &RentalWindow) -> PriceQuote {
    PriceQuote {
        car_id: car.id,
        mode: PricingMode::Standard,
        result: flat_rate_result(car, window),
    }
}

/// Price a car already in hand for the given window.
pub async fn quote_car(
    pool: &PgPool,
    cache: &AppCache,
    car: &Car,
    window: &RentalWindow,
    limit: Duration,
) -> PriceQuote {
    resolve_price_quote(car, window, limit, cache.seasonal_pricings(pool, car.id)).await
}

/// Load a car and price it day by day for the given window.
///
/// Fails only when the car does not exist.
pub async fn calculate_price_with_breakdown(
    pool: &PgPool,
    cache: &AppCache,
    car_id: Uuid,
    window: &RentalWindow,
    limit: Duration,
) -> Result<PriceQuote> {
    let car = cache.car(pool, car_id).await?;
    Ok(quote_car(pool, cache, &car, window, limit).await)
}

/// Authoritative car subtotal, read straight from the database.
///
/// Used at booking time; unlike the display path it never degrades.
pub async fn authoritative_subtotal(
    pool: &PgPool,
    car: &Car,
    window: &RentalWindow,
) -> Result<Decimal> {
    let pricings = super::queries::find_seasonal_pricings_in_range(
        pool,
        car.id,
        window.start_date,
        window.end_date,
    )
    .await?;

    Ok(calculate_price_breakdown(car, &pricings, window).total_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date_in_local_timezone;
    use crate::error::AppError;
    use crate::models::{CarCategory, FuelType, Transmission};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn car() -> Car {
        Car {
            id: Uuid::new_v4(),
            make: "Kia".to_string(),
            model: "Picanto".to_string(),
            year: 2023,
            price_per_day: dec!(30),
            category: CarCategory::Economy,
            seats: 4,
            doors: 5,
            transmission: Transmission::Manual,
            fuel_type: FuelType::Petrol,
            image_urls: vec![],
            available: true,
        }
    }

    fn window() -> RentalWindow {
        RentalWindow::new(
            parse_date_in_local_timezone("2025-07-01").unwrap(),
            parse_date_in_local_timezone("2025-07-04").unwrap(),
            None,
            None,
        )
        .unwrap()
    }

    fn summer(car: &Car) -> SeasonalPricing {
        SeasonalPricing {
            id: Uuid::new_v4(),
            car_id: car.id,
            name: "Summer".to_string(),
            valid_from: parse_date_in_local_timezone("2025-07-01").unwrap(),
            valid_to: parse_date_in_local_timezone("2025-07-31").unwrap(),
            price_per_day: dec!(50),
            priority: 60,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_quote_uses_seasonal_data() {
        let car = car();
        let pricings = Arc::new(vec![summer(&car)]);
        let quote = resolve_price_quote(&car, &window(), Duration::from_secs(1), async {
            Ok(pricings)
        })
        .await;

        assert_eq!(quote.mode, PricingMode::Seasonal);
        assert_eq!(quote.result.total_price, dec!(150));
        assert_eq!(quote.result.special_price_days, 3);
    }

    #[tokio::test]
    async fn test_quote_falls_back_on_error() {
        let car = car();
        let quote = resolve_price_quote(&car, &window(), Duration::from_secs(1), async {
            Err(AppError::Internal("connection refused".into()))
        })
        .await;

        assert_eq!(quote.mode, PricingMode::Standard);
        assert_eq!(quote.result.total_price, dec!(90));
        assert_eq!(quote.result.base_price_days, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_falls_back_on_timeout() {
        let car = car();
        let pricings = Arc::new(vec![summer(&car)]);
        let quote = resolve_price_quote(&car, &window(), Duration::from_secs(3), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(pricings)
        })
        .await;

        assert_eq!(quote.mode, PricingMode::Standard);
        assert_eq!(quote.result.total_price, dec!(90));
    }
}
