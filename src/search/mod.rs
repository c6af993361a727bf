//! Car search: filter the fleet, then check availability and price every
//! candidate in parallel.
//!
//! A car whose availability cannot be confirmed in time is left out. A car
//! whose seasonal pricing cannot be loaded in time is listed at its standard
//! rate.

pub mod routes;
pub mod session;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::availability::check_availability_or_closed;
use crate::dates::{deserialize_local_date, deserialize_optional_time, RentalWindow};
use crate::db;
use crate::error::Result;
use crate::models::{Car, CarCategory, Transmission};
use crate::pricing::models::PriceQuote;
use crate::pricing::services::quote_car;
use crate::AppState;

pub use routes::router;
pub use session::{Generation, SearchSession};

/// Search filters from the query string
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    #[serde(deserialize_with = "deserialize_local_date")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_local_date")]
    pub end_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub pickup_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "deserialize_optional_time")]
    pub return_time: Option<NaiveTime>,
    #[serde(default)]
    pub category: Option<CarCategory>,
    #[serde(default)]
    pub transmission: Option<Transmission>,
    #[serde(default)]
    pub min_seats: Option<i32>,
    /// Upper bound on the average daily price of the quote
    #[serde(default)]
    pub max_price_per_day: Option<Decimal>,
}

impl SearchParams {
    pub fn window(&self) -> Result<RentalWindow> {
        RentalWindow::new(self.start_date, self.end_date, self.pickup_time, self.return_time)
    }

    /// Static attribute filters, checked before any lookups
    pub fn matches_car(&self, car: &Car) -> bool {
        car.available
            && self.category.map_or(true, |c| car.category == c)
            && self.transmission.map_or(true, |t| car.transmission == t)
            && self.min_seats.map_or(true, |s| car.seats >= s)
    }

    pub fn within_budget(&self, quote: &PriceQuote) -> bool {
        self.max_price_per_day
            .map_or(true, |max| quote.result.average_per_day <= max)
    }
}

/// One bookable car and its price for the searched window
#[derive(Debug, Clone, Serialize)]
pub struct CarSearchResult {
    pub car: Car,
    pub quote: PriceQuote,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<Generation>,
    /// A newer search from the same session was started while this one ran
    pub stale: bool,
    pub window: RentalWindow,
    pub count: usize,
    pub cars: Vec<CarSearchResult>,
}

/// Cheapest first; ties broken by car id so the order is stable
pub fn sort_results(results: &mut [CarSearchResult]) {
    results.sort_by(|a, b| {
        a.quote
            .result
            .total_price
            .cmp(&b.quote.result.total_price)
            .then_with(|| a.car.id.cmp(&b.car.id))
    });
}

/// Cars free for the whole window, priced and sorted.
pub async fn search_available_cars(
    state: &AppState,
    params: &SearchParams,
    window: &RentalWindow,
    now: DateTime<Utc>,
) -> Result<Vec<CarSearchResult>> {
    let fleet = db::list_available_cars(&state.db).await?;
    let fleet_size = fleet.len();

    let lookups = fleet
        .into_iter()
        .filter(|car| params.matches_car(car))
        .map(|car| async move {
            let (available, quote) = tokio::join!(
                check_availability_or_closed(
                    &state.db,
                    &state.cache,
                    car.id,
                    window,
                    now,
                    state.config.availability_timeout,
                ),
                quote_car(&state.db, &state.cache, &car, window, state.config.pricing_timeout),
            );
            available.then_some(CarSearchResult { car, quote })
        });

    let mut results: Vec<CarSearchResult> = join_all(lookups)
        .await
        .into_iter()
        .flatten()
        .filter(|result| params.within_budget(&result.quote))
        .collect();
    sort_results(&mut results);

    info!(
        "Search {} -> {}: {} of {} cars bookable",
        window.pickup_at(),
        window.return_at(),
        results.len(),
        fleet_size
    );

    Ok(results)
}
