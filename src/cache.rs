//! In-memory caching using moka
//!
//! Caches the catalog rows that pricing and search read on every request.
//! Loads go through `try_get_with`, so concurrent requests for the same key
//! share one database round-trip instead of racing each other.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::availability;
use crate::dates::RentalWindow;
use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{Car, Extra, Location};
use crate::pricing::models::SeasonalPricing;
use crate::pricing::queries as pricing_queries;
use crate::search::SearchSession;

const ACTIVE_EXTRAS_KEY: &str = "active";

/// Application cache for catalog data and search sessions
#[derive(Clone)]
pub struct AppCache {
    /// Cars (id -> Car)
    pub cars: Cache<Uuid, Arc<Car>>,
    /// Active seasonal overrides per car (car id -> overrides)
    pub seasonal_pricings: Cache<Uuid, Arc<Vec<SeasonalPricing>>>,
    /// Locations (id -> Location)
    pub locations: Cache<Uuid, Arc<Location>>,
    /// Active extras catalog (singleton)
    pub extras: Cache<String, Arc<Vec<Extra>>>,
    /// Search sessions (client session id -> session)
    pub search_sessions: Cache<String, Arc<SearchSession>>,
    /// Listing availability ((car id, window) -> free)
    pub availability: Cache<(Uuid, RentalWindow), bool>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Cars: admins edit rarely, 10 min TTL
            cars: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(10 * 60))
                .build(),

            // Seasonal pricing: short TTL so new promotions show up quickly
            seasonal_pricings: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),

            // Locations: 30 min TTL
            locations: Cache::builder()
                .max_capacity(200)
                .time_to_live(Duration::from_secs(30 * 60))
                .build(),

            // Extras catalog: 1 entry, 10 min TTL
            extras: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(10 * 60))
                .build(),

            // Search sessions: dropped after 30 min without a search
            search_sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(Duration::from_secs(30 * 60))
                .build(),

            // Availability: only long enough to absorb repeated searches
            availability: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(5))
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cars_size: self.cars.entry_count(),
            seasonal_pricings_size: self.seasonal_pricings.entry_count(),
            locations_size: self.locations.entry_count(),
            extras_cached: self.extras.entry_count() > 0,
            search_sessions_size: self.search_sessions.entry_count(),
            availability_size: self.availability.entry_count(),
        }
    }

    /// Invalidate all catalog caches. Search sessions are kept.
    pub fn invalidate_all(&self) {
        self.cars.invalidate_all();
        self.seasonal_pricings.invalidate_all();
        self.locations.invalidate_all();
        self.extras.invalidate_all();
        self.availability.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate a single car and its overrides
    pub async fn invalidate_car(&self, car_id: Uuid) {
        self.cars.invalidate(&car_id).await;
        self.seasonal_pricings.invalidate(&car_id).await;
        self.invalidate_availability(car_id);
        info!("Cache invalidated for car: {}", car_id);
    }

    /// Forget every cached availability answer for a car
    pub fn invalidate_availability(&self, car_id: Uuid) {
        if let Err(e) = self
            .availability
            .invalidate_entries_if(move |(id, _), _| *id == car_id)
        {
            warn!("Failed to invalidate availability for car {}: {}", car_id, e);
        }
    }

    pub async fn car(&self, pool: &PgPool, car_id: Uuid) -> Result<Arc<Car>> {
        if self.cars.contains_key(&car_id) {
            debug!("Cache HIT for car: {}", car_id);
        }
        self.cars
            .try_get_with(car_id, async move { queries::get_car(pool, car_id).await.map(Arc::new) })
            .await
            .map_err(unshare)
    }

    pub async fn seasonal_pricings(
        &self,
        pool: &PgPool,
        car_id: Uuid,
    ) -> Result<Arc<Vec<SeasonalPricing>>> {
        self.seasonal_pricings
            .try_get_with(car_id, async move {
                pricing_queries::find_seasonal_pricings_for_car(pool, car_id)
                    .await
                    .map(Arc::new)
            })
            .await
            .map_err(unshare)
    }

    pub async fn location(&self, pool: &PgPool, location_id: Uuid) -> Result<Arc<Location>> {
        self.locations
            .try_get_with(location_id, async move {
                queries::get_location(pool, location_id).await.map(Arc::new)
            })
            .await
            .map_err(unshare)
    }

    pub async fn active_extras(&self, pool: &PgPool) -> Result<Arc<Vec<Extra>>> {
        self.extras
            .try_get_with(ACTIVE_EXTRAS_KEY.to_string(), async move {
                queries::list_active_extras(pool).await.map(Arc::new)
            })
            .await
            .map_err(unshare)
    }

    /// Whether a car is free for the window, shared by concurrent listings.
    ///
    /// Answers may be a few seconds old. Booking creation re-checks inside its
    /// transaction and never reads this.
    pub async fn car_availability(
        &self,
        pool: &PgPool,
        car_id: Uuid,
        window: &RentalWindow,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.availability
            .try_get_with((car_id, *window), async move {
                availability::is_car_available(pool, car_id, window, now).await
            })
            .await
            .map_err(unshare)
    }

    /// Session for a client, created on first use
    pub async fn search_session(&self, session_id: &str) -> Arc<SearchSession> {
        self.search_sessions
            .get_with(session_id.to_string(), async { Arc::new(SearchSession::new()) })
            .await
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Recover an owned error from the shared one moka hands back to every waiter
fn unshare(err: Arc<AppError>) -> AppError {
    match err.as_ref() {
        AppError::NotFound(what) => AppError::NotFound(what.clone()),
        AppError::InvalidInput(msg) => AppError::InvalidInput(msg.clone()),
        other => AppError::Internal(other.to_string()),
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub cars_size: u64,
    pub seasonal_pricings_size: u64,
    pub locations_size: u64,
    pub extras_cached: bool,
    pub search_sessions_size: u64,
    pub availability_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 5 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    let mut interval = interval(Duration::from_secs(5 * 60));
    loop {
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with the fleet and its seasonal overrides
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match queries::list_available_cars(db).await {
        Ok(cars) => {
            for car in cars {
                let car_id = car.id;
                cache.cars.insert(car_id, Arc::new(car)).await;

                match pricing_queries::find_seasonal_pricings_for_car(db, car_id).await {
                    Ok(pricings) => {
                        cache
                            .seasonal_pricings
                            .insert(car_id, Arc::new(pricings))
                            .await;
                    }
                    Err(e) => warn!("Failed to warm seasonal pricing for car {}: {}", car_id, e),
                }
            }
        }
        Err(e) => warn!("Failed to warm car cache: {}", e),
    }

    match queries::list_active_extras(db).await {
        Ok(extras) => {
            cache
                .extras
                .insert(ACTIVE_EXTRAS_KEY.to_string(), Arc::new(extras))
                .await;
        }
        Err(e) => warn!("Failed to warm extras cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
