//! HTTP routes that don't belong to a single domain module

pub mod checkout;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::CacheStats;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/extras/total", post(checkout::extras_total))
        .route("/api/delivery-fee", post(checkout::delivery_fee))
        .route("/api/discounts/validate", post(checkout::validate_discount))
        .route("/internal/cache/stats", get(cache_stats))
        .route("/internal/cache/invalidate", post(invalidate_cache))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

#[derive(Debug, Deserialize)]
pub struct InvalidateQuery {
    #[serde(default)]
    pub car_id: Option<Uuid>,
}

/// Drop cached catalog data after admin edits, for one car or everything
async fn invalidate_cache(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Json<CacheStats> {
    match query.car_id {
        Some(car_id) => state.cache.invalidate_car(car_id).await,
        None => state.cache.invalidate_all(),
    }
    Json(state.cache.stats())
}
