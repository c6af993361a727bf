//! Pricing, availability and booking engine for the car rental storefront.

pub mod availability;
pub mod booking;
pub mod cache;
pub mod checkout;
pub mod config;
pub mod dates;
pub mod db;
pub mod delivery;
pub mod error;
pub mod extras;
pub mod models;
pub mod platform;
pub mod pricing;
pub mod routes;
pub mod search;

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::AppCache;
use crate::config::Config;
use crate::platform::PlatformApi;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub platform: Arc<dyn PlatformApi>,
    pub config: Arc<Config>,
}

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .merge(search::router())
        .merge(pricing::router())
        .merge(availability::router())
        .merge(booking::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
