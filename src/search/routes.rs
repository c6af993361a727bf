//! Search route handler

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::error::Result;
use crate::AppState;

use super::{search_available_cars, SearchParams, SearchResponse};

/// Header carrying the client's search session id
pub const SEARCH_SESSION_HEADER: &str = "x-search-session";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cars/search", get(search_cars))
}

async fn search_cars(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let window = params.window()?;

    let session = match headers
        .get(SEARCH_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|id| !id.is_empty())
    {
        Some(id) => Some(state.cache.search_session(id).await),
        None => None,
    };
    let generation = session.as_ref().map(|s| s.begin(params.clone()));

    let cars = search_available_cars(&state, &params, &window, Utc::now()).await?;

    let stale = match (&session, generation) {
        (Some(session), Some(generation)) => !session.apply(generation, Arc::new(cars.clone())),
        _ => false,
    };

    Ok(Json(SearchResponse {
        generation,
        stale,
        window,
        count: cars.len(),
        cars,
    }))
}
