use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carrental_pricing::cache::{start_cache_warmer, AppCache};
use carrental_pricing::config::Config;
use carrental_pricing::platform::HttpPlatform;
use carrental_pricing::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carrental_pricing=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    info!("Connecting to database...");
    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let platform = HttpPlatform::new(
        &config.platform_url,
        &config.platform_api_key,
        config.platform_timeout,
    )
    .context("Failed to build platform client")?;

    let cache = AppCache::new();
    tokio::spawn(start_cache_warmer(cache.clone(), db.clone()));

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        db,
        cache,
        platform: Arc::new(platform),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
