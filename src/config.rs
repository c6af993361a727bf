//! Runtime configuration read from the environment (and `.env` in development)

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::booking::models::DEFAULT_DRAFT_TTL_MINUTES;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub platform_url: String,
    pub platform_api_key: String,
    pub platform_timeout: Duration,
    /// Budget for loading seasonal pricing before falling back to standard pricing
    pub pricing_timeout: Duration,
    /// Budget for a listing availability check before treating the car as taken
    pub availability_timeout: Duration,
    pub draft_ttl: chrono::Duration,
    pub currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: optional("DATABASE_MAX_CONNECTIONS", 10)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            platform_url: required("PLATFORM_URL")?,
            platform_api_key: required("PLATFORM_API_KEY")?,
            platform_timeout: Duration::from_millis(optional("PLATFORM_TIMEOUT_MS", 10_000)?),
            pricing_timeout: Duration::from_millis(optional("PRICING_TIMEOUT_MS", 3_000)?),
            availability_timeout: Duration::from_millis(optional("AVAILABILITY_TIMEOUT_MS", 3_000)?),
            draft_ttl: chrono::Duration::minutes(optional(
                "DRAFT_TTL_MINUTES",
                DEFAULT_DRAFT_TTL_MINUTES,
            )?),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "USD".to_string()),
        })
    }
}

impl Default for Config {
    /// Local development defaults; never reaches a real platform
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/carrental".to_string(),
            database_max_connections: 10,
            bind_addr: "127.0.0.1:3000".to_string(),
            platform_url: "http://localhost:54321".to_string(),
            platform_api_key: String::new(),
            platform_timeout: Duration::from_secs(10),
            pricing_timeout: Duration::from_secs(3),
            availability_timeout: Duration::from_secs(3),
            draft_ttl: chrono::Duration::minutes(DEFAULT_DRAFT_TTL_MINUTES),
            currency: "USD".to_string(),
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
