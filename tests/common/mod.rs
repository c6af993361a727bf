//! Shared fixtures for router tests.
//!
//! The pool is created lazily and never connects, so only requests that are
//! answered or rejected before touching the database can be exercised.
//! [`db`] holds fixtures for tests against a real Postgres.

pub mod db;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use uuid::Uuid;

use carrental_pricing::cache::AppCache;
use carrental_pricing::config::Config;
use carrental_pricing::platform::schemas::PaymentIntentRequest;
use carrental_pricing::platform::{
    DiscountCode, DiscountValidation, PaymentIntent, PaymentStatus, PlatformApi, PlatformError,
};
use carrental_pricing::{app, AppState};

/// Platform double answering from fixed data
pub struct StaticPlatform {
    pub discounts: Vec<DiscountCode>,
    pub reachable: bool,
}

impl StaticPlatform {
    pub fn with_discount(code: &str, percentage: rust_decimal::Decimal) -> Self {
        Self {
            discounts: vec![DiscountCode {
                id: Uuid::new_v4(),
                code: code.to_string(),
                discount_percentage: percentage,
            }],
            reachable: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            discounts: vec![],
            reachable: false,
        }
    }

    fn check(&self) -> Result<(), PlatformError> {
        if self.reachable {
            Ok(())
        } else {
            Err(PlatformError::Unreachable("connection refused".to_string()))
        }
    }
}

#[async_trait]
impl PlatformApi for StaticPlatform {
    async fn validate_discount_code(&self, code: &str) -> Result<DiscountValidation, PlatformError> {
        self.check()?;
        Ok(match self.discounts.iter().find(|d| d.code == code) {
            Some(discount) => DiscountValidation::Valid {
                discount: discount.clone(),
                message: "Discount applied".to_string(),
            },
            None => DiscountValidation::Invalid {
                message: "Invalid discount code".to_string(),
            },
        })
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PlatformError> {
        self.check()?;
        Ok(PaymentIntent {
            payment_intent_id: format!("pi_{}", request.booking_id.simple()),
            client_secret: format!("pi_{}_secret_test", request.booking_id.simple()),
        })
    }

    async fn check_payment_status(&self, _booking_id: Uuid) -> Result<PaymentStatus, PlatformError> {
        self.check()?;
        Ok(PaymentStatus::Pending)
    }
}

pub fn test_app(platform: StaticPlatform) -> Router {
    let config = Config::default();
    let db = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");

    app(AppState {
        db,
        cache: AppCache::new(),
        platform: Arc::new(platform),
        config: Arc::new(config),
    })
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
