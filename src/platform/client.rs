//! HTTP implementation of the platform contracts

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::schemas::{
    DiscountValidation, PaymentIntent, PaymentIntentRequest, PaymentIntentResponse, PaymentStatus,
    PaymentStatusRequest, PaymentStatusResponse, ValidateDiscountRequest, ValidateDiscountResponse,
};
use super::PlatformError;

/// Operations this crate needs from the platform
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn validate_discount_code(&self, code: &str) -> Result<DiscountValidation, PlatformError>;

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PlatformError>;

    async fn check_payment_status(&self, booking_id: Uuid) -> Result<PaymentStatus, PlatformError>;
}

/// Calls edge functions at `{base_url}/functions/v1/{name}`
#[derive(Clone)]
pub struct HttpPlatform {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpPlatform {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    async fn invoke<B, R>(&self, name: &str, body: &B) -> Result<R, PlatformError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.function_url(name);
        debug!("Invoking platform function {}", name);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlatformError::Timeout(self.timeout)
                } else {
                    PlatformError::Unreachable(e.to_string())
                }
            })?;

        check_status(response.status())?;

        response
            .json::<R>()
            .await
            .map_err(|e| PlatformError::InvalidResponse(format!("{}: {}", name, e)))
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), PlatformError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(PlatformError::Status(status.as_u16()))
    }
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn validate_discount_code(&self, code: &str) -> Result<DiscountValidation, PlatformError> {
        let response: ValidateDiscountResponse = self
            .invoke("validate-discount-code", &ValidateDiscountRequest { code })
            .await?;
        response.into_validation()
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PlatformError> {
        let response: PaymentIntentResponse = self.invoke("create-payment-intent", request).await?;
        response.into_intent()
    }

    async fn check_payment_status(&self, booking_id: Uuid) -> Result<PaymentStatus, PlatformError> {
        let response: PaymentStatusResponse = self
            .invoke("check-payment-status", &PaymentStatusRequest { booking_id })
            .await?;
        Ok(response.into())
    }
}
