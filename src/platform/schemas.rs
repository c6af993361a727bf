//! Request and response bodies of the platform edge functions.
//!
//! Every response is checked here before anything else sees it, so callers
//! only ever handle well-formed values.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlatformError;

/// Discount code as returned by validate-discount-code
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscountCode {
    pub id: Uuid,
    pub code: String,
    pub discount_percentage: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ValidateDiscountRequest<'a> {
    pub code: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ValidateDiscountResponse {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<DiscountCode>,
}

/// Outcome of a discount check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiscountValidation {
    Valid { discount: DiscountCode, message: String },
    Invalid { message: String },
}

impl ValidateDiscountResponse {
    pub fn into_validation(self) -> Result<DiscountValidation, PlatformError> {
        match (self.valid, self.data) {
            (true, Some(discount)) => {
                if discount.discount_percentage <= Decimal::ZERO
                    || discount.discount_percentage > Decimal::ONE_HUNDRED
                {
                    return Err(PlatformError::InvalidResponse(format!(
                        "discount_percentage {} out of range",
                        discount.discount_percentage
                    )));
                }
                Ok(DiscountValidation::Valid {
                    discount,
                    message: self.message,
                })
            }
            (true, None) => Err(PlatformError::InvalidResponse(
                "valid discount without data".to_string(),
            )),
            (false, _) => Ok(DiscountValidation::Invalid {
                message: if self.message.is_empty() {
                    "Invalid discount code".to_string()
                } else {
                    self.message
                },
            }),
        }
    }
}

/// Booking details attached to a payment intent
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMetadata {
    pub car: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub grand_total: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentRequest {
    pub booking_id: Uuid,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentResponse {
    pub success: bool,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A created payment intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    pub payment_intent_id: String,
    pub client_secret: String,
}

impl PaymentIntentResponse {
    pub fn into_intent(self) -> Result<PaymentIntent, PlatformError> {
        if !self.success {
            return Err(PlatformError::Rejected(
                self.error
                    .unwrap_or_else(|| "payment intent was not created".to_string()),
            ));
        }
        let client_secret = self
            .client_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PlatformError::InvalidResponse("missing client_secret".to_string()))?;
        let payment_intent_id = match self.payment_intent_id {
            Some(id) if !id.is_empty() => id,
            _ => intent_id_from_secret(&client_secret)?,
        };

        Ok(PaymentIntent {
            payment_intent_id,
            client_secret,
        })
    }
}

/// Client secrets have the form `<intent id>_secret_<nonce>`
fn intent_id_from_secret(client_secret: &str) -> Result<String, PlatformError> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id.to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PlatformError::InvalidResponse("malformed client_secret".to_string()))
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusRequest {
    pub booking_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusResponse {
    pub success: bool,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Result of polling the payment processor for a booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Succeeded { payment_intent_id: Option<String> },
    Pending,
}

impl From<PaymentStatusResponse> for PaymentStatus {
    fn from(resp: PaymentStatusResponse) -> Self {
        if resp.success {
            PaymentStatus::Succeeded {
                payment_intent_id: resp.payment_intent_id,
            }
        } else {
            PaymentStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_discount_valid() {
        let resp: ValidateDiscountResponse = serde_json::from_value(json!({
            "valid": true,
            "message": "Discount applied",
            "data": {
                "id": "5f0c6a4e-3b1d-4b9a-9c57-0f3c2b9d1a11",
                "code": "SUMMER10",
                "discount_percentage": 10
            }
        }))
        .unwrap();

        match resp.into_validation().unwrap() {
            DiscountValidation::Valid { discount, .. } => {
                assert_eq!(discount.code, "SUMMER10");
                assert_eq!(discount.discount_percentage, dec!(10));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_discount_invalid_and_malformed() {
        let resp: ValidateDiscountResponse =
            serde_json::from_value(json!({ "valid": false, "message": "Code expired" })).unwrap();
        assert_eq!(
            resp.into_validation().unwrap(),
            DiscountValidation::Invalid { message: "Code expired".into() }
        );

        let resp: ValidateDiscountResponse =
            serde_json::from_value(json!({ "valid": true, "message": "" })).unwrap();
        assert!(matches!(
            resp.into_validation(),
            Err(PlatformError::InvalidResponse(_))
        ));

        let resp: ValidateDiscountResponse = serde_json::from_value(json!({
            "valid": true,
            "data": {
                "id": "5f0c6a4e-3b1d-4b9a-9c57-0f3c2b9d1a11",
                "code": "HUGE",
                "discount_percentage": 150
            }
        }))
        .unwrap();
        assert!(resp.into_validation().is_err());
    }

    #[test]
    fn test_payment_intent_id_from_secret() {
        let resp: PaymentIntentResponse = serde_json::from_value(json!({
            "success": true,
            "client_secret": "pi_3Nabc_secret_xyz"
        }))
        .unwrap();
        let intent = resp.into_intent().unwrap();
        assert_eq!(intent.payment_intent_id, "pi_3Nabc");
        assert_eq!(intent.client_secret, "pi_3Nabc_secret_xyz");
    }

    #[test]
    fn test_payment_intent_failures() {
        let resp: PaymentIntentResponse =
            serde_json::from_value(json!({ "success": false, "error": "card_declined" })).unwrap();
        assert!(matches!(resp.into_intent(), Err(PlatformError::Rejected(ref m)) if m == "card_declined"));

        let resp: PaymentIntentResponse =
            serde_json::from_value(json!({ "success": true, "client_secret": "garbage" })).unwrap();
        assert!(matches!(resp.into_intent(), Err(PlatformError::InvalidResponse(_))));
    }

    #[test]
    fn test_shape_mismatch_fails_to_parse() {
        let parsed = serde_json::from_value::<PaymentStatusResponse>(json!({ "success": "yes" }));
        assert!(parsed.is_err());
    }
}
