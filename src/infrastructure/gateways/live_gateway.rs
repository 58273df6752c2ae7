use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;

use crate::domain::error::DomainError;
use crate::infrastructure::gateways::{PaymentGateway, PaymentIntent, PayoutResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    message: String,
}

/// Talks to the real payment processor over HTTPS. The base URL and
/// the API/webhook secrets come from configuration, never hardcoded.
pub struct LiveGateway {
    client: reqwest::Client,
    api_base: String,
    api_secret: String,
    webhook_secret: String,
}

impl LiveGateway {
    pub fn new(api_base: String, api_secret: String, webhook_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_secret,
            webhook_secret,
        }
    }

    async fn handle_response(resp: reqwest::Response) -> Result<reqwest::Response, DomainError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp
            .json::<GatewayErrorBody>()
            .await
            .map(|b| b.message)
            .unwrap_or_else(|_| status.to_string());
        error!(%status, %body, "gateway request failed");
        Err(DomainError::Gateway(body))
    }
}

#[async_trait]
impl PaymentGateway for LiveGateway {
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, DomainError> {
        let resp = self
            .client
            .post(format!("{}/payment_intents", self.api_base))
            .bearer_auth(&self.api_secret)
            .json(&serde_json::json!({ "amount": amount, "currency": currency }))
            .send()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        Self::handle_response(resp)
            .await?
            .json::<PaymentIntent>()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))
    }

    async fn get_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, DomainError> {
        let resp = self
            .client
            .get(format!("{}/payment_intents/{payment_intent_id}", self.api_base))
            .bearer_auth(&self.api_secret)
            .send()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        Self::handle_response(resp)
            .await?
            .json::<PaymentIntent>()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))
    }

    async fn capture_payment(&self, payment_intent_id: &str) -> Result<PaymentIntent, DomainError> {
        let resp = self
            .client
            .post(format!(
                "{}/payment_intents/{payment_intent_id}/capture",
                self.api_base
            ))
            .bearer_auth(&self.api_secret)
            .send()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        Self::handle_response(resp)
            .await?
            .json::<PaymentIntent>()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))
    }

    async fn refund_payment(
        &self,
        payment_intent_id: &str,
        amount: Decimal,
    ) -> Result<PaymentIntent, DomainError> {
        let resp = self
            .client
            .post(format!("{}/refunds", self.api_base))
            .bearer_auth(&self.api_secret)
            .json(&serde_json::json!({ "payment_intent": payment_intent_id, "amount": amount }))
            .send()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        Self::handle_response(resp)
            .await?
            .json::<PaymentIntent>()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))
    }

    async fn create_payout(
        &self,
        amount: Decimal,
        currency: &str,
        destination: &str,
    ) -> Result<PayoutResult, DomainError> {
        let resp = self
            .client
            .post(format!("{}/payouts", self.api_base))
            .bearer_auth(&self.api_secret)
            .json(&serde_json::json!({
                "amount": amount,
                "currency": currency,
                "destination": destination,
            }))
            .send()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        Self::handle_response(resp)
            .await?
            .json::<PayoutResult>()
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))
    }

    fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> Result<(), DomainError> {
        let expected = hex::decode(signature_header).map_err(|_| DomainError::InvalidWebhookSignature)?;

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| DomainError::InvalidWebhookSignature)?;
        mac.update(payload);
        mac.verify_slice(&expected)
            .map_err(|_| DomainError::InvalidWebhookSignature)
    }
}
