pub mod live_gateway;
pub mod mock_gateway;

pub use live_gateway::LiveGateway;
pub use mock_gateway::MockGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResult {
    pub id: String,
    pub status: String,
}

/// Seam to the external payment processor. `MockGateway` answers
/// deterministically for local development and tests; `LiveGateway`
/// talks to the real processor over HTTPS.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, DomainError>;

    /// Retrieves the current state of a payment intent, including its
    /// client secret, without side effects. Used by the public funding
    /// page, which never persists the secret.
    async fn get_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, DomainError>;

    async fn capture_payment(&self, payment_intent_id: &str) -> Result<PaymentIntent, DomainError>;

    async fn refund_payment(
        &self,
        payment_intent_id: &str,
        amount: Decimal,
    ) -> Result<PaymentIntent, DomainError>;

    async fn create_payout(
        &self,
        amount: Decimal,
        currency: &str,
        destination: &str,
    ) -> Result<PayoutResult, DomainError>;

    /// Verifies the HMAC-SHA256 signature on an inbound gateway webhook.
    /// `signature_header` is the raw header value (hex-encoded digest).
    fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> Result<(), DomainError>;
}
