use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::error::DomainError;
use crate::infrastructure::gateways::{PaymentGateway, PaymentIntent, PayoutResult};

/// Deterministic stand-in for the external processor, used in local
/// development and in tests that exercise the HTTP layer without a
/// network dependency. Always succeeds and never actually signs
/// anything — `verify_webhook` accepts any signature equal to `"mock"`.
pub struct MockGateway;

impl MockGateway {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent, DomainError> {
        info!(%amount, %currency, "mock gateway: creating payment intent");
        let id = format!("pi_mock_{}", uuid::Uuid::new_v4().simple());
        Ok(PaymentIntent {
            id: id.clone(),
            amount,
            currency: currency.to_string(),
            status: "requires_action".to_string(),
            client_secret: Some(format!("{id}_secret")),
        })
    }

    async fn get_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, DomainError> {
        info!(%payment_intent_id, "mock gateway: retrieving payment intent");
        Ok(PaymentIntent {
            id: payment_intent_id.to_string(),
            amount: Decimal::ZERO,
            currency: "USD".to_string(),
            status: "requires_action".to_string(),
            client_secret: Some(format!("{payment_intent_id}_secret")),
        })
    }

    async fn capture_payment(&self, payment_intent_id: &str) -> Result<PaymentIntent, DomainError> {
        info!(%payment_intent_id, "mock gateway: capturing payment");
        Ok(PaymentIntent {
            id: payment_intent_id.to_string(),
            amount: Decimal::ZERO,
            currency: "USD".to_string(),
            status: "succeeded".to_string(),
            client_secret: None,
        })
    }

    async fn refund_payment(
        &self,
        payment_intent_id: &str,
        amount: Decimal,
    ) -> Result<PaymentIntent, DomainError> {
        info!(%payment_intent_id, %amount, "mock gateway: refunding payment");
        Ok(PaymentIntent {
            id: payment_intent_id.to_string(),
            amount,
            currency: "USD".to_string(),
            status: "refunded".to_string(),
            client_secret: None,
        })
    }

    async fn create_payout(
        &self,
        amount: Decimal,
        currency: &str,
        destination: &str,
    ) -> Result<PayoutResult, DomainError> {
        info!(%amount, %currency, %destination, "mock gateway: creating payout");
        Ok(PayoutResult {
            id: format!("po_mock_{}", uuid::Uuid::new_v4().simple()),
            status: "paid".to_string(),
        })
    }

    fn verify_webhook(&self, _payload: &[u8], signature_header: &str) -> Result<(), DomainError> {
        if signature_header == "mock" {
            Ok(())
        } else {
            Err(DomainError::InvalidWebhookSignature)
        }
    }
}
