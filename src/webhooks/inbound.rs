use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::entities::{GatewayTransaction, TransactionStatus};
use crate::domain::error::DomainError;
use crate::domain::repository::{GatewayTransactionRepository, TransactionRepository};
use crate::domain::types::{GatewayTransactionId, TransactionId};
use crate::funding::FundingSessionManager;
use crate::infrastructure::gateways::PaymentGateway;

#[derive(Debug, Deserialize)]
struct GatewayEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: GatewayEventData,
}

#[derive(Debug, Deserialize)]
struct GatewayEventData {
    object: GatewayEventObject,
}

#[derive(Debug, Deserialize, serde::Serialize)]
struct GatewayEventObject {
    id: String,
    #[serde(default)]
    amount: Decimal,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    metadata: GatewayEventMetadata,
}

#[derive(Debug, Default, Deserialize, serde::Serialize)]
struct GatewayEventMetadata {
    #[serde(rename = "transactionId", default)]
    transaction_id: Option<TransactionId>,
}

/// Verifies, deduplicates, and routes gateway webhooks. A duplicate
/// delivery of an already-seen event id is a no-op — the unique index
/// on `(gateway, gateway_transaction_id)` is the actual source of
/// truth; the in-memory check here just avoids a wasted round trip to
/// the funding session manager on the common case.
pub struct InboundWebhookProcessor {
    gateway: Arc<dyn PaymentGateway>,
    gateway_name: String,
    gateway_transactions: Arc<dyn GatewayTransactionRepository>,
    transactions: Arc<dyn TransactionRepository>,
    funding: Arc<FundingSessionManager>,
}

impl InboundWebhookProcessor {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        gateway_name: String,
        gateway_transactions: Arc<dyn GatewayTransactionRepository>,
        transactions: Arc<dyn TransactionRepository>,
        funding: Arc<FundingSessionManager>,
    ) -> Self {
        Self {
            gateway,
            gateway_name,
            gateway_transactions,
            transactions,
            funding,
        }
    }

    pub async fn handle(&self, raw_body: &[u8], signature_header: &str) -> Result<(), DomainError> {
        self.gateway.verify_webhook(raw_body, signature_header)?;

        let event: GatewayEvent = serde_json::from_slice(raw_body)
            .map_err(|e| DomainError::InvalidData(format!("malformed webhook body: {e}")))?;

        let already_seen = self
            .gateway_transactions
            .find_by_gateway_id(&self.gateway_name, &event.id)
            .await?
            .is_some();

        if already_seen {
            info!(event_id = %event.id, "duplicate webhook event, skipping");
            crate::observability::metrics::record_webhook_received("duplicate");
            return Ok(());
        }
        crate::observability::metrics::record_webhook_received("accepted");

        let reconciled_transaction_id = event.data.object.metadata.transaction_id;

        self.gateway_transactions
            .create(GatewayTransaction {
                id: GatewayTransactionId::new(),
                gateway_transaction_id: event.id.clone(),
                gateway: self.gateway_name.clone(),
                status: event.event_type.clone(),
                amount: event.data.object.amount,
                currency: event.data.object.currency.clone(),
                webhook_data: serde_json::to_value(&event.data.object).unwrap_or_default(),
                transaction_id: reconciled_transaction_id,
                created_at: chrono::Utc::now(),
            })
            .await?;

        match event.event_type.as_str() {
            "payment_intent.succeeded" | "charge.succeeded" => {
                if let Some(transaction_id) = reconciled_transaction_id {
                    self.mark_transaction_completed(transaction_id, &event.id).await
                } else {
                    self.funding.process_success(&event.data.object.id).await
                }
            }
            "payment_intent.failed" | "charge.failed" => {
                if reconciled_transaction_id.is_none() {
                    self.funding.process_failure(&event.data.object.id).await
                } else {
                    Ok(())
                }
            }
            other => {
                warn!(event_type = %other, "unhandled gateway event type");
                Ok(())
            }
        }
    }

    /// Reconciles a transaction created outside the funding-session flow
    /// (e.g. a direct capture) whose gateway event carries the local
    /// transaction id in `metadata.transactionId`.
    async fn mark_transaction_completed(
        &self,
        transaction_id: TransactionId,
        gateway_transaction_id: &str,
    ) -> Result<(), DomainError> {
        let Some(mut transaction) = self.transactions.find_by_id(transaction_id).await? else {
            warn!(%transaction_id, "webhook referenced unknown transaction");
            return Ok(());
        };

        if transaction.status.is_terminal() {
            return Ok(());
        }

        transaction.status = TransactionStatus::Completed;
        transaction.gateway_transaction_id = Some(gateway_transaction_id.to_string());
        transaction.gateway = Some(self.gateway_name.clone());
        self.transactions.update(transaction).await?;
        Ok(())
    }
}
