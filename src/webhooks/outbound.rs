use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use sqlx::PgPool;
use tracing::{error, warn};

use crate::domain::entities::Transaction;
use crate::domain::repository::PartnerRepository;
use crate::domain::types::PartnerId;
use crate::orchestrator::TransactionEventSink;

type HmacSha256 = Hmac<Sha256>;

/// Fire-and-forget delivery of `transaction.completed` events to each
/// partner's configured webhook URL, HMAC-signed with a secret
/// generated on first use and stored in `partners.settings`. Per the
/// explicit non-goal on retries, a failed delivery is logged and
/// dropped rather than queued.
pub struct OutboundWebhookDispatcher {
    pool: PgPool,
    partners: Arc<dyn PartnerRepository>,
    client: reqwest::Client,
}

impl OutboundWebhookDispatcher {
    pub fn new(pool: PgPool, partners: Arc<dyn PartnerRepository>) -> Self {
        Self {
            pool,
            partners,
            client: reqwest::Client::new(),
        }
    }

    async fn secret_for(&self, partner_id: PartnerId) -> Option<(String, String)> {
        let partner = self.partners.find_by_id(partner_id).await.ok()??;
        let webhook_url = partner.webhook_url.clone()?;

        if let Some(secret) = partner.outbound_webhook_secret() {
            return Some((webhook_url, secret));
        }

        let secret = Self::generate_secret();
        let updated = partner.with_webhook_secret(secret.clone());
        if let Err(err) = self.partners.update(updated).await {
            warn!(%err, "failed to persist generated webhook secret");
        }
        Some((webhook_url, secret))
    }

    fn generate_secret() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl TransactionEventSink for OutboundWebhookDispatcher {
    async fn transaction_completed(&self, partner_id: PartnerId, transaction: &Transaction) {
        let Some((webhook_url, secret)) = self.secret_for(partner_id).await else {
            return;
        };

        let payload = serde_json::json!({
            "event": "transaction.completed",
            "data": transaction,
            "partnerId": partner_id,
            "timestamp": chrono::Utc::now(),
        });
        let body = match serde_json::to_vec(&payload) {
            Ok(body) => body,
            Err(err) => {
                error!(%err, "failed to serialize outbound webhook payload");
                return;
            }
        };

        let outbox_id = uuid::Uuid::new_v4();
        if let Err(err) = sqlx::query(
            r#"
            INSERT INTO webhook_outbox (id, partner_id, event_type, payload, status, created_at, updated_at)
            VALUES ($1, $2, 'transaction.completed', $3, 'pending', now(), now())
            "#,
        )
        .bind(outbox_id)
        .bind(partner_id)
        .bind(&payload)
        .execute(&self.pool)
        .await
        {
            error!(%err, "failed to record outbound webhook in outbox");
        }

        let signature = Self::sign(&secret, &body);
        let client = self.client.clone();
        let pool = self.pool.clone();
        let transaction_id = transaction.id;

        tokio::spawn(async move {
            let result = client
                .post(&webhook_url)
                .header("PayFlow-Event", "transaction.completed")
                .header("PayFlow-Signature", signature)
                .header("Content-Type", "application/json")
                .body(body)
                .send()
                .await;

            let status = match result {
                Ok(resp) if resp.status().is_success() => "delivered",
                Ok(resp) => {
                    warn!(%transaction_id, status = %resp.status(), "outbound webhook rejected");
                    "failed"
                }
                Err(err) => {
                    warn!(%transaction_id, %err, "outbound webhook delivery failed");
                    "failed"
                }
            };
            crate::observability::metrics::record_webhook_sent(status);

            let _ = sqlx::query(
                "UPDATE webhook_outbox SET status = $2, attempts = attempts + 1, updated_at = now() WHERE id = $1",
            )
            .bind(outbox_id)
            .bind(status)
            .execute(&pool)
            .await;
        });
    }
}
