pub mod expiry_job;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::entities::{FundingSession, FundingSessionStatus, TransactionType};
use crate::domain::error::DomainError;
use crate::domain::money;
use crate::domain::repository::{FundingSessionRepository, WalletRepository};
use crate::domain::types::{FundingSessionId, PartnerId, WalletId};
use crate::infrastructure::gateways::PaymentGateway;
use crate::orchestrator::{PostCommand, TransactionOrchestrator};

#[derive(Debug, Clone)]
pub struct CreateFundingSessionRequest {
    pub wallet_id: WalletId,
    pub partner_id: PartnerId,
    pub amount: Decimal,
    pub currency: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub metadata: serde_json::Value,
}

/// Ties an external payment-intent lifecycle to crediting a wallet.
/// `process_success` is the only path that ever moves money — it is
/// invoked by the inbound webhook processor and is itself idempotent
/// because it posts through the orchestrator with the payment intent
/// id as the idempotency key.
pub struct FundingSessionManager {
    sessions: Arc<dyn FundingSessionRepository>,
    wallets: Arc<dyn WalletRepository>,
    gateway: Arc<dyn PaymentGateway>,
    orchestrator: Arc<TransactionOrchestrator>,
    ttl_minutes: i64,
}

impl FundingSessionManager {
    pub fn new(
        sessions: Arc<dyn FundingSessionRepository>,
        wallets: Arc<dyn WalletRepository>,
        gateway: Arc<dyn PaymentGateway>,
        orchestrator: Arc<TransactionOrchestrator>,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            sessions,
            wallets,
            gateway,
            orchestrator,
            ttl_minutes,
        }
    }

    pub async fn create(
        &self,
        request: CreateFundingSessionRequest,
    ) -> Result<FundingSession, DomainError> {
        money::ensure_positive_two_dp(request.amount)
            .map_err(|e| DomainError::InvalidData(e.to_string()))?;
        money::ensure_currency(&request.currency).map_err(|e| DomainError::InvalidData(e.to_string()))?;

        let wallet = self
            .wallets
            .find_by_id(request.wallet_id)
            .await?
            .ok_or(DomainError::WalletNotFound(request.wallet_id))?;

        if wallet.partner_id != request.partner_id {
            return Err(DomainError::WalletNotOwned(request.wallet_id));
        }
        if wallet.currency != request.currency {
            return Err(DomainError::InvalidData(format!(
                "funding currency {} does not match wallet currency {}",
                request.currency, wallet.currency
            )));
        }

        let intent = self
            .gateway
            .create_payment_intent(request.amount, &request.currency)
            .await?;

        let now = Utc::now();
        let session = FundingSession {
            id: FundingSessionId::new(),
            wallet_id: request.wallet_id,
            partner_id: request.partner_id,
            payment_intent_id: intent.id.clone(),
            amount: request.amount,
            currency: request.currency,
            status: FundingSessionStatus::Created,
            expires_at: now + Duration::minutes(self.ttl_minutes),
            success_url: request.success_url,
            cancel_url: request.cancel_url,
            metadata: request.metadata,
            created_at: now,
            updated_at: now,
        };

        self.sessions.create(session).await
    }

    pub async fn get(&self, id: FundingSessionId) -> Result<FundingSession, DomainError> {
        self.sessions
            .find_by_id(id)
            .await?
            .ok_or(DomainError::FundingSessionNotFound(id))
    }

    /// Invoked once per `payment_intent.succeeded` delivery, however
    /// many times the gateway retries it. The idempotency key passed to
    /// the orchestrator is the payment intent id, so only the first
    /// call ever posts a ledger entry.
    pub async fn process_success(&self, payment_intent_id: &str) -> Result<(), DomainError> {
        let session = self
            .sessions
            .find_by_payment_intent_id(payment_intent_id)
            .await?;

        let Some(mut session) = session else {
            warn!(%payment_intent_id, "payment_intent.succeeded for unknown funding session");
            return Ok(());
        };

        if session.status.is_terminal() {
            info!(session_id = %session.id, status = ?session.status, "funding session already terminal, ignoring duplicate success event");
            return Ok(());
        }

        let command = PostCommand {
            partner_id: session.partner_id,
            transaction_type: TransactionType::Credit,
            from_wallet_id: None,
            to_wallet_id: Some(session.wallet_id),
            amount: session.amount,
            currency: session.currency.clone(),
            description: Some(format!("funding session {}", session.id)),
            idempotency_key: Some(session.payment_intent_id.clone()),
        };

        match self.orchestrator.post(command).await {
            Ok(_) => {
                session.status = FundingSessionStatus::Completed;
                self.sessions.update(session).await?;
                Ok(())
            }
            Err(err) => {
                session.status = FundingSessionStatus::Failed;
                self.sessions.update(session).await?;
                Err(err)
            }
        }
    }

    pub async fn process_failure(&self, payment_intent_id: &str) -> Result<(), DomainError> {
        let session = self
            .sessions
            .find_by_payment_intent_id(payment_intent_id)
            .await?;

        let Some(mut session) = session else {
            return Ok(());
        };
        if session.status.is_terminal() {
            return Ok(());
        }

        session.status = FundingSessionStatus::Failed;
        self.sessions.update(session).await?;
        Ok(())
    }

    /// Marks every non-terminal session whose `expires_at` has passed
    /// as `expired`. Run periodically by `expiry_job::spawn`.
    pub async fn expire_due(&self) -> Result<usize, DomainError> {
        let due = self.sessions.find_expiring(Utc::now(), 200).await?;
        let count = due.len();

        for mut session in due {
            session.status = FundingSessionStatus::Expired;
            self.sessions.update(session).await?;
        }

        Ok(count)
    }
}
