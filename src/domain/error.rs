use thiserror::Error;

use crate::domain::types::WalletId;

/// Errors raised by entities, the ledger engine, and the orchestrator.
/// Repository implementations map storage-layer failures into this enum
/// before returning from a trait method — nothing above the
/// infrastructure layer ever sees a `sqlx::Error`.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("partner {0} not found")]
    PartnerNotFound(crate::domain::types::PartnerId),

    #[error("api key not found")]
    ApiKeyNotFound,

    #[error("wallet {0} not found")]
    WalletNotFound(WalletId),

    #[error("wallet {0} does not belong to the calling partner")]
    WalletNotOwned(WalletId),

    #[error("wallet {0} is not active")]
    WalletNotActive(WalletId),

    #[error("transaction {0} not found")]
    TransactionNotFound(crate::domain::types::TransactionId),

    #[error("funding session {0} not found")]
    FundingSessionNotFound(crate::domain::types::FundingSessionId),

    #[error("ledger entries for transaction {0} are not balanced")]
    Unbalanced(crate::domain::types::TransactionId),

    #[error("currency mismatch: wallet {wallet_id} holds {wallet_currency} but entry is {entry_currency}")]
    CurrencyMismatch {
        wallet_id: WalletId,
        wallet_currency: String,
        entry_currency: String,
    },

    #[error("wallet {0} has insufficient funds")]
    InsufficientFunds(WalletId),

    #[error("a transaction with idempotency key {0:?} already exists")]
    DuplicateIdempotencyKey(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("webhook signature verification failed")]
    InvalidWebhookSignature,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl DomainError {
    /// True for the one storage failure the orchestrator and repository
    /// layer treat specially: a unique-constraint violation surfaced as
    /// Postgres error code `23505`.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DomainError::Storage(sqlx::Error::Database(db))
                if db.code().as_deref() == Some("23505")
        )
    }
}
