use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::entities::{
    ApiKey, FundingSession, GatewayTransaction, LedgerEntry, Partner, Transaction, Wallet,
};
use crate::domain::error::DomainError;
use crate::domain::types::{
    ApiKeyId, FundingSessionId, GatewayTransactionId, PartnerId, TransactionId, WalletId,
};

#[async_trait]
#[cfg_attr(test, automock)]
pub trait PartnerRepository: Send + Sync {
    async fn create(&self, partner: Partner) -> Result<Partner, DomainError>;
    async fn find_by_id(&self, id: PartnerId) -> Result<Option<Partner>, DomainError>;
    async fn update(&self, partner: Partner) -> Result<Partner, DomainError>;
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait ApiKeyRepository: Send + Sync {
    async fn create(&self, key: ApiKey) -> Result<ApiKey, DomainError>;
    async fn find_by_id(&self, id: ApiKeyId) -> Result<Option<ApiKey>, DomainError>;
    async fn find_by_hash(&self, hash: &str) -> Result<Option<ApiKey>, DomainError>;
    async fn list_for_partner(&self, partner_id: PartnerId) -> Result<Vec<ApiKey>, DomainError>;
    async fn touch_last_used(&self, id: ApiKeyId) -> Result<(), DomainError>;
    async fn update(&self, key: ApiKey) -> Result<ApiKey, DomainError>;
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait WalletRepository: Send + Sync {
    async fn create(&self, wallet: Wallet) -> Result<Wallet, DomainError>;
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, DomainError>;
    /// Locks the row with `SELECT ... FOR UPDATE`. Callers must already
    /// be inside a transaction; the lock releases at commit/rollback.
    async fn find_by_id_for_update(&self, id: WalletId) -> Result<Option<Wallet>, DomainError>;
    async fn find_by_partner_and_currency(
        &self,
        partner_id: PartnerId,
        currency: &str,
        external_user_id: Option<&str>,
    ) -> Result<Vec<Wallet>, DomainError>;
    async fn find_by_external_wallet_id(
        &self,
        partner_id: PartnerId,
        external_wallet_id: &str,
    ) -> Result<Option<Wallet>, DomainError>;
    async fn list_for_partner(&self, partner_id: PartnerId) -> Result<Vec<Wallet>, DomainError>;
    async fn update(&self, wallet: Wallet) -> Result<Wallet, DomainError>;
    async fn balance(&self, id: WalletId) -> Result<rust_decimal::Decimal, DomainError>;
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, DomainError>;
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, DomainError>;
    async fn find_by_idempotency_key(
        &self,
        partner_id: PartnerId,
        key: &str,
    ) -> Result<Option<Transaction>, DomainError>;
    async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, DomainError>;
    async fn update(&self, transaction: Transaction) -> Result<Transaction, DomainError>;
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait LedgerRepository: Send + Sync {
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, DomainError>;
    async fn list_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, DomainError>;
    async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, DomainError>;
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait GatewayTransactionRepository: Send + Sync {
    async fn create(&self, record: GatewayTransaction) -> Result<GatewayTransaction, DomainError>;
    async fn find_by_gateway_id(
        &self,
        gateway: &str,
        gateway_transaction_id: &str,
    ) -> Result<Option<GatewayTransaction>, DomainError>;
    async fn update(&self, record: GatewayTransaction) -> Result<GatewayTransaction, DomainError>;
}

#[async_trait]
#[cfg_attr(test, automock)]
pub trait FundingSessionRepository: Send + Sync {
    async fn create(&self, session: FundingSession) -> Result<FundingSession, DomainError>;
    async fn find_by_id(&self, id: FundingSessionId) -> Result<Option<FundingSession>, DomainError>;
    async fn find_by_payment_intent_id(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<FundingSession>, DomainError>;
    async fn find_expiring(
        &self,
        before: chrono::DateTime<chrono::Utc>,
        limit: i64,
    ) -> Result<Vec<FundingSession>, DomainError>;
    async fn update(&self, session: FundingSession) -> Result<FundingSession, DomainError>;
}
