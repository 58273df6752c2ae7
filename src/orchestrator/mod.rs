use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::entities::{
    EntryType, LedgerEntryRequest, Partner, Transaction, TransactionStatus, TransactionType, Wallet,
    WalletStatus,
};
use crate::domain::error::DomainError;
use crate::domain::money;
use crate::domain::types::{PartnerId, TransactionId, WalletId};
use crate::infrastructure::persistence::db::Tx;
use crate::infrastructure::persistence::models::{PartnerRow, TransactionRow, WalletRow};
use crate::ledger::LedgerEngine;

/// Notified once a transaction reaches a terminal state, so the
/// outbound webhook fan-out of §4.F can run without the orchestrator
/// depending on the webhook module directly.
#[async_trait]
pub trait TransactionEventSink: Send + Sync {
    async fn transaction_completed(&self, partner_id: PartnerId, transaction: &Transaction);
}

pub struct NoopEventSink;

#[async_trait]
impl TransactionEventSink for NoopEventSink {
    async fn transaction_completed(&self, _partner_id: PartnerId, _transaction: &Transaction) {}
}

/// Everything needed to post one transaction, independent of its kind.
pub struct PostCommand {
    pub partner_id: PartnerId,
    pub transaction_type: TransactionType,
    pub from_wallet_id: Option<WalletId>,
    pub to_wallet_id: Option<WalletId>,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Single entry point for every credit, debit, and transfer. Implements
/// the algorithm of the component design doc precisely: idempotency
/// short-circuit, canonical-order wallet locking, clearing-wallet
/// counterpart construction, ledger append, terminal status commit.
pub struct TransactionOrchestrator {
    pool: PgPool,
    ledger: LedgerEngine,
    events: std::sync::Arc<dyn TransactionEventSink>,
}

impl TransactionOrchestrator {
    pub fn new(pool: PgPool, events: std::sync::Arc<dyn TransactionEventSink>) -> Self {
        Self {
            pool,
            ledger: LedgerEngine::new(),
            events,
        }
    }

    pub async fn post(&self, command: PostCommand) -> Result<Transaction, DomainError> {
        money::ensure_positive_two_dp(command.amount)
            .map_err(|e| DomainError::InvalidData(e.to_string()))?;
        money::ensure_currency(&command.currency).map_err(|e| DomainError::InvalidData(e.to_string()))?;

        if let Some(key) = &command.idempotency_key {
            if let Some(existing) = self.find_by_idempotency_key(command.partner_id, key).await? {
                return Ok(existing);
            }
        }

        let mut tx = self.pool.begin().await?;

        let partner = Self::lock_partner(&mut tx, command.partner_id).await?;

        let mut wallet_ids = match command.transaction_type {
            TransactionType::Credit => vec![command.to_wallet_id.expect("credit requires to_wallet_id")],
            TransactionType::Debit => vec![command.from_wallet_id.expect("debit requires from_wallet_id")],
            TransactionType::Transfer => vec![
                command.from_wallet_id.expect("transfer requires from_wallet_id"),
                command.to_wallet_id.expect("transfer requires to_wallet_id"),
            ],
        };

        let clearing_wallet_id = match command.transaction_type {
            TransactionType::Transfer => None,
            _ => Some(Self::get_or_create_clearing_wallet(&mut tx, &partner, &command.currency).await?),
        };
        if let Some(id) = clearing_wallet_id {
            wallet_ids.push(id);
        }

        wallet_ids.sort_unstable();
        wallet_ids.dedup();

        for wallet_id in &wallet_ids {
            let wallet = LedgerEngine::lock_wallet(&mut tx, *wallet_id).await?;
            Self::validate_wallet(&wallet, command.partner_id, &command.currency)?;
        }

        let transaction_id = TransactionId::new();
        let entries = Self::build_entries(&command, clearing_wallet_id);

        let pending = Self::new_pending_transaction(transaction_id, &command);
        let pending = Self::persist_transaction(&mut tx, pending).await?;

        match self.ledger.append(&mut tx, transaction_id, entries).await {
            Ok(_) => {
                let completed = Self::with_status(pending, TransactionStatus::Completed);
                let completed = Self::persist_transaction(&mut tx, completed).await?;
                tx.commit().await?;
                crate::observability::metrics::record_transaction_posted(
                    Self::type_label(completed.transaction_type),
                    "completed",
                );
                self.events
                    .transaction_completed(command.partner_id, &completed)
                    .await;
                Ok(completed)
            }
            Err(err) if Self::is_recoverable_ledger_error(&err) => {
                let failed = Self::with_status(pending, TransactionStatus::Failed);
                let failed = Self::persist_transaction(&mut tx, failed).await?;
                tx.commit().await?;
                crate::observability::metrics::record_transaction_posted(
                    Self::type_label(failed.transaction_type),
                    "failed",
                );
                Ok(failed)
            }
            Err(err) => Err(err),
        }
    }

    fn type_label(transaction_type: TransactionType) -> &'static str {
        match transaction_type {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
            TransactionType::Transfer => "transfer",
        }
    }

    fn is_recoverable_ledger_error(err: &DomainError) -> bool {
        matches!(
            err,
            DomainError::InsufficientFunds(_)
                | DomainError::CurrencyMismatch { .. }
                | DomainError::WalletNotActive(_)
        )
    }

    async fn find_by_idempotency_key(
        &self,
        partner_id: PartnerId,
        key: &str,
    ) -> Result<Option<Transaction>, DomainError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE partner_id = $1 AND idempotency_key = $2",
        )
        .bind(partner_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn lock_partner(tx: &mut Tx<'_>, partner_id: PartnerId) -> Result<Partner, DomainError> {
        let row = sqlx::query_as::<_, PartnerRow>("SELECT * FROM partners WHERE id = $1 FOR UPDATE")
            .bind(partner_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DomainError::PartnerNotFound(partner_id))?;

        Ok(row.into())
    }

    /// Looks up the partner's clearing wallet for `currency`, creating
    /// and recording one if this is the first credit/debit in that
    /// currency. The partner row is already locked by the caller, so
    /// two concurrent first-posts in the same currency serialize here.
    async fn get_or_create_clearing_wallet(
        tx: &mut Tx<'_>,
        partner: &Partner,
        currency: &str,
    ) -> Result<WalletId, DomainError> {
        if let Some(id) = partner.clearing_wallet_id(currency) {
            return Ok(id);
        }

        let wallet = Wallet::new_clearing(partner.id, currency.to_string());
        sqlx::query_as::<_, WalletRow>(
            r#"
            INSERT INTO wallets (id, partner_id, external_user_id, external_wallet_id, name, currency, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(wallet.id)
        .bind(wallet.partner_id)
        .bind(&wallet.external_user_id)
        .bind(&wallet.external_wallet_id)
        .bind(&wallet.name)
        .bind(&wallet.currency)
        .bind(wallet.status)
        .bind(wallet.created_at)
        .fetch_one(&mut **tx)
        .await?;

        let updated = partner.clone().with_clearing_wallet(currency, wallet.id);
        sqlx::query("UPDATE partners SET settings = $2 WHERE id = $1")
            .bind(updated.id)
            .bind(&updated.settings)
            .execute(&mut **tx)
            .await?;

        Ok(wallet.id)
    }

    fn validate_wallet(
        wallet: &WalletRow,
        partner_id: PartnerId,
        currency: &str,
    ) -> Result<(), DomainError> {
        if wallet.partner_id != partner_id {
            return Err(DomainError::WalletNotOwned(wallet.id));
        }
        if wallet.status != WalletStatus::Active {
            return Err(DomainError::WalletNotActive(wallet.id));
        }
        if wallet.currency != currency {
            return Err(DomainError::InvalidData(format!(
                "request currency {currency} does not match wallet {} currency {}",
                wallet.id, wallet.currency
            )));
        }
        Ok(())
    }

    fn build_entries(
        command: &PostCommand,
        clearing_wallet_id: Option<WalletId>,
    ) -> Vec<LedgerEntryRequest> {
        match command.transaction_type {
            TransactionType::Credit => {
                let clearing = clearing_wallet_id.expect("credit always resolves a clearing wallet");
                let to_wallet_id = command.to_wallet_id.expect("credit requires to_wallet_id");
                vec![
                    LedgerEntryRequest {
                        wallet_id: clearing,
                        entry_type: EntryType::Debit,
                        amount: command.amount,
                        currency: command.currency.clone(),
                        description: command.description.clone(),
                    },
                    LedgerEntryRequest {
                        wallet_id: to_wallet_id,
                        entry_type: EntryType::Credit,
                        amount: command.amount,
                        currency: command.currency.clone(),
                        description: command.description.clone(),
                    },
                ]
            }
            TransactionType::Debit => {
                let clearing = clearing_wallet_id.expect("debit always resolves a clearing wallet");
                let from_wallet_id = command.from_wallet_id.expect("debit requires from_wallet_id");
                vec![
                    LedgerEntryRequest {
                        wallet_id: from_wallet_id,
                        entry_type: EntryType::Debit,
                        amount: command.amount,
                        currency: command.currency.clone(),
                        description: command.description.clone(),
                    },
                    LedgerEntryRequest {
                        wallet_id: clearing,
                        entry_type: EntryType::Credit,
                        amount: command.amount,
                        currency: command.currency.clone(),
                        description: command.description.clone(),
                    },
                ]
            }
            TransactionType::Transfer => {
                let from_wallet_id = command.from_wallet_id.expect("transfer requires from_wallet_id");
                let to_wallet_id = command.to_wallet_id.expect("transfer requires to_wallet_id");
                vec![
                    LedgerEntryRequest {
                        wallet_id: from_wallet_id,
                        entry_type: EntryType::Debit,
                        amount: command.amount,
                        currency: command.currency.clone(),
                        description: command.description.clone(),
                    },
                    LedgerEntryRequest {
                        wallet_id: to_wallet_id,
                        entry_type: EntryType::Credit,
                        amount: command.amount,
                        currency: command.currency.clone(),
                        description: command.description.clone(),
                    },
                ]
            }
        }
    }

    fn new_pending_transaction(id: TransactionId, command: &PostCommand) -> Transaction {
        let now = Utc::now();
        Transaction {
            id,
            partner_id: command.partner_id,
            transaction_type: command.transaction_type,
            status: TransactionStatus::Pending,
            amount: command.amount,
            currency: command.currency.clone(),
            from_wallet_id: command.from_wallet_id,
            to_wallet_id: command.to_wallet_id,
            description: command.description.clone(),
            idempotency_key: command.idempotency_key.clone(),
            gateway_transaction_id: None,
            gateway: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn with_status(mut transaction: Transaction, status: TransactionStatus) -> Transaction {
        transaction.status = status;
        transaction.updated_at = Utc::now();
        transaction
    }

    async fn persist_transaction(
        tx: &mut Tx<'_>,
        transaction: Transaction,
    ) -> Result<Transaction, DomainError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, partner_id, transaction_type, status, amount, currency,
                from_wallet_id, to_wallet_id, description, idempotency_key,
                gateway_transaction_id, gateway, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                gateway_transaction_id = EXCLUDED.gateway_transaction_id,
                gateway = EXCLUDED.gateway,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.partner_id)
        .bind(transaction.transaction_type)
        .bind(transaction.status)
        .bind(transaction.amount)
        .bind(&transaction.currency)
        .bind(transaction.from_wallet_id)
        .bind(transaction.to_wallet_id)
        .bind(&transaction.description)
        .bind(&transaction.idempotency_key)
        .bind(&transaction.gateway_transaction_id)
        .bind(&transaction.gateway)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")) {
                DomainError::DuplicateIdempotencyKey(
                    transaction.idempotency_key.clone().unwrap_or_default(),
                )
            } else {
                DomainError::Storage(e)
            }
        })?;

        Ok(row.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn credit_command(to: WalletId) -> PostCommand {
        PostCommand {
            partner_id: PartnerId::new(),
            transaction_type: TransactionType::Credit,
            from_wallet_id: None,
            to_wallet_id: Some(to),
            amount: dec!(50.00),
            currency: "USD".to_string(),
            description: None,
            idempotency_key: None,
        }
    }

    #[test]
    fn credit_entries_debit_clearing_and_credit_target_equally() {
        let to = WalletId::new();
        let clearing = WalletId::new();
        let command = credit_command(to);

        let entries = TransactionOrchestrator::build_entries(&command, Some(clearing));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].wallet_id, clearing);
        assert_eq!(entries[0].entry_type, EntryType::Debit);
        assert_eq!(entries[1].wallet_id, to);
        assert_eq!(entries[1].entry_type, EntryType::Credit);
        assert_eq!(entries[0].amount, entries[1].amount);
    }

    #[test]
    fn transfer_entries_need_no_clearing_wallet() {
        let from = WalletId::new();
        let to = WalletId::new();
        let command = PostCommand {
            partner_id: PartnerId::new(),
            transaction_type: TransactionType::Transfer,
            from_wallet_id: Some(from),
            to_wallet_id: Some(to),
            amount: dec!(30.00),
            currency: "USD".to_string(),
            description: None,
            idempotency_key: None,
        };

        let entries = TransactionOrchestrator::build_entries(&command, None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].wallet_id, from);
        assert_eq!(entries[0].entry_type, EntryType::Debit);
        assert_eq!(entries[1].wallet_id, to);
        assert_eq!(entries[1].entry_type, EntryType::Credit);
    }

    #[test]
    fn validate_wallet_rejects_foreign_partner() {
        let partner_id = PartnerId::new();
        let other_partner_id = PartnerId::new();
        let wallet = WalletRow {
            id: WalletId::new(),
            partner_id: other_partner_id,
            external_user_id: None,
            external_wallet_id: None,
            name: "w".to_string(),
            currency: "USD".to_string(),
            status: WalletStatus::Active,
            created_at: Utc::now(),
        };

        let err = TransactionOrchestrator::validate_wallet(&wallet, partner_id, "USD").unwrap_err();
        assert!(matches!(err, DomainError::WalletNotOwned(_)));
    }

    #[test]
    fn validate_wallet_rejects_currency_mismatch() {
        let partner_id = PartnerId::new();
        let wallet = WalletRow {
            id: WalletId::new(),
            partner_id,
            external_user_id: None,
            external_wallet_id: None,
            name: "w".to_string(),
            currency: "EUR".to_string(),
            status: WalletStatus::Active,
            created_at: Utc::now(),
        };

        let err = TransactionOrchestrator::validate_wallet(&wallet, partner_id, "USD").unwrap_err();
        assert!(matches!(err, DomainError::InvalidData(_)));
    }
}
