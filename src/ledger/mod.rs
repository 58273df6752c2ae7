use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::entities::{
    is_clearing_wallet_name, EntryType, LedgerEntry, LedgerEntryRequest, WalletStatus,
};
use crate::domain::error::DomainError;
use crate::domain::money;
use crate::domain::types::{LedgerEntryId, TransactionId, WalletId};
use crate::infrastructure::persistence::db::Tx;
use crate::infrastructure::persistence::models::{LedgerEntryRow, WalletRow};

/// Appends a balanced set of ledger entries for one transaction.
///
/// Every wallet touched is locked (`SELECT ... FOR UPDATE`) before its
/// balance is read, so two concurrent posts against the same wallet
/// serialize instead of racing on a stale balance. Callers are
/// responsible for locking wallets in a deadlock-safe order first (see
/// `crate::orchestrator`) — this engine only appends once locks are
/// already held on `tx`.
pub struct LedgerEngine;

impl LedgerEngine {
    pub fn new() -> Self {
        Self
    }

    /// Validates that `entries` sum to zero across debits and credits
    /// per currency, then appends each one, computing its resulting
    /// balance under the wallet's row lock.
    pub async fn append(
        &self,
        tx: &mut Tx<'_>,
        transaction_id: TransactionId,
        entries: Vec<LedgerEntryRequest>,
    ) -> Result<Vec<LedgerEntry>, DomainError> {
        Self::ensure_balanced(transaction_id, &entries)?;

        let mut posted = Vec::with_capacity(entries.len());
        for request in entries {
            let wallet = Self::lock_wallet(tx, request.wallet_id).await?;

            if wallet.status != WalletStatus::Active {
                return Err(DomainError::WalletNotActive(request.wallet_id));
            }
            if wallet.currency != request.currency {
                return Err(DomainError::CurrencyMismatch {
                    wallet_id: request.wallet_id,
                    wallet_currency: wallet.currency,
                    entry_currency: request.currency,
                });
            }

            let current_balance = Self::wallet_balance(tx, request.wallet_id).await?;
            let new_balance = match request.entry_type {
                EntryType::Credit => current_balance + request.amount,
                EntryType::Debit => {
                    if current_balance < request.amount && !is_clearing_wallet_name(&wallet.name) {
                        return Err(DomainError::InsufficientFunds(request.wallet_id));
                    }
                    current_balance - request.amount
                }
            };

            let row = sqlx::query_as::<_, LedgerEntryRow>(
                r#"
                INSERT INTO ledger_entries (id, transaction_id, wallet_id, entry_type, amount, currency, balance, description, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
            )
            .bind(LedgerEntryId::new())
            .bind(transaction_id)
            .bind(request.wallet_id)
            .bind(request.entry_type)
            .bind(request.amount)
            .bind(&request.currency)
            .bind(new_balance)
            .bind(request.description)
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await?;

            posted.push(row.into());
        }

        Ok(posted)
    }

    fn ensure_balanced(
        transaction_id: TransactionId,
        entries: &[LedgerEntryRequest],
    ) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Err(DomainError::Unbalanced(transaction_id));
        }
        for entry in entries {
            money::ensure_positive_two_dp(entry.amount)
                .map_err(|e| DomainError::InvalidData(e.to_string()))?;
        }

        let mut debits = Decimal::ZERO;
        let mut credits = Decimal::ZERO;
        for entry in entries {
            match entry.entry_type {
                EntryType::Debit => debits += entry.amount,
                EntryType::Credit => credits += entry.amount,
            }
        }

        if debits != credits {
            return Err(DomainError::Unbalanced(transaction_id));
        }
        Ok(())
    }

    /// Exposed to the orchestrator, which locks wallets in canonical
    /// order and checks ownership/status/currency before any entry is
    /// built — locking happens once per wallet per transaction either
    /// way since Postgres row locks are reentrant within one session.
    pub(crate) async fn lock_wallet(tx: &mut Tx<'_>, wallet_id: WalletId) -> Result<WalletRow, DomainError> {
        sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE id = $1 FOR UPDATE")
            .bind(wallet_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(DomainError::WalletNotFound(wallet_id))
    }

    async fn wallet_balance(tx: &mut Tx<'_>, wallet_id: WalletId) -> Result<Decimal, DomainError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN entry_type = 'credit' THEN amount ELSE -amount END), 0)
            FROM ledger_entries
            WHERE wallet_id = $1
            "#,
        )
        .bind(wallet_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(balance.unwrap_or(Decimal::ZERO))
    }
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_unbalanced_entries() {
        let transaction_id = TransactionId::new();
        let entries = vec![LedgerEntryRequest {
            wallet_id: WalletId::new(),
            entry_type: EntryType::Debit,
            amount: dec!(10.00),
            currency: "USD".to_string(),
            description: None,
        }];

        let err = LedgerEngine::ensure_balanced(transaction_id, &entries).unwrap_err();
        assert!(matches!(err, DomainError::Unbalanced(_)));
    }

    #[test]
    fn accepts_balanced_debit_and_credit() {
        let transaction_id = TransactionId::new();
        let entries = vec![
            LedgerEntryRequest {
                wallet_id: WalletId::new(),
                entry_type: EntryType::Debit,
                amount: dec!(10.00),
                currency: "USD".to_string(),
                description: None,
            },
            LedgerEntryRequest {
                wallet_id: WalletId::new(),
                entry_type: EntryType::Credit,
                amount: dec!(10.00),
                currency: "USD".to_string(),
                description: None,
            },
        ];

        assert!(LedgerEngine::ensure_balanced(transaction_id, &entries).is_ok());
    }

    #[test]
    fn rejects_empty_entry_set() {
        let transaction_id = TransactionId::new();
        let err = LedgerEngine::ensure_balanced(transaction_id, &[]).unwrap_err();
        assert!(matches!(err, DomainError::Unbalanced(_)));
    }
}
