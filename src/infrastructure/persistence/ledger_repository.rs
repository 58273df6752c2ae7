use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::LedgerEntry;
use crate::domain::error::DomainError;
use crate::domain::repository::LedgerRepository;
use crate::domain::types::{TransactionId, WalletId};
use crate::infrastructure::persistence::models::LedgerEntryRow;

pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    /// Used only for read paths; the ledger engine appends entries
    /// itself within its own transaction so the balance it computes
    /// and the row it inserts happen under the same wallet lock.
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, DomainError> {
        let row = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            INSERT INTO ledger_entries (id, transaction_id, wallet_id, entry_type, amount, currency, balance, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(entry.id)
        .bind(entry.transaction_id)
        .bind(entry.wallet_id)
        .bind(entry.entry_type)
        .bind(entry.amount)
        .bind(entry.currency)
        .bind(entry.balance)
        .bind(entry.description)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, DomainError> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            "SELECT * FROM ledger_entries WHERE transaction_id = $1 ORDER BY created_at ASC",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LedgerEntry>, DomainError> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT * FROM ledger_entries
            WHERE wallet_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
