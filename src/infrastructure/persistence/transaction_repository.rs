use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::Transaction;
use crate::domain::error::DomainError;
use crate::domain::repository::TransactionRepository;
use crate::domain::types::{PartnerId, TransactionId, WalletId};
use crate::infrastructure::persistence::models::TransactionRow;

pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn create(&self, transaction: Transaction) -> Result<Transaction, DomainError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (
                id, partner_id, transaction_type, status, amount, currency,
                from_wallet_id, to_wallet_id, description, idempotency_key,
                gateway_transaction_id, gateway, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.partner_id)
        .bind(transaction.transaction_type)
        .bind(transaction.status)
        .bind(transaction.amount)
        .bind(transaction.currency)
        .bind(transaction.from_wallet_id)
        .bind(transaction.to_wallet_id)
        .bind(transaction.description)
        .bind(transaction.idempotency_key)
        .bind(transaction.gateway_transaction_id)
        .bind(transaction.gateway)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .fetch_one(&self.pool)
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

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, DomainError> {
        let row = sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
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

    async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, DomainError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE from_wallet_id = $1 OR to_wallet_id = $1
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

    async fn update(&self, transaction: Transaction) -> Result<Transaction, DomainError> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
            SET status = $2, gateway_transaction_id = $3, gateway = $4, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.status)
        .bind(transaction.gateway_transaction_id)
        .bind(transaction.gateway)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DomainError::TransactionNotFound(transaction.id))?;

        Ok(row.into())
    }
}
