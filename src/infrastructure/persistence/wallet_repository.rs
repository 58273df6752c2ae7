use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::entities::Wallet;
use crate::domain::error::DomainError;
use crate::domain::repository::WalletRepository;
use crate::domain::types::{PartnerId, WalletId};
use crate::infrastructure::persistence::models::WalletRow;

pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    async fn create(&self, wallet: Wallet) -> Result<Wallet, DomainError> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            INSERT INTO wallets (id, partner_id, external_user_id, external_wallet_id, name, currency, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(wallet.id)
        .bind(wallet.partner_id)
        .bind(wallet.external_user_id)
        .bind(wallet.external_wallet_id)
        .bind(wallet.name)
        .bind(wallet.currency)
        .bind(wallet.status)
        .bind(wallet.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, DomainError> {
        let row = sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id_for_update(&self, id: WalletId) -> Result<Option<Wallet>, DomainError> {
        let row = sqlx::query_as::<_, WalletRow>("SELECT * FROM wallets WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_partner_and_currency(
        &self,
        partner_id: PartnerId,
        currency: &str,
        external_user_id: Option<&str>,
    ) -> Result<Vec<Wallet>, DomainError> {
        let rows = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT * FROM wallets
            WHERE partner_id = $1 AND currency = $2
              AND external_user_id IS NOT DISTINCT FROM $3
            ORDER BY created_at ASC
            "#,
        )
        .bind(partner_id)
        .bind(currency)
        .bind(external_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_external_wallet_id(
        &self,
        partner_id: PartnerId,
        external_wallet_id: &str,
    ) -> Result<Option<Wallet>, DomainError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT * FROM wallets WHERE partner_id = $1 AND external_wallet_id = $2",
        )
        .bind(partner_id)
        .bind(external_wallet_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_for_partner(&self, partner_id: PartnerId) -> Result<Vec<Wallet>, DomainError> {
        let rows = sqlx::query_as::<_, WalletRow>(
            "SELECT * FROM wallets WHERE partner_id = $1 ORDER BY created_at ASC",
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, wallet: Wallet) -> Result<Wallet, DomainError> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            UPDATE wallets
            SET name = $2, status = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(wallet.id)
        .bind(wallet.name)
        .bind(wallet.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DomainError::WalletNotFound(wallet.id))?;

        Ok(row.into())
    }

    /// The wallet's balance is never stored as a mutable column; it is
    /// the running total of its ledger entries. Read-only callers use
    /// this, while the ledger engine computes the post-entry balance
    /// itself under the row lock taken by `find_by_id_for_update`.
    async fn balance(&self, id: WalletId) -> Result<Decimal, DomainError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN entry_type = 'credit' THEN amount ELSE -amount END), 0)
            FROM ledger_entries
            WHERE wallet_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(balance.unwrap_or(Decimal::ZERO))
    }
}
