use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::GatewayTransaction;
use crate::domain::error::DomainError;
use crate::domain::repository::GatewayTransactionRepository;
use crate::infrastructure::persistence::models::GatewayTransactionRow;

pub struct PostgresGatewayTransactionRepository {
    pool: PgPool,
}

impl PostgresGatewayTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GatewayTransactionRepository for PostgresGatewayTransactionRepository {
    async fn create(&self, record: GatewayTransaction) -> Result<GatewayTransaction, DomainError> {
        let row = sqlx::query_as::<_, GatewayTransactionRow>(
            r#"
            INSERT INTO gateway_transactions (id, gateway_transaction_id, gateway, status, amount, currency, webhook_data, transaction_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.gateway_transaction_id)
        .bind(record.gateway)
        .bind(record.status)
        .bind(record.amount)
        .bind(record.currency)
        .bind(record.webhook_data)
        .bind(record.transaction_id)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_gateway_id(
        &self,
        gateway: &str,
        gateway_transaction_id: &str,
    ) -> Result<Option<GatewayTransaction>, DomainError> {
        let row = sqlx::query_as::<_, GatewayTransactionRow>(
            "SELECT * FROM gateway_transactions WHERE gateway = $1 AND gateway_transaction_id = $2",
        )
        .bind(gateway)
        .bind(gateway_transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn update(&self, record: GatewayTransaction) -> Result<GatewayTransaction, DomainError> {
        let row = sqlx::query_as::<_, GatewayTransactionRow>(
            r#"
            UPDATE gateway_transactions
            SET status = $2, transaction_id = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.status)
        .bind(record.transaction_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DomainError::Conflict("gateway transaction not found".into()))?;

        Ok(row.into())
    }
}
