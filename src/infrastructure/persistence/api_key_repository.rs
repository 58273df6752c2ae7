use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::ApiKey;
use crate::domain::error::DomainError;
use crate::domain::repository::ApiKeyRepository;
use crate::domain::types::{ApiKeyId, PartnerId};
use crate::infrastructure::persistence::models::{permissions_to_strings, ApiKeyRow};

pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn create(&self, key: ApiKey) -> Result<ApiKey, DomainError> {
        let permissions = permissions_to_strings(&key.permissions);
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            INSERT INTO api_keys (id, partner_id, hash, environment, permissions, active, expires_at, last_used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(key.id)
        .bind(key.partner_id)
        .bind(key.hash)
        .bind(key.environment)
        .bind(permissions)
        .bind(key.active)
        .bind(key.expires_at)
        .bind(key.last_used_at)
        .bind(key.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query_as::<_, ApiKeyRow>("SELECT * FROM api_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query_as::<_, ApiKeyRow>("SELECT * FROM api_keys WHERE hash = $1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list_for_partner(&self, partner_id: PartnerId) -> Result<Vec<ApiKey>, DomainError> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            "SELECT * FROM api_keys WHERE partner_id = $1 ORDER BY created_at DESC",
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn touch_last_used(&self, id: ApiKeyId) -> Result<(), DomainError> {
        sqlx::query("UPDATE api_keys SET last_used_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update(&self, key: ApiKey) -> Result<ApiKey, DomainError> {
        let permissions = permissions_to_strings(&key.permissions);
        let row = sqlx::query_as::<_, ApiKeyRow>(
            r#"
            UPDATE api_keys
            SET permissions = $2, active = $3, expires_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(key.id)
        .bind(permissions)
        .bind(key.active)
        .bind(key.expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DomainError::ApiKeyNotFound)?;

        Ok(row.into())
    }
}
