use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entities::FundingSession;
use crate::domain::error::DomainError;
use crate::domain::repository::FundingSessionRepository;
use crate::domain::types::FundingSessionId;
use crate::infrastructure::persistence::models::FundingSessionRow;

pub struct PostgresFundingSessionRepository {
    pool: PgPool,
}

impl PostgresFundingSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FundingSessionRepository for PostgresFundingSessionRepository {
    async fn create(&self, session: FundingSession) -> Result<FundingSession, DomainError> {
        let row = sqlx::query_as::<_, FundingSessionRow>(
            r#"
            INSERT INTO funding_sessions (
                id, wallet_id, partner_id, payment_intent_id, amount, currency,
                status, expires_at, success_url, cancel_url, metadata, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(session.id)
        .bind(session.wallet_id)
        .bind(session.partner_id)
        .bind(session.payment_intent_id)
        .bind(session.amount)
        .bind(session.currency)
        .bind(session.status)
        .bind(session.expires_at)
        .bind(session.success_url)
        .bind(session.cancel_url)
        .bind(session.metadata)
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: FundingSessionId) -> Result<Option<FundingSession>, DomainError> {
        let row = sqlx::query_as::<_, FundingSessionRow>("SELECT * FROM funding_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_payment_intent_id(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<FundingSession>, DomainError> {
        let row = sqlx::query_as::<_, FundingSessionRow>(
            "SELECT * FROM funding_sessions WHERE payment_intent_id = $1",
        )
        .bind(payment_intent_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_expiring(
        &self,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FundingSession>, DomainError> {
        let rows = sqlx::query_as::<_, FundingSessionRow>(
            r#"
            SELECT * FROM funding_sessions
            WHERE status IN ('created', 'active') AND expires_at <= $1
            ORDER BY expires_at ASC
            LIMIT $2
            "#,
        )
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, session: FundingSession) -> Result<FundingSession, DomainError> {
        let row = sqlx::query_as::<_, FundingSessionRow>(
            r#"
            UPDATE funding_sessions
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(session.id)
        .bind(session.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DomainError::FundingSessionNotFound(session.id))?;

        Ok(row.into())
    }
}
