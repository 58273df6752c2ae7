use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::Partner;
use crate::domain::error::DomainError;
use crate::domain::repository::PartnerRepository;
use crate::domain::types::PartnerId;
use crate::infrastructure::persistence::models::PartnerRow;

pub struct PostgresPartnerRepository {
    pool: PgPool,
}

impl PostgresPartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PartnerRepository for PostgresPartnerRepository {
    async fn create(&self, partner: Partner) -> Result<Partner, DomainError> {
        let row = sqlx::query_as::<_, PartnerRow>(
            r#"
            INSERT INTO partners (id, name, status, webhook_url, settings, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(partner.id)
        .bind(partner.name)
        .bind(partner.status)
        .bind(partner.webhook_url)
        .bind(partner.settings)
        .bind(partner.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: PartnerId) -> Result<Option<Partner>, DomainError> {
        let row = sqlx::query_as::<_, PartnerRow>("SELECT * FROM partners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn update(&self, partner: Partner) -> Result<Partner, DomainError> {
        let row = sqlx::query_as::<_, PartnerRow>(
            r#"
            UPDATE partners
            SET name = $2, status = $3, webhook_url = $4, settings = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(partner.id)
        .bind(partner.name)
        .bind(partner.status)
        .bind(partner.webhook_url)
        .bind(partner.settings)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DomainError::PartnerNotFound(partner.id))?;

        Ok(row.into())
    }
}
