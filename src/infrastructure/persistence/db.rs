use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};

use crate::domain::error::DomainError;

/// Opens the pool this binary uses everywhere: the CLI tools, the HTTP
/// server, and the background jobs all share one `PgPool`.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub type Tx<'a> = SqlxTransaction<'a, Postgres>;

/// Starts a transaction, mapping the open failure into `DomainError`
/// the same way every repository method does.
pub async fn begin(pool: &PgPool) -> Result<Tx<'static>, DomainError> {
    Ok(pool.begin().await?)
}
