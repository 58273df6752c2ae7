use payflow::infrastructure::persistence::db;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let database_url = std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    info!("connecting to database");
    let pool = db::connect(&database_url).await?;

    info!("running migrations");
    db::run_migrations(&pool).await?;

    info!("database initialized");
    Ok(())
}
