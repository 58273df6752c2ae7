use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use payflow::api::{self, AppState};
use payflow::auth::{Authenticator, RateLimiter};
use payflow::config::{GatewayMode, Settings};
use payflow::funding::{expiry_job, FundingSessionManager};
use payflow::infrastructure::gateways::{LiveGateway, MockGateway, PaymentGateway};
use payflow::infrastructure::persistence::{
    db, PostgresApiKeyRepository, PostgresFundingSessionRepository,
    PostgresGatewayTransactionRepository, PostgresLedgerRepository, PostgresPartnerRepository,
    PostgresTransactionRepository, PostgresWalletRepository,
};
use payflow::observability::{logging, logging::LogFormat, metrics};
use payflow::orchestrator::TransactionOrchestrator;
use payflow::webhooks::{InboundWebhookProcessor, OutboundWebhookDispatcher};

#[derive(OpenApi)]
#[openapi(paths(payflow::api::health::health, payflow::api::health::ready))]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    logging::init(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()), LogFormat::from(settings.log_format.as_str()));
    metrics::init();

    info!("connecting to database");
    let pool = db::connect(&settings.database_url).await?;
    db::run_migrations(&pool).await?;

    let partners = Arc::new(PostgresPartnerRepository::new(pool.clone()));
    let api_keys = Arc::new(PostgresApiKeyRepository::new(pool.clone()));
    let wallets = Arc::new(PostgresWalletRepository::new(pool.clone()));
    let transactions = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let ledger = Arc::new(PostgresLedgerRepository::new(pool.clone()));
    let gateway_transactions = Arc::new(PostgresGatewayTransactionRepository::new(pool.clone()));
    let funding_sessions = Arc::new(PostgresFundingSessionRepository::new(pool.clone()));

    let gateway_name = match settings.gateway_mode {
        GatewayMode::Live => "live".to_string(),
        GatewayMode::Mock => "mock".to_string(),
    };
    let gateway: Arc<dyn PaymentGateway> = match settings.gateway_mode {
        GatewayMode::Live => Arc::new(LiveGateway::new(
            settings.gateway_api_base.clone(),
            settings.gateway_api_secret.clone(),
            settings.gateway_webhook_secret.clone(),
        )),
        GatewayMode::Mock => Arc::new(MockGateway::new()),
    };

    let authenticator = Arc::new(Authenticator::new(api_keys.clone(), partners.clone()));
    let rate_limiter = Arc::new(RateLimiter::new(settings.rate_limit_per_minute));

    let outbound_webhooks = Arc::new(OutboundWebhookDispatcher::new(pool.clone(), partners.clone()));
    let orchestrator = Arc::new(TransactionOrchestrator::new(pool.clone(), outbound_webhooks));

    let funding = Arc::new(FundingSessionManager::new(
        funding_sessions.clone(),
        wallets.clone(),
        gateway.clone(),
        orchestrator.clone(),
        (settings.funding_session_ttl.as_secs() / 60) as i64,
    ));

    let inbound_webhooks = Arc::new(InboundWebhookProcessor::new(
        gateway.clone(),
        gateway_name.clone(),
        gateway_transactions.clone(),
        transactions.clone(),
        funding.clone(),
    ));

    let state = AppState {
        pool: pool.clone(),
        partners,
        api_keys,
        wallets,
        transactions,
        ledger,
        gateway_transactions,
        funding_sessions,
        gateway,
        authenticator,
        rate_limiter,
        orchestrator,
        funding: funding.clone(),
        inbound_webhooks,
        gateway_name,
    };

    let app = Router::new()
        .route("/health", get(api::health::health))
        .route("/live", get(api::health::live))
        .route("/ready", get(api::health::ready))
        .route("/health/detailed", get(api::health::detailed))
        .route("/metrics", get(api::health::metrics))
        .route(
            "/api/public/funding/sessions/{id}",
            get(api::public::get_funding_session),
        )
        .route(
            "/api/v1/webhooks/{gateway}",
            axum::routing::post(api::webhooks::receive),
        )
        .nest("/api/v1", api::http_routes::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    expiry_job::spawn(funding);

    let listener = tokio::net::TcpListener::bind(settings.addr()).await?;
    info!(addr = %settings.addr(), "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
