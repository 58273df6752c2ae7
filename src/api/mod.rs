pub mod error;
pub mod health;
pub mod http_routes;
pub mod middleware;
pub mod public;
pub mod requests;
pub mod responses;
pub mod webhooks;

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{Authenticator, RateLimiter};
use crate::domain::repository::{
    ApiKeyRepository, FundingSessionRepository, GatewayTransactionRepository, PartnerRepository,
    TransactionRepository, WalletRepository,
};
use crate::funding::FundingSessionManager;
use crate::infrastructure::gateways::PaymentGateway;
use crate::orchestrator::TransactionOrchestrator;
use crate::webhooks::InboundWebhookProcessor;

/// Everything a handler needs, shared behind `Arc` and injected once at
/// startup via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub partners: Arc<dyn PartnerRepository>,
    pub api_keys: Arc<dyn ApiKeyRepository>,
    pub wallets: Arc<dyn WalletRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub ledger: Arc<dyn crate::domain::repository::LedgerRepository>,
    pub gateway_transactions: Arc<dyn GatewayTransactionRepository>,
    pub funding_sessions: Arc<dyn FundingSessionRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub authenticator: Arc<Authenticator>,
    pub rate_limiter: Arc<RateLimiter>,
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub funding: Arc<FundingSessionManager>,
    pub inbound_webhooks: Arc<InboundWebhookProcessor>,
    pub gateway_name: String,
}
