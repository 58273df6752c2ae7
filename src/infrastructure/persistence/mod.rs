pub mod api_key_repository;
pub mod db;
pub mod funding_session_repository;
pub mod gateway_transaction_repository;
pub mod ledger_repository;
pub mod models;
pub mod partner_repository;
pub mod transaction_repository;
pub mod wallet_repository;

pub use api_key_repository::PostgresApiKeyRepository;
pub use funding_session_repository::PostgresFundingSessionRepository;
pub use gateway_transaction_repository::PostgresGatewayTransactionRepository;
pub use ledger_repository::PostgresLedgerRepository;
pub use partner_repository::PostgresPartnerRepository;
pub use transaction_repository::PostgresTransactionRepository;
pub use wallet_repository::PostgresWalletRepository;
