use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::collections::HashSet;

use crate::domain::entities::{
    ApiKey, FundingSession, FundingSessionStatus, GatewayTransaction, KeyEnvironment, LedgerEntry,
    EntryType, Partner, PartnerStatus, Permission, Transaction, TransactionStatus, TransactionType,
    Wallet, WalletStatus,
};
use crate::domain::types::{
    ApiKeyId, FundingSessionId, GatewayTransactionId, LedgerEntryId, PartnerId, TransactionId,
    WalletId,
};

#[derive(Debug, FromRow)]
pub struct PartnerRow {
    pub id: PartnerId,
    pub name: String,
    pub status: PartnerStatus,
    pub webhook_url: Option<String>,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<PartnerRow> for Partner {
    fn from(r: PartnerRow) -> Self {
        Partner {
            id: r.id,
            name: r.name,
            status: r.status,
            webhook_url: r.webhook_url,
            settings: r.settings,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ApiKeyRow {
    pub id: ApiKeyId,
    pub partner_id: PartnerId,
    pub hash: String,
    pub environment: KeyEnvironment,
    pub permissions: Vec<String>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(r: ApiKeyRow) -> Self {
        ApiKey {
            id: r.id,
            partner_id: r.partner_id,
            hash: r.hash,
            environment: r.environment,
            permissions: r
                .permissions
                .iter()
                .filter_map(|p| Permission::parse(p))
                .collect::<HashSet<_>>(),
            active: r.active,
            expires_at: r.expires_at,
            last_used_at: r.last_used_at,
            created_at: r.created_at,
        }
    }
}

pub fn permissions_to_strings(permissions: &HashSet<Permission>) -> Vec<String> {
    permissions.iter().map(|p| p.as_str().to_string()).collect()
}

#[derive(Debug, FromRow)]
pub struct WalletRow {
    pub id: WalletId,
    pub partner_id: PartnerId,
    pub external_user_id: Option<String>,
    pub external_wallet_id: Option<String>,
    pub name: String,
    pub currency: String,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
}

impl From<WalletRow> for Wallet {
    fn from(r: WalletRow) -> Self {
        Wallet {
            id: r.id,
            partner_id: r.partner_id,
            external_user_id: r.external_user_id,
            external_wallet_id: r.external_wallet_id,
            name: r.name,
            currency: r.currency,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub partner_id: PartnerId,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub currency: String,
    pub from_wallet_id: Option<WalletId>,
    pub to_wallet_id: Option<WalletId>,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub gateway: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(r: TransactionRow) -> Self {
        Transaction {
            id: r.id,
            partner_id: r.partner_id,
            transaction_type: r.transaction_type,
            status: r.status,
            amount: r.amount,
            currency: r.currency,
            from_wallet_id: r.from_wallet_id,
            to_wallet_id: r.to_wallet_id,
            description: r.description,
            idempotency_key: r.idempotency_key,
            gateway_transaction_id: r.gateway_transaction_id,
            gateway: r.gateway,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LedgerEntryRow {
    pub id: LedgerEntryId,
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub currency: String,
    pub balance: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntryRow> for LedgerEntry {
    fn from(r: LedgerEntryRow) -> Self {
        LedgerEntry {
            id: r.id,
            transaction_id: r.transaction_id,
            wallet_id: r.wallet_id,
            entry_type: r.entry_type,
            amount: r.amount,
            currency: r.currency,
            balance: r.balance,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct GatewayTransactionRow {
    pub id: GatewayTransactionId,
    pub gateway_transaction_id: String,
    pub gateway: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub webhook_data: serde_json::Value,
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
}

impl From<GatewayTransactionRow> for GatewayTransaction {
    fn from(r: GatewayTransactionRow) -> Self {
        GatewayTransaction {
            id: r.id,
            gateway_transaction_id: r.gateway_transaction_id,
            gateway: r.gateway,
            status: r.status,
            amount: r.amount,
            currency: r.currency,
            webhook_data: r.webhook_data,
            transaction_id: r.transaction_id,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct FundingSessionRow {
    pub id: FundingSessionId,
    pub wallet_id: WalletId,
    pub partner_id: PartnerId,
    pub payment_intent_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: FundingSessionStatus,
    pub expires_at: DateTime<Utc>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FundingSessionRow> for FundingSession {
    fn from(r: FundingSessionRow) -> Self {
        FundingSession {
            id: r.id,
            wallet_id: r.wallet_id,
            partner_id: r.partner_id,
            payment_intent_id: r.payment_intent_id,
            amount: r.amount,
            currency: r.currency,
            status: r.status,
            expires_at: r.expires_at,
            success_url: r.success_url,
            cancel_url: r.cancel_url,
            metadata: r.metadata,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
