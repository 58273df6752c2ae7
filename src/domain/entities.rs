use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::error::DomainError;
use crate::domain::money;
use crate::domain::types::{
    ApiKeyId, FundingSessionId, GatewayTransactionId, LedgerEntryId, PartnerId, TransactionId,
    WalletId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "partner_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    Pending,
    Approved,
    Suspended,
    Rejected,
}

/// A B2B tenant. Status transitions one-way from `Pending` into
/// `{Approved, Rejected}`; `Suspended` is reversible from `Approved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub status: PartnerStatus,
    pub webhook_url: Option<String>,
    /// Opaque settings map. Used internally to park the lazily-created
    /// per-currency clearing wallet ids and the outbound-webhook HMAC
    /// secret; never exposed verbatim through the partner API.
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Partner {
    pub fn new(name: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidData("partner name must not be blank".into()));
        }
        Ok(Self {
            id: PartnerId::new(),
            name,
            status: PartnerStatus::Pending,
            webhook_url: None,
            settings: serde_json::json!({}),
            created_at: Utc::now(),
        })
    }

    pub fn is_approved(&self) -> bool {
        self.status == PartnerStatus::Approved
    }

    /// Looks up the clearing wallet recorded for `currency`, if one has
    /// already been created for this partner.
    pub fn clearing_wallet_id(&self, currency: &str) -> Option<WalletId> {
        self.settings
            .get("clearing_wallets")
            .and_then(|m| m.get(currency))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }

    /// Records the clearing wallet id for `currency` in settings,
    /// returning the updated settings blob for persistence.
    pub fn with_clearing_wallet(mut self, currency: &str, wallet_id: WalletId) -> Self {
        let entry = self
            .settings
            .as_object_mut()
            .expect("settings is always a JSON object");
        let map = entry
            .entry("clearing_wallets")
            .or_insert_with(|| serde_json::json!({}));
        map.as_object_mut()
            .expect("clearing_wallets is always a JSON object")
            .insert(currency.to_string(), serde_json::Value::String(wallet_id.to_string()));
        self
    }

    pub fn outbound_webhook_secret(&self) -> Option<String> {
        self.settings
            .get("webhook_secret")
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    pub fn with_webhook_secret(mut self, secret: String) -> Self {
        let entry = self
            .settings
            .as_object_mut()
            .expect("settings is always a JSON object");
        entry.insert("webhook_secret".to_string(), serde_json::Value::String(secret));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "key_environment", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KeyEnvironment {
    Sandbox,
    Production,
}

/// The fixed permission vocabulary a key may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    WalletsRead,
    WalletsWrite,
    TransactionsRead,
    TransactionsWrite,
    PayoutsWrite,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::WalletsRead => "wallets:read",
            Permission::WalletsWrite => "wallets:write",
            Permission::TransactionsRead => "transactions:read",
            Permission::TransactionsWrite => "transactions:write",
            Permission::PayoutsWrite => "payouts:write",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wallets:read" => Some(Permission::WalletsRead),
            "wallets:write" => Some(Permission::WalletsWrite),
            "transactions:read" => Some(Permission::TransactionsRead),
            "transactions:write" => Some(Permission::TransactionsWrite),
            "payouts:write" => Some(Permission::PayoutsWrite),
            _ => None,
        }
    }
}

/// A credential belonging to one partner. The plaintext secret is never
/// stored — only its SHA-256 hex digest (`hash`) — and is handed back to
/// the caller exactly once, at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub partner_id: PartnerId,
    pub hash: String,
    pub environment: KeyEnvironment,
    pub permissions: HashSet<Permission>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn new(
        partner_id: PartnerId,
        hash: String,
        environment: KeyEnvironment,
        permissions: HashSet<Permission>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: ApiKeyId::new(),
            partner_id,
            hash,
            environment,
            permissions,
            active: true,
            expires_at,
            last_used_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_none_or(|exp| exp > now)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "wallet_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Active,
    Suspended,
    Closed,
}

/// A partner-scoped account. Partner and currency are fixed at creation
/// and never change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub partner_id: PartnerId,
    pub external_user_id: Option<String>,
    pub external_wallet_id: Option<String>,
    pub name: String,
    pub currency: String,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(
        partner_id: PartnerId,
        name: String,
        currency: String,
        external_user_id: Option<String>,
        external_wallet_id: Option<String>,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidData("wallet name must not be blank".into()));
        }
        let currency = currency.trim().to_uppercase();
        money::ensure_currency(&currency).map_err(|e| DomainError::InvalidData(e.to_string()))?;

        Ok(Self {
            id: WalletId::new(),
            partner_id,
            external_user_id,
            external_wallet_id,
            name,
            currency,
            status: WalletStatus::Active,
            created_at: Utc::now(),
        })
    }

    /// Internal, partner-owned counterparty for single-sided credits and
    /// debits. Never exposed through the partner API.
    pub fn new_clearing(partner_id: PartnerId, currency: String) -> Self {
        Self {
            id: WalletId::new(),
            partner_id,
            external_user_id: None,
            external_wallet_id: None,
            name: clearing_wallet_name(&currency),
            currency,
            status: WalletStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    /// A clearing wallet is the internal counterparty booked against
    /// every single-sided credit or debit — it is allowed to run
    /// negative, since it is one leg of a balanced double entry rather
    /// than a partner-owned store of funds.
    pub fn is_clearing(&self) -> bool {
        is_clearing_wallet_name(&self.name)
    }
}

/// Naming convention shared by `Wallet::new_clearing` and every reader
/// (the ledger engine, repositories) that needs to recognize a clearing
/// wallet from a row without a dedicated boolean column.
pub fn clearing_wallet_name(currency: &str) -> String {
    format!("clearing:{currency}")
}

pub fn is_clearing_wallet_name(name: &str) -> bool {
    name.starts_with("clearing:")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

/// A single logical money movement. Once `Completed` or `Failed`, every
/// field here is immutable — only a `Pending` row may still be updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
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

impl Transaction {
    pub fn new_pending(
        partner_id: PartnerId,
        transaction_type: TransactionType,
        amount: Decimal,
        currency: String,
        from_wallet_id: Option<WalletId>,
        to_wallet_id: Option<WalletId>,
        description: Option<String>,
        idempotency_key: Option<String>,
    ) -> Result<Self, DomainError> {
        money::ensure_positive_two_dp(amount).map_err(|e| DomainError::InvalidData(e.to_string()))?;

        match transaction_type {
            TransactionType::Credit if to_wallet_id.is_none() => {
                return Err(DomainError::InvalidData("credit requires to_wallet_id".into()))
            }
            TransactionType::Debit if from_wallet_id.is_none() => {
                return Err(DomainError::InvalidData("debit requires from_wallet_id".into()))
            }
            TransactionType::Transfer if from_wallet_id.is_none() || to_wallet_id.is_none() => {
                return Err(DomainError::InvalidData(
                    "transfer requires both from_wallet_id and to_wallet_id".into(),
                ))
            }
            _ => {}
        }

        let now = Utc::now();
        Ok(Self {
            id: TransactionId::new(),
            partner_id,
            transaction_type,
            status: TransactionStatus::Pending,
            amount,
            currency,
            from_wallet_id,
            to_wallet_id,
            description,
            idempotency_key,
            gateway_transaction_id: None,
            gateway: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Debit,
    Credit,
}

/// An append-only ledger post. `balance` is the wallet's balance
/// immediately after this entry, computed exactly once, at append time,
/// under the wallet's row lock. Never mutated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
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

/// A single instruction for `LedgerEngine::append`: one side of a
/// balanced post, not yet assigned a resulting balance.
#[derive(Debug, Clone)]
pub struct LedgerEntryRequest {
    pub wallet_id: WalletId,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
}

/// Processor-side mirror of an external webhook event. Uniqueness is
/// per-event (`gateway_transaction_id`) so duplicate deliveries never
/// create duplicate rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayTransaction {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "funding_session_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FundingSessionStatus {
    Created,
    Active,
    Completed,
    Failed,
    Expired,
}

impl FundingSessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FundingSessionStatus::Completed | FundingSessionStatus::Failed | FundingSessionStatus::Expired
        )
    }
}

/// A pending funding of one wallet, tied to an external payment intent.
/// Transitions `created -> active -> {completed, failed}`, or to
/// `expired` once `expires_at` passes while still non-terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSession {
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

impl FundingSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clearing_wallets_are_recognized_as_clearing() {
        let wallet = Wallet::new_clearing(PartnerId::new(), "USD".to_string());
        assert!(wallet.is_clearing());
    }

    #[test]
    fn ordinary_wallets_are_not_clearing() {
        let wallet = Wallet::new(
            PartnerId::new(),
            "checking".to_string(),
            "USD".to_string(),
            None,
            None,
        )
        .unwrap();
        assert!(!wallet.is_clearing());
    }
}
