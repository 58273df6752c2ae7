use rust_decimal::Decimal;
use serde::Deserialize;

/// `POST /wallets`
#[derive(Debug, Deserialize)]
pub struct CreateWalletRequest {
    pub name: String,
    pub currency: String,
    pub external_user_id: Option<String>,
    pub external_wallet_id: Option<String>,
}

/// `POST /wallets/{id}/credit` and `/debit`. `rust_decimal`'s serde
/// support accepts both a decimal string (`"50.00"`) and a bare JSON
/// number, so the same type serves every amount field in this module.
#[derive(Debug, Deserialize)]
pub struct MoveMoneyRequest {
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

/// `POST /transfers`
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_wallet_id: String,
    pub to_wallet_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

/// `POST /wallets/{id}/fund`. The spec carves out exactly one exception
/// to the decimal-string convention: this endpoint accepts a positive
/// number for `amount`.
#[derive(Debug, Deserialize)]
pub struct CreateFundingSessionRequest {
    pub amount: Decimal,
    pub currency: String,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

/// `POST /payouts`
#[derive(Debug, Deserialize)]
pub struct CreatePayoutRequest {
    pub from_wallet_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub destination: String,
    pub idempotency_key: Option<String>,
}

/// Pagination shared by every `{limit, offset}` listing endpoint.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub const MAX_LIMIT: i64 = 200;
    pub const DEFAULT_LIMIT: i64 = 50;

    pub fn normalized(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}
