use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::entities::FundingSessionStatus;
use crate::domain::types::{FundingSessionId, WalletId};

/// `GET /wallets/{id}/balance`
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
    pub currency: String,
}

/// Wraps any `Vec<T>` listing endpoint with the pagination window that
/// produced it, so callers can tell an empty page from the last page.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

/// `GET /api/public/funding/sessions/{id}`. Deliberately narrower than
/// the full `FundingSession` entity: omits `payment_intent_id` and
/// carries the client secret fetched on demand from the gateway, never
/// persisted alongside the session row.
#[derive(Debug, Serialize)]
pub struct PublicFundingSessionResponse {
    pub id: FundingSessionId,
    pub status: FundingSessionStatus,
    pub amount: Decimal,
    pub currency: String,
    pub wallet_id: WalletId,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub metadata: serde_json::Value,
    pub client_secret: Option<String>,
}
