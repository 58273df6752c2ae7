use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use crate::api::error::{ApiError, GoneError};
use crate::api::responses::PublicFundingSessionResponse;
use crate::api::AppState;
use crate::domain::error::DomainError;
use crate::domain::types::FundingSessionId;

/// `GET /api/public/funding/sessions/{id}` — no authentication. Backs
/// the hosted payment page; returns the client secret fetched fresh
/// from the gateway rather than a persisted copy.
pub async fn get_funding_session(
    State(state): State<AppState>,
    Path(id): Path<FundingSessionId>,
) -> Result<Response, ApiError> {
    let session = state
        .funding_sessions
        .find_by_id(id)
        .await?
        .ok_or(DomainError::FundingSessionNotFound(id))?;

    if session.is_expired(chrono::Utc::now()) {
        return Ok(GoneError("funding session has expired".to_string()).into_response());
    }

    let client_secret = state
        .gateway
        .get_payment_intent(&session.payment_intent_id)
        .await
        .ok()
        .and_then(|intent| intent.client_secret);

    let body = PublicFundingSessionResponse {
        id: session.id,
        status: session.status,
        amount: session.amount,
        currency: session.currency,
        wallet_id: session.wallet_id,
        expires_at: session.expires_at,
        metadata: session.metadata,
        client_secret,
    };

    Ok(axum::Json(body).into_response())
}
