use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::api::AppState;

const STRIPE_STYLE_SIGNATURE_HEADER: &str = "X-Gateway-Signature";

/// `POST /api/v1/webhooks/{gateway}`. The body is read as raw bytes and
/// handed to the signature check before any JSON parsing happens — a
/// malformed-but-unsigned payload must never reach the parser.
pub async fn receive(
    State(state): State<AppState>,
    Path(gateway): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    if gateway != state.gateway_name {
        return (StatusCode::NOT_FOUND, "unknown gateway").into_response();
    }

    let signature = headers
        .get(STRIPE_STYLE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match state.inbound_webhooks.handle(&body, signature).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            tracing::warn!(%err, "inbound webhook rejected");
            (StatusCode::BAD_REQUEST, "webhook verification failed").into_response()
        }
    }
}
