use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::RateLimitDecision;
use crate::domain::error::DomainError;

/// Unified error envelope for every partner-facing, public, and webhook
/// route. Maps the domain error taxonomy onto the status codes in the
/// external-interfaces error table — never leaks storage details.
pub enum ApiError {
    Domain(DomainError),
    RateLimited(RateLimitDecision),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let domain = match self {
            ApiError::Domain(err) => err,
            ApiError::RateLimited(decision) => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": "rate_limited", "details": "rate limit exceeded" })),
                )
                    .into_response();
                apply_rate_limit_headers(&mut response, &decision);
                return response;
            }
        };

        let (status, kind, message) = match &domain {
            DomainError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "authentication", msg.clone()),

            DomainError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            DomainError::WalletNotOwned(id) => (
                StatusCode::FORBIDDEN,
                "forbidden",
                format!("wallet {id} is not in the caller's scope"),
            ),

            DomainError::WalletNotFound(_)
            | DomainError::TransactionNotFound(_)
            | DomainError::FundingSessionNotFound(_)
            | DomainError::PartnerNotFound(_)
            | DomainError::ApiKeyNotFound => (StatusCode::NOT_FOUND, "not_found", domain.to_string()),

            DomainError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            DomainError::DuplicateIdempotencyKey(_) => {
                (StatusCode::CONFLICT, "conflict", domain.to_string())
            }

            DomainError::InvalidData(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            DomainError::InvalidWebhookSignature => {
                (StatusCode::BAD_REQUEST, "validation", domain.to_string())
            }

            DomainError::WalletNotActive(_)
            | DomainError::InsufficientFunds(_)
            | DomainError::CurrencyMismatch { .. }
            | DomainError::Unbalanced(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable", domain.to_string()),

            DomainError::Gateway(msg) => {
                tracing::error!(error = %msg, "gateway adapter failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error".to_string())
            }
            DomainError::Storage(err) => {
                tracing::error!(%err, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": kind, "details": message }))).into_response()
    }
}

fn apply_rate_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert(
        "X-RateLimit-Limit",
        HeaderValue::from_str(&decision.limit.to_string()).expect("digits are valid header values"),
    );
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from_str(&decision.remaining.to_string()).expect("digits are valid header values"),
    );
    headers.insert(
        "X-RateLimit-Reset",
        HeaderValue::from_str(&decision.reset_after_secs.to_string()).expect("digits are valid header values"),
    );
}

/// Distinct status for the one case the error table splits out from the
/// generic `not_found`/`unprocessable` buckets: an expired funding
/// session paid against.
pub struct GoneError(pub String);

impl IntoResponse for GoneError {
    fn into_response(self) -> Response {
        (
            StatusCode::GONE,
            Json(json!({ "error": "gone", "details": self.0 })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_response_carries_the_three_headers() {
        let decision = RateLimitDecision {
            allowed: false,
            limit: 1000,
            remaining: 0,
            reset_after_secs: 42,
        };
        let response = ApiError::RateLimited(decision).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "1000");
        assert_eq!(response.headers().get("X-RateLimit-Remaining").unwrap(), "0");
        assert_eq!(response.headers().get("X-RateLimit-Reset").unwrap(), "42");
    }

    #[test]
    fn not_found_domain_errors_map_to_404() {
        let response = ApiError::Domain(DomainError::WalletNotFound(
            crate::domain::types::WalletId::new(),
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
