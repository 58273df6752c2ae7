use axum::http::HeaderMap;

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::auth::{AuthContext, Permission};
use crate::domain::error::DomainError;

/// Runs the three checks every partner route needs, in the order the
/// error taxonomy expects them: authenticate the bearer token (401),
/// then check the per-key rate limit (429), then require the route's
/// permission (403). Wallet-ownership, where it applies, is checked
/// separately by the handler once the wallet has been loaded.
pub async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    permission: Permission,
) -> Result<AuthContext, ApiError> {
    let secret = bearer_secret(headers)?;
    let ctx = state.authenticator.authenticate(&secret).await?;

    let decision = state.rate_limiter.check(ctx.api_key.id);
    if !decision.allowed {
        crate::observability::metrics::record_rate_limited();
        return Err(ApiError::RateLimited(decision));
    }

    crate::auth::require_permission(&ctx, permission)?;
    Ok(ctx)
}

fn bearer_secret(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DomainError::Unauthenticated("missing authorization header".into()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| DomainError::Unauthenticated("authorization header must be a bearer token".into()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(bearer_secret(&headers).is_err());
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert!(bearer_secret(&headers).is_err());
    }

    #[test]
    fn extracts_bearer_secret() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer sk_test_abc".parse().unwrap(),
        );
        let secret = bearer_secret(&headers).map_err(|_| ()).expect("secret");
        assert_eq!(secret, "sk_test_abc");
    }
}
