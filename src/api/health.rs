use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api::AppState;

/// `GET /health` — process is up, no dependency checks.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "process is up")))]
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `GET /live` — liveness probe, identical to `/health` by design: a
/// stuck event loop would fail to answer either.
pub async fn live() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `GET /ready` — readiness probe: the database must answer a trivial
/// query before traffic is routed here.
#[utoipa::path(get, path = "/ready", responses((status = 200, description = "ready to accept traffic"), (status = 503, description = "database unreachable")))]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(err) => {
            tracing::error!(%err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready" })),
            )
        }
    }
}

/// `GET /health/detailed` — per-dependency breakdown for operators.
pub async fn detailed(State(state): State<AppState>) -> impl IntoResponse {
    let database = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    let status = if database { "ok" } else { "degraded" };
    let code = if database { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        code,
        Json(json!({
            "status": status,
            "checks": {
                "database": if database { "ok" } else { "failed" },
            },
        })),
    )
}

/// `GET /metrics` — Prometheus text exposition format.
pub async fn metrics() -> impl IntoResponse {
    crate::observability::metrics::render()
}
