use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::error::ApiError;
use crate::api::middleware::authorize;
use crate::api::requests::{
    CreateFundingSessionRequest, CreatePayoutRequest, CreateWalletRequest, MoveMoneyRequest,
    PaginationQuery, TransferRequest,
};
use crate::api::responses::{BalanceResponse, Page};
use crate::api::AppState;
use crate::auth::Permission;
use crate::domain::entities::{Transaction, TransactionType, Wallet};
use crate::domain::error::DomainError;
use crate::domain::types::{TransactionId, WalletId};
use crate::funding::CreateFundingSessionRequest as FundingCommand;
use crate::orchestrator::PostCommand;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets", post(create_wallet).get(list_wallets))
        .route("/wallets/{id}", get(get_wallet))
        .route("/wallets/external/{external_id}", get(get_wallet_by_external))
        .route("/wallets/{id}/balance", get(get_balance))
        .route("/wallets/{id}/credit", post(credit_wallet))
        .route("/wallets/{id}/debit", post(debit_wallet))
        .route("/transfers", post(create_transfer))
        .route("/wallets/{id}/fund", post(create_funding_session))
        .route("/funding/sessions/{id}", get(get_funding_session))
        .route("/wallets/{id}/transactions", get(list_wallet_transactions))
        .route("/transactions/{id}", get(get_transaction))
        .route("/payouts", post(create_payout))
}

/// Loads `wallet_id`, 404ing if it doesn't exist, then 403ing if it
/// does but belongs to a different partner than the caller — ownership
/// is checked strictly after existence so the response shape never
/// betrays which is which to a key scanning ids.
async fn load_owned_wallet(
    state: &AppState,
    wallet_id: WalletId,
    partner_id: crate::domain::types::PartnerId,
) -> Result<Wallet, ApiError> {
    let wallet = state
        .wallets
        .find_by_id(wallet_id)
        .await?
        .ok_or(DomainError::WalletNotFound(wallet_id))?;

    if wallet.partner_id != partner_id {
        return Err(DomainError::WalletNotOwned(wallet_id).into());
    }
    Ok(wallet)
}

pub async fn create_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<Wallet>), ApiError> {
    let ctx = authorize(&state, &headers, Permission::WalletsWrite).await?;

    let wallet = Wallet::new(
        ctx.partner_id(),
        req.name,
        req.currency,
        req.external_user_id,
        req.external_wallet_id,
    )?;
    let wallet = state.wallets.create(wallet).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn list_wallets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Wallet>>, ApiError> {
    let ctx = authorize(&state, &headers, Permission::WalletsRead).await?;
    let wallets = state.wallets.list_for_partner(ctx.partner_id()).await?;
    Ok(Json(wallets))
}

pub async fn get_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<WalletId>,
) -> Result<Json<Wallet>, ApiError> {
    let ctx = authorize(&state, &headers, Permission::WalletsRead).await?;
    let wallet = load_owned_wallet(&state, id, ctx.partner_id()).await?;
    Ok(Json(wallet))
}

pub async fn get_wallet_by_external(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(external_id): Path<String>,
) -> Result<Json<Wallet>, ApiError> {
    let ctx = authorize(&state, &headers, Permission::WalletsRead).await?;
    let wallet = state
        .wallets
        .find_by_external_wallet_id(ctx.partner_id(), &external_id)
        .await?
        .ok_or_else(|| DomainError::InvalidData(format!("no wallet with external id {external_id}")))?;
    Ok(Json(wallet))
}

pub async fn get_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<WalletId>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let ctx = authorize(&state, &headers, Permission::WalletsRead).await?;
    let wallet = load_owned_wallet(&state, id, ctx.partner_id()).await?;
    let balance = state.wallets.balance(wallet.id).await?;
    Ok(Json(BalanceResponse {
        balance,
        currency: wallet.currency,
    }))
}

pub async fn credit_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<WalletId>,
    Json(req): Json<MoveMoneyRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let ctx = authorize(&state, &headers, Permission::TransactionsWrite).await?;

    let transaction = state
        .orchestrator
        .post(PostCommand {
            partner_id: ctx.partner_id(),
            transaction_type: TransactionType::Credit,
            from_wallet_id: None,
            to_wallet_id: Some(id),
            amount: req.amount,
            currency: req.currency,
            description: req.description,
            idempotency_key: req.idempotency_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn debit_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<WalletId>,
    Json(req): Json<MoveMoneyRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let ctx = authorize(&state, &headers, Permission::TransactionsWrite).await?;

    let transaction = state
        .orchestrator
        .post(PostCommand {
            partner_id: ctx.partner_id(),
            transaction_type: TransactionType::Debit,
            from_wallet_id: Some(id),
            to_wallet_id: None,
            amount: req.amount,
            currency: req.currency,
            description: req.description,
            idempotency_key: req.idempotency_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn create_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let ctx = authorize(&state, &headers, Permission::TransactionsWrite).await?;

    let from_wallet_id: WalletId = req
        .from_wallet_id
        .parse()
        .map_err(|_| DomainError::InvalidData("from_wallet_id is not a valid id".into()))?;
    let to_wallet_id: WalletId = req
        .to_wallet_id
        .parse()
        .map_err(|_| DomainError::InvalidData("to_wallet_id is not a valid id".into()))?;

    let transaction = state
        .orchestrator
        .post(PostCommand {
            partner_id: ctx.partner_id(),
            transaction_type: TransactionType::Transfer,
            from_wallet_id: Some(from_wallet_id),
            to_wallet_id: Some(to_wallet_id),
            amount: req.amount,
            currency: req.currency,
            description: req.description,
            idempotency_key: req.idempotency_key,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn create_funding_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<WalletId>,
    Json(req): Json<CreateFundingSessionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let ctx = authorize(&state, &headers, Permission::WalletsWrite).await?;
    load_owned_wallet(&state, id, ctx.partner_id()).await?;

    let session = state
        .funding
        .create(FundingCommand {
            wallet_id: id,
            partner_id: ctx.partner_id(),
            amount: req.amount,
            currency: req.currency,
            success_url: req.success_url,
            cancel_url: req.cancel_url,
            metadata: req.metadata,
        })
        .await?;

    let public_url = format!("/pay/{}", session.id);
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session": session,
            "url": public_url,
        })),
    ))
}

pub async fn get_funding_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<crate::domain::types::FundingSessionId>,
) -> Result<Json<crate::domain::entities::FundingSession>, ApiError> {
    let ctx = authorize(&state, &headers, Permission::WalletsRead).await?;
    let session = state.funding.get(id).await?;

    if session.partner_id != ctx.partner_id() {
        return Err(DomainError::FundingSessionNotFound(id).into());
    }
    Ok(Json(session))
}

pub async fn list_wallet_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<WalletId>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Page<Transaction>>, ApiError> {
    let ctx = authorize(&state, &headers, Permission::TransactionsRead).await?;
    load_owned_wallet(&state, id, ctx.partner_id()).await?;

    let (limit, offset) = pagination.normalized();
    let items = state.transactions.list_for_wallet(id, limit, offset).await?;
    Ok(Json(Page { items, limit, offset }))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TransactionId>,
) -> Result<Json<Transaction>, ApiError> {
    let ctx = authorize(&state, &headers, Permission::TransactionsRead).await?;

    let transaction = state
        .transactions
        .find_by_id(id)
        .await?
        .ok_or(DomainError::TransactionNotFound(id))?;

    if transaction.partner_id != ctx.partner_id() {
        return Err(DomainError::TransactionNotFound(id).into());
    }
    Ok(Json(transaction))
}

pub async fn create_payout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreatePayoutRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let ctx = authorize(&state, &headers, Permission::PayoutsWrite).await?;

    let from_wallet_id: WalletId = req
        .from_wallet_id
        .parse()
        .map_err(|_| DomainError::InvalidData("from_wallet_id is not a valid id".into()))?;

    let transaction = state
        .orchestrator
        .post(PostCommand {
            partner_id: ctx.partner_id(),
            transaction_type: TransactionType::Debit,
            from_wallet_id: Some(from_wallet_id),
            to_wallet_id: None,
            amount: req.amount,
            currency: req.currency.clone(),
            description: Some(format!("payout to {}", req.destination)),
            idempotency_key: req.idempotency_key,
        })
        .await?;

    if transaction.status != crate::domain::entities::TransactionStatus::Completed {
        return Ok((StatusCode::CREATED, Json(transaction)));
    }

    match state
        .gateway
        .create_payout(req.amount, &req.currency, &req.destination)
        .await
    {
        Ok(payout) => {
            let mut updated = transaction;
            updated.gateway_transaction_id = Some(payout.id);
            updated.gateway = Some(state.gateway_name.clone());
            let updated = state.transactions.update(updated).await?;
            Ok((StatusCode::CREATED, Json(updated)))
        }
        Err(err) => {
            tracing::error!(%err, transaction_id = %transaction.id, "payout debited locally but the processor call failed; reconcile manually");
            Ok((StatusCode::CREATED, Json(transaction)))
        }
    }
}
