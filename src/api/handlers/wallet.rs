//! Wallet handlers: deposit, withdraw, interest toggle, balance, history.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    DepositRequest, DepositResponse, InterestRequest, MessageResponse, PaginationParams,
    TransactionListResponse, WalletResponse, WithdrawRequest, WithdrawResponse,
};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ErrorResponse, LedgerError};
use crate::service::DepositCommand;

/// `POST /wallet/deposit` — Credit a deposit (and first-deposit bonus).
///
/// # Errors
///
/// Returns [`LedgerError`] for invalid amounts, unsupported methods or
/// store failures.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/deposit",
    tag = "Wallet",
    summary = "Deposit funds",
    description = "Credits the principal under a payment id derived from the method and idempotency key. The first deposit of a user also earns the welcome bonus. Retrying with the same idempotency key never credits twice.",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Deposit credited", body = DepositResponse),
        (status = 400, description = "Invalid amount or method", body = ErrorResponse),
        (status = 409, description = "Idempotency key owned by another user", body = ErrorResponse),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let outcome = state
        .wallet_service
        .process_deposit(DepositCommand {
            user_id: req.user_id,
            amount: req.amount,
            method: req.method,
            language: req.language,
            idempotency_key: req.idempotency_key,
        })
        .await?;

    Ok(Json(DepositResponse {
        success: true,
        payment_id: outcome.payment_id,
        amount: outcome.amount,
        method: outcome.method,
        bonus: outcome.bonus,
        new_balance: outcome.new_balance,
        message: outcome.message,
    }))
}

/// `POST /wallet/withdraw` — Request a withdrawal.
///
/// # Errors
///
/// Returns [`LedgerError`] when the minimum, balance or KYC checks fail.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/withdraw",
    tag = "Wallet",
    summary = "Withdraw funds",
    description = "Checks the minimum, the balance and the KYC daily limit in that order, then debits the wallet. Disbursement follows within 24 hours.",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal accepted", body = WithdrawResponse),
        (status = 400, description = "Below minimum", body = ErrorResponse),
        (status = 403, description = "KYC required or daily limit exceeded", body = ErrorResponse),
        (status = 422, description = "Insufficient funds", body = ErrorResponse),
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let outcome = state
        .wallet_service
        .process_withdrawal(req.user_id, req.amount, req.idempotency_key.as_deref())
        .await?;

    Ok(Json(WithdrawResponse {
        success: true,
        amount: outcome.amount,
        reference_id: outcome.reference_id,
        new_balance: outcome.new_balance,
        message: outcome.message,
    }))
}

/// `POST /wallet/interest` — Enable or disable interest accrual.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] if the flag cannot be saved.
#[utoipa::path(
    post,
    path = "/api/v1/wallet/interest",
    tag = "Wallet",
    summary = "Toggle interest",
    request_body = InterestRequest,
    responses(
        (status = 200, description = "Flag saved", body = MessageResponse),
    )
)]
pub async fn set_interest(
    State(state): State<AppState>,
    Json(req): Json<InterestRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let setting = state
        .wallet_service
        .set_interest(req.user_id, req.enabled)
        .await?;
    let message = if setting.enabled {
        "Interest enabled"
    } else {
        "Interest disabled"
    };
    Ok(Json(MessageResponse {
        success: true,
        message: message.to_string(),
    }))
}

/// `GET /wallets/{user_id}` — Current balance and counters.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFound`] if the user has no wallet.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{user_id}",
    tag = "Wallet",
    summary = "Get wallet",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Wallet", body = WalletResponse),
        (status = 404, description = "No wallet for user", body = ErrorResponse),
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, LedgerError> {
    let (wallet, interest_enabled) = state.wallet_service.wallet(user_id).await?;
    Ok(Json(WalletResponse {
        success: true,
        wallet,
        interest_enabled,
    }))
}

/// `GET /wallets/{user_id}/transactions` — Ledger history, newest first.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{user_id}/transactions",
    tag = "Wallet",
    summary = "List ledger entries",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User UUID"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Paginated entries", body = TransactionListResponse),
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, LedgerError> {
    let params = params.clamped();
    let (transactions, total) = state
        .wallet_service
        .transactions(user_id, params.per_page, params.offset())
        .await?;

    Ok(Json(TransactionListResponse {
        success: true,
        transactions,
        pagination: params.meta(total),
    }))
}

/// Wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/deposit", post(deposit))
        .route("/wallet/withdraw", post(withdraw))
        .route("/wallet/interest", post(set_interest))
        .route("/wallets/{user_id}", get(get_wallet))
        .route("/wallets/{user_id}/transactions", get(list_transactions))
}
