//! Admin handlers: balance adjustment, audit log, auto-grading switch.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    AdjustBalanceRequest, AdjustBalanceResponse, AdminLogListResponse, AutoGradingToggleRequest,
    AutoGradingToggleResponse, PaginationParams,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /admin/wallets/adjust` — Credit or debit a wallet manually.
///
/// # Errors
///
/// Returns [`LedgerError`] for a zero amount, blank description, or a
/// debit beyond the balance.
#[utoipa::path(
    post,
    path = "/api/v1/admin/wallets/adjust",
    tag = "Admin",
    summary = "Adjust a balance",
    description = "Positive amounts post an admin_credit, negative amounts an admin_debit. Every attempt is written to the audit log.",
    request_body = AdjustBalanceRequest,
    responses(
        (status = 200, description = "Adjustment applied", body = AdjustBalanceResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 422, description = "Insufficient funds", body = ErrorResponse),
    )
)]
pub async fn adjust_balance(
    State(state): State<AppState>,
    Json(req): Json<AdjustBalanceRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let outcome = state
        .admin_service
        .adjust_balance(
            req.admin_id,
            req.user_id,
            req.amount,
            &req.description,
            req.idempotency_key.as_deref(),
        )
        .await?;

    Ok(Json(AdjustBalanceResponse {
        success: true,
        reference_id: outcome.reference_id,
        transaction_type: outcome.transaction_type,
        new_balance: outcome.new_balance,
        message: outcome.message,
    }))
}

/// `GET /admin/logs` — Audit log, newest first.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/admin/logs",
    tag = "Admin",
    summary = "List audit records",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated audit records", body = AdminLogListResponse),
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, LedgerError> {
    let params = params.clamped();
    let (logs, total) = state
        .admin_service
        .logs(params.per_page, params.offset())
        .await?;
    Ok(Json(AdminLogListResponse {
        success: true,
        logs,
        pagination: params.meta(total),
    }))
}

/// `PUT /admin/auto-grading` — Flip the auto-grading switch.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] if the switch cannot be saved.
#[utoipa::path(
    put,
    path = "/api/v1/admin/auto-grading",
    tag = "Admin",
    summary = "Set auto-grading switch",
    request_body = AutoGradingToggleRequest,
    responses(
        (status = 200, description = "Switch saved", body = AutoGradingToggleResponse),
    )
)]
pub async fn set_auto_grading(
    State(state): State<AppState>,
    Json(req): Json<AutoGradingToggleRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let config = state
        .admin_service
        .set_auto_grading(req.admin_id, req.enabled)
        .await?;
    let message = if config.enabled {
        "Auto-grading enabled"
    } else {
        "Auto-grading disabled"
    };
    Ok(Json(AutoGradingToggleResponse {
        success: true,
        enabled: config.enabled,
        message: message.to_string(),
    }))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/wallets/adjust", post(adjust_balance))
        .route("/admin/logs", get(list_logs))
        .route("/admin/auto-grading", put(set_auto_grading))
}
