//! Grading handlers: manual contest grading and the auto-grading trigger.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AutoGradingResponse, GradeContestRequest, GradeContestResponse, GradingLogListResponse,
    GradingLogParams,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /grading` — Grade a contest with its result.
///
/// # Errors
///
/// Returns [`LedgerError`] if the contest is missing, already graded, or
/// the result is blank.
#[utoipa::path(
    post,
    path = "/api/v1/grading",
    tag = "Grading",
    summary = "Grade a contest",
    description = "Settles every pending prediction of the contest. Winners are credited with the prediction id as reference; a failed credit is logged and excluded from the totals.",
    request_body = GradeContestRequest,
    responses(
        (status = 200, description = "Contest graded", body = GradeContestResponse),
        (status = 404, description = "Contest not found", body = ErrorResponse),
        (status = 409, description = "Contest already graded", body = ErrorResponse),
    )
)]
pub async fn grade_contest(
    State(state): State<AppState>,
    Json(req): Json<GradeContestRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let summary = state
        .grading_service
        .grade_contest(req.contest_id, &req.result)
        .await?;

    Ok(Json(GradeContestResponse {
        success: true,
        winners_count: summary.winners_count,
        total_payout: summary.total_payout,
        total_predictions: summary.total_predictions,
        message: format!(
            "Graded {} predictions: {} winners paid {}",
            summary.total_predictions, summary.winners_count, summary.total_payout
        ),
    }))
}

/// `POST /grading/auto` — Run one auto-grading cycle.
///
/// # Errors
///
/// Returns [`LedgerError::GradingInProgress`] if a cycle is running, or the
/// store error if due contests cannot be listed.
#[utoipa::path(
    post,
    path = "/api/v1/grading/auto",
    tag = "Grading",
    summary = "Trigger auto-grading",
    description = "Reads the global auto-grading switch. When off, returns a skipped result; when on, grades every due contest and logs each outcome.",
    responses(
        (status = 200, description = "Cycle result", body = AutoGradingResponse),
        (status = 409, description = "A cycle is already running", body = ErrorResponse),
        (status = 500, description = "Cycle failed", body = ErrorResponse),
    )
)]
pub async fn trigger_auto_grading(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, LedgerError> {
    let report = state.auto_grader.trigger().await?;
    let message = if report.skipped {
        "Auto-grading is disabled".to_string()
    } else {
        format!(
            "Graded {} contests, {} failed",
            report.graded.len(),
            report.failures.len()
        )
    };
    Ok(Json(AutoGradingResponse {
        success: true,
        message,
        result: report,
    }))
}

/// `GET /grading/logs` — Recent auto-grading records, newest first.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/grading/logs",
    tag = "Grading",
    summary = "List auto-grading records",
    params(GradingLogParams),
    responses(
        (status = 200, description = "Recent records", body = GradingLogListResponse),
    )
)]
pub async fn list_grading_logs(
    State(state): State<AppState>,
    Query(params): Query<GradingLogParams>,
) -> Result<impl IntoResponse, LedgerError> {
    let logs = state
        .auto_grader
        .recent_logs(params.limit.clamp(1, 200))
        .await?;
    Ok(Json(GradingLogListResponse {
        success: true,
        logs,
    }))
}

/// Grading routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/grading", post(grade_contest))
        .route("/grading/auto", post(trigger_auto_grading))
        .route("/grading/logs", get(list_grading_logs))
}
