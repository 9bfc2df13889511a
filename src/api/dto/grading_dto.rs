//! Grading DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ContestId, GradingLogEntry};
use crate::service::CycleReport;

/// Request body for `POST /grading`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeContestRequest {
    /// Contest to grade.
    pub contest_id: ContestId,
    /// Authoritative outcome string.
    pub result: String,
}

/// Response body for `POST /grading`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GradeContestResponse {
    /// Always `true`.
    pub success: bool,
    /// Winners credited.
    pub winners_count: u64,
    /// Sum of credited payouts.
    #[schema(value_type = String)]
    pub total_payout: Decimal,
    /// Pending predictions evaluated.
    pub total_predictions: u64,
    /// Human-readable summary.
    pub message: String,
}

/// Response body for `POST /grading/auto`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AutoGradingResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Cycle details.
    pub result: CycleReport,
}

/// Query parameters for `GET /grading/logs`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GradingLogParams {
    /// Maximum records returned (max 200). Defaults to 50.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

/// Response body for `GET /grading/logs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct GradingLogListResponse {
    /// Always `true`.
    pub success: bool,
    /// Records, newest first.
    pub logs: Vec<GradingLogEntry>,
}
