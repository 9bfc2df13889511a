//! Audit records and per-user / global settings that sit beside the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ContestId, UserId};

/// Append-only record of an administrative or settings action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdminLogEntry {
    /// Row identity.
    pub id: i64,
    /// Actor that performed the action.
    pub admin_id: UserId,
    /// User the action applied to, if any.
    pub target_user_id: Option<UserId>,
    /// Action discriminator (e.g. `"balance_adjustment"`).
    pub action: String,
    /// Structured details.
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    /// Time the record was written.
    pub created_at: DateTime<Utc>,
}

/// Input for [`AdminLogEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminLogEntry {
    /// Actor that performed the action.
    pub admin_id: UserId,
    /// User the action applied to, if any.
    pub target_user_id: Option<UserId>,
    /// Action discriminator.
    pub action: String,
    /// Structured details.
    pub details: serde_json::Value,
}

/// Per-user interest flag, consumed by the accrual job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InterestSetting {
    /// Owner.
    pub user_id: UserId,
    /// Whether interest accrues.
    pub enabled: bool,
    /// First time the flag was set.
    pub created_at: DateTime<Utc>,
    /// Last time the flag was set.
    pub updated_at: DateTime<Utc>,
}

/// Global auto-grading switch, read once per scheduler trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct AutoGradingConfig {
    /// When `false`, triggers are no-ops.
    pub enabled: bool,
}

/// Outcome recorded for one scheduler action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GradingRunStatus {
    /// The contest was graded.
    Completed,
    /// Grading, or the cycle itself, failed.
    Failed,
}

impl GradingRunStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Row of the auto-grading audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GradingLogEntry {
    /// Contest concerned; `None` when the cycle failed before picking one.
    pub contest_id: Option<ContestId>,
    /// Outcome.
    pub status: GradingRunStatus,
    /// Human-readable summary or error message.
    pub message: String,
    /// Time of the record.
    pub created_at: DateTime<Utc>,
}

impl GradingLogEntry {
    /// Builds a log row stamped now.
    #[must_use]
    pub fn new(
        contest_id: Option<ContestId>,
        status: GradingRunStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            contest_id,
            status,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
