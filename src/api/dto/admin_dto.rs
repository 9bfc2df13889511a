//! Admin DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{AdminLogEntry, TransactionType, UserId};

/// Request body for `POST /admin/wallets/adjust`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustBalanceRequest {
    /// Operator performing the adjustment.
    pub admin_id: UserId,
    /// Wallet owner.
    pub user_id: UserId,
    /// Signed amount; positive credits, negative debits.
    #[schema(value_type = String, example = "-25.50")]
    pub amount: Decimal,
    /// Reason recorded on the entry and in the audit log.
    pub description: String,
    /// Stable key for safe retries.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Response body for `POST /admin/wallets/adjust`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdjustBalanceResponse {
    /// Always `true`.
    pub success: bool,
    /// Ledger reference.
    pub reference_id: String,
    /// `admin_credit` or `admin_debit`.
    pub transaction_type: TransactionType,
    /// Balance after the adjustment.
    #[schema(value_type = String)]
    pub new_balance: Decimal,
    /// Operator-facing message.
    pub message: String,
}

/// Request body for `PUT /admin/auto-grading`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AutoGradingToggleRequest {
    /// Operator flipping the switch.
    pub admin_id: UserId,
    /// New switch value.
    pub enabled: bool,
}

/// Response body for `PUT /admin/auto-grading`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AutoGradingToggleResponse {
    /// Always `true`.
    pub success: bool,
    /// Switch value now in effect.
    pub enabled: bool,
    /// Operator-facing message.
    pub message: String,
}

/// Response body for `GET /admin/logs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLogListResponse {
    /// Always `true`.
    pub success: bool,
    /// Records, newest first.
    pub logs: Vec<AdminLogEntry>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
