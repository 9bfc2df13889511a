//! OpenAPI document served by Swagger UI.

use utoipa::OpenApi;

use super::dto::{
    AdjustBalanceRequest, AdjustBalanceResponse, AdminLogListResponse, AutoGradingResponse,
    AutoGradingToggleRequest, AutoGradingToggleResponse, DepositRequest, DepositResponse,
    GradeContestRequest, GradeContestResponse, GradingLogListResponse, InterestRequest,
    MessageResponse, PaginationMeta, TransactionListResponse, WalletResponse, WithdrawRequest,
    WithdrawResponse,
};
use super::handlers::{admin, grading, system, wallet};
use crate::domain::{
    AdminLogEntry, GradingLogEntry, GradingRunStatus, LedgerEntry, PaymentMethod, TransactionType,
    Wallet,
};
use crate::error::ErrorResponse;
use crate::service::{ContestFailure, CycleReport, GradingSummary};

/// Aggregated OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "wager-ledger",
        description = "Wallet ledger and contest settlement API"
    ),
    paths(
        system::health_handler,
        wallet::deposit,
        wallet::withdraw,
        wallet::set_interest,
        wallet::get_wallet,
        wallet::list_transactions,
        grading::grade_contest,
        grading::trigger_auto_grading,
        grading::list_grading_logs,
        admin::adjust_balance,
        admin::list_logs,
        admin::set_auto_grading,
    ),
    components(schemas(
        ErrorResponse,
        MessageResponse,
        PaginationMeta,
        DepositRequest,
        DepositResponse,
        WithdrawRequest,
        WithdrawResponse,
        InterestRequest,
        WalletResponse,
        TransactionListResponse,
        GradeContestRequest,
        GradeContestResponse,
        AutoGradingResponse,
        GradingLogListResponse,
        AdjustBalanceRequest,
        AdjustBalanceResponse,
        AutoGradingToggleRequest,
        AutoGradingToggleResponse,
        AdminLogListResponse,
        Wallet,
        LedgerEntry,
        TransactionType,
        PaymentMethod,
        AdminLogEntry,
        GradingLogEntry,
        GradingRunStatus,
        CycleReport,
        ContestFailure,
        GradingSummary,
    )),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Wallet", description = "Deposits, withdrawals and balances"),
        (name = "Grading", description = "Contest settlement"),
        (name = "Admin", description = "Audited operator actions"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_money_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/wallet/deposit",
            "/api/v1/wallet/withdraw",
            "/api/v1/grading",
            "/api/v1/admin/wallets/adjust",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
