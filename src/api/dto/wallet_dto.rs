//! Wallet DTOs: deposit, withdrawal, interest, balance and history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{LedgerEntry, PaymentMethod, UserId, Wallet};

/// Request body for `POST /wallet/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Depositing user.
    pub user_id: UserId,
    /// Principal; a JSON string or number.
    #[schema(value_type = String, example = "500")]
    pub amount: Decimal,
    /// `bkash`, `nagad` or `usdt`.
    pub method: String,
    /// Client language tag.
    #[serde(default = "default_language")]
    pub language: String,
    /// Stable key for safe retries.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Response body for `POST /wallet/deposit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositResponse {
    /// Always `true`.
    pub success: bool,
    /// Provider-scoped payment id.
    pub payment_id: String,
    /// Principal credited.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Method used.
    pub method: PaymentMethod,
    /// Welcome bonus, if credited.
    #[schema(value_type = Option<String>)]
    pub bonus: Option<Decimal>,
    /// Balance after the deposit.
    #[schema(value_type = String)]
    pub new_balance: Decimal,
    /// User-facing message.
    pub message: String,
}

/// Request body for `POST /wallet/withdraw`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Withdrawing user.
    pub user_id: UserId,
    /// Amount requested.
    #[schema(value_type = String, example = "150")]
    pub amount: Decimal,
    /// Stable key for safe retries.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Response body for `POST /wallet/withdraw`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawResponse {
    /// Always `true`.
    pub success: bool,
    /// Amount debited.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Ledger reference.
    pub reference_id: String,
    /// Balance after the debit.
    #[schema(value_type = String)]
    pub new_balance: Decimal,
    /// User-facing message.
    pub message: String,
}

/// Request body for `POST /wallet/interest`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InterestRequest {
    /// User whose flag changes.
    pub user_id: UserId,
    /// New flag value.
    pub enabled: bool,
}

/// Response body for `GET /wallets/{user_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResponse {
    /// Always `true`.
    pub success: bool,
    /// Current wallet.
    pub wallet: Wallet,
    /// Whether interest accrues.
    pub interest_enabled: bool,
}

/// Response body for `GET /wallets/{user_id}/transactions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// Always `true`.
    pub success: bool,
    /// Entries, newest first.
    pub transactions: Vec<LedgerEntry>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
