//! Ledger error types with HTTP status code mapping.
//!
//! [`LedgerError`] is the central error type of the service. Each variant
//! maps to a numeric code and an HTTP status, and renders as the structured
//! `{success: false, ...}` body every endpoint returns on failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ContestId, UserId};

/// Structured JSON error response body.
///
/// ```json
/// { "success": false, "error": "insufficient funds: balance 20, requested 50", "code": 4001 }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable reason.
    pub error: String,
    /// Numeric error code.
    pub code: u32,
}

/// Service error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                    |
/// |-----------|-----------------|--------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request                |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict   |
/// | 3000–3999 | Server          | 500 Internal Server Error      |
/// | 4000–4999 | Funds / Policy  | 422 Unprocessable / 403        |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Missing or malformed input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Deposit method outside the supported set.
    #[error("unsupported payment method: {0}")]
    UnsupportedMethod(String),

    /// Withdrawal below the configured floor.
    #[error("minimum withdrawal is {minimum}, requested {requested}")]
    BelowMinimum {
        /// Configured floor.
        minimum: Decimal,
        /// Requested amount.
        requested: Decimal,
    },

    /// No wallet exists for the user.
    #[error("wallet not found for user {0}")]
    WalletNotFound(UserId),

    /// No contest with the given id.
    #[error("contest not found: {0}")]
    ContestNotFound(ContestId),

    /// The contest has already been graded.
    #[error("contest {0} is already graded")]
    ContestAlreadyGraded(ContestId),

    /// The reference id was already committed for a different user.
    #[error("reference id already used by another wallet: {0}")]
    DuplicateReference(String),

    /// Another grading cycle is running in this process.
    #[error("an auto-grading cycle is already running")]
    GradingInProgress,

    /// A debit would drive the balance below zero.
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance at the time of the check.
        balance: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// The user's KYC tier does not allow withdrawals.
    #[error("identity verification is required before withdrawing")]
    KycRequired,

    /// The withdrawal would exceed the tier's daily cap.
    #[error("daily withdrawal limit of {cap} exceeded ({withdrawn_today} already withdrawn today, requested {requested})")]
    DailyLimitExceeded {
        /// Tier cap.
        cap: Decimal,
        /// Amount already withdrawn today.
        withdrawn_today: Decimal,
        /// Amount requested.
        requested: Decimal,
    },

    /// The store failed to read or commit.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::UnsupportedMethod(_) => 1002,
            Self::BelowMinimum { .. } => 1003,
            Self::WalletNotFound(_) => 2001,
            Self::ContestNotFound(_) => 2002,
            Self::ContestAlreadyGraded(_) => 2003,
            Self::DuplicateReference(_) => 2004,
            Self::GradingInProgress => 2005,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::InsufficientFunds { .. } => 4001,
            Self::KycRequired => 4002,
            Self::DailyLimitExceeded { .. } => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnsupportedMethod(_) | Self::BelowMinimum { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::WalletNotFound(_) | Self::ContestNotFound(_) => StatusCode::NOT_FOUND,
            Self::ContestAlreadyGraded(_)
            | Self::DuplicateReference(_)
            | Self::GradingInProgress => StatusCode::CONFLICT,
            Self::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::KycRequired | Self::DailyLimitExceeded { .. } => StatusCode::FORBIDDEN,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.error_code(),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_denials_are_forbidden() {
        assert_eq!(LedgerError::KycRequired.status_code(), StatusCode::FORBIDDEN);
        let err = LedgerError::DailyLimitExceeded {
            cap: Decimal::ONE_HUNDRED,
            withdrawn_today: Decimal::ZERO,
            requested: Decimal::from(150),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), 4003);
    }

    #[test]
    fn insufficient_funds_is_unprocessable() {
        let err = LedgerError::InsufficientFunds {
            balance: Decimal::from(20),
            requested: Decimal::from(50),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "insufficient funds: balance 20, requested 50");
    }

    #[test]
    fn response_carries_success_false() {
        let response = LedgerError::UnsupportedMethod("paypal".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
