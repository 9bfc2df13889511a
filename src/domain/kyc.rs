//! KYC withdrawal limit policy.
//!
//! Pure mapping from a user's verification tier to withdrawal permission
//! and daily cap. The running daily total is supplied by the caller.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Verified-identity tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum KycLevel {
    /// No verification on file.
    #[default]
    None,
    /// Basic verification.
    Basic,
    /// Full verification.
    Full,
}

impl KycLevel {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Full => "full",
        }
    }

    /// Withdrawal limits granted by this tier.
    #[must_use]
    pub fn limits(self) -> WithdrawalLimits {
        match self {
            Self::None => WithdrawalLimits {
                can_withdraw: false,
                daily_cap: Some(Decimal::ZERO),
            },
            Self::Basic => WithdrawalLimits {
                can_withdraw: true,
                daily_cap: Some(Decimal::ONE_HUNDRED),
            },
            Self::Full => WithdrawalLimits {
                can_withdraw: true,
                daily_cap: None,
            },
        }
    }
}

impl fmt::Display for KycLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycLevel {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "full" => Ok(Self::Full),
            other => Err(LedgerError::Validation(format!("unknown kyc level: {other}"))),
        }
    }
}

/// Withdrawal permission and daily cap of a KYC tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalLimits {
    /// Whether the tier may withdraw at all.
    pub can_withdraw: bool,
    /// Maximum total withdrawn per UTC day; `None` means unlimited.
    pub daily_cap: Option<Decimal>,
}

/// Why a withdrawal was refused by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalDenial {
    /// The tier does not allow withdrawals.
    KycRequired,
    /// The request would push today's total above the cap.
    DailyLimitExceeded {
        /// The tier's daily cap.
        cap: Decimal,
    },
}

/// Result of evaluating the policy for one withdrawal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalDecision {
    /// The withdrawal may proceed.
    Allowed,
    /// The withdrawal must be refused.
    Denied(WithdrawalDenial),
}

impl WithdrawalDecision {
    /// Returns `true` for [`WithdrawalDecision::Allowed`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Evaluates a withdrawal of `amount` for a user at `level` who has already
/// withdrawn `withdrawn_today` during the current day.
#[must_use]
pub fn can_user_withdraw(
    level: KycLevel,
    amount: Decimal,
    withdrawn_today: Decimal,
) -> WithdrawalDecision {
    let limits = level.limits();
    if !limits.can_withdraw {
        return WithdrawalDecision::Denied(WithdrawalDenial::KycRequired);
    }
    match limits.daily_cap {
        Some(cap) if withdrawn_today + amount > cap => {
            WithdrawalDecision::Denied(WithdrawalDenial::DailyLimitExceeded { cap })
        }
        _ => WithdrawalDecision::Allowed,
    }
}

/// Start of the daily cap window: midnight UTC of the day containing `now`.
#[must_use]
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map_or(now, |midnight| midnight.and_utc())
}
