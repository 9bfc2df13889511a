//! Wallets, ledger entries, and the request/receipt pair of the ledger
//! mutation primitive.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{EntryId, UserId};
use crate::error::LedgerError;

/// Reason code of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Principal credited by a payment provider.
    Deposit,
    /// Funds reserved for payout to an external rail.
    Withdrawal,
    /// Promotional credit (welcome bonus).
    Bonus,
    /// Winning payout from contest grading.
    BetWin,
    /// Manual credit by an administrator.
    AdminCredit,
    /// Manual debit by an administrator.
    AdminDebit,
    /// Accrued interest.
    Interest,
}

impl TransactionType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Deposit,
        Self::Withdrawal,
        Self::Bonus,
        Self::BetWin,
        Self::AdminCredit,
        Self::AdminDebit,
        Self::Interest,
    ];

    /// Wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Bonus => "bonus",
            Self::BetWin => "bet_win",
            Self::AdminCredit => "admin_credit",
            Self::AdminDebit => "admin_debit",
            Self::Interest => "interest",
        }
    }

    /// Returns `true` if entries of this type must carry a negative amount.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(self, Self::Withdrawal | Self::AdminDebit)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LedgerError::Validation(format!("unknown transaction type: {s}")))
    }
}

/// Per-user balance row. Only the ledger primitive writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Wallet {
    /// Owner.
    pub user_id: UserId,
    /// Spendable bet points; always the sum of the user's ledger entries.
    pub balance: Decimal,
    /// Cumulative principal deposited (bonuses excluded).
    pub total_deposited: Decimal,
    /// Cumulative amount withdrawn.
    pub total_withdrawn: Decimal,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// An empty wallet, as created implicitly by the first ledger entry.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Decimal::ZERO,
            total_deposited: Decimal::ZERO,
            total_withdrawn: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }
}

/// Immutable transaction-log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntry {
    /// Row identity.
    pub id: EntryId,
    /// Owner of the balance that changed.
    pub user_id: UserId,
    /// Signed change; positive credits, negative debits.
    pub amount: Decimal,
    /// Reason code.
    pub transaction_type: TransactionType,
    /// Human-readable description.
    pub description: String,
    /// Caller-supplied idempotency key.
    pub reference_id: String,
    /// Balance immediately after this entry was applied.
    pub balance_after: Decimal,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

/// Input of the ledger mutation primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Wallet owner.
    pub user_id: UserId,
    /// Signed, non-zero amount.
    pub amount: Decimal,
    /// Reason code; its direction must agree with the sign of `amount`.
    pub transaction_type: TransactionType,
    /// Human-readable description.
    pub description: String,
    /// Idempotency key, unique per logical operation and transaction type.
    pub reference_id: String,
    /// Ceiling on the user's total of this type since midnight UTC,
    /// enforced by the store under the wallet lock.
    pub daily_cap: Option<Decimal>,
}

impl NewLedgerEntry {
    /// Builds a request for the ledger primitive.
    #[must_use]
    pub fn new(
        user_id: UserId,
        amount: Decimal,
        transaction_type: TransactionType,
        description: impl Into<String>,
        reference_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            amount,
            transaction_type,
            description: description.into(),
            reference_id: reference_id.into(),
            daily_cap: None,
        }
    }

    /// Sets the daily ceiling checked atomically with the mutation.
    #[must_use]
    pub fn with_daily_cap(mut self, cap: Option<Decimal>) -> Self {
        self.daily_cap = cap;
        self
    }

    /// Checks the request before it reaches the store.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for a zero amount, an empty
    /// reference id, or an amount whose sign contradicts the transaction
    /// type.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount.is_zero() {
            return Err(LedgerError::Validation("amount must be non-zero".to_string()));
        }
        if self.reference_id.trim().is_empty() {
            return Err(LedgerError::Validation("reference_id is required".to_string()));
        }
        if self.transaction_type.is_debit() != self.amount.is_sign_negative() {
            return Err(LedgerError::Validation(format!(
                "amount {} has the wrong sign for a {} entry",
                self.amount, self.transaction_type
            )));
        }
        Ok(())
    }
}

/// Outcome of the ledger primitive.
///
/// A replay reproduces the original receipt from the committed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LedgerReceipt {
    /// The committed entry (the original one when `replayed`).
    pub entry_id: EntryId,
    /// Balance right after the entry was applied.
    pub new_balance: Decimal,
    /// `true` when the reference id had already been committed and nothing
    /// was applied by this call.
    pub replayed: bool,
}

impl LedgerReceipt {
    /// Receipt of an already committed entry.
    #[must_use]
    pub fn replay_of(entry: &LedgerEntry) -> Self {
        Self {
            entry_id: entry.id,
            new_balance: entry.balance_after,
            replayed: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn entry(amount: Decimal, kind: TransactionType) -> NewLedgerEntry {
        NewLedgerEntry::new(UserId::new(), amount, kind, "test", "ref-1")
    }

    #[test]
    fn storage_names_round_trip() {
        for kind in TransactionType::ALL {
            let Ok(parsed) = kind.as_str().parse::<TransactionType>() else {
                panic!("{kind} did not parse");
            };
            assert_eq!(parsed, kind);
        }
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let Ok(json) = serde_json::to_string(&TransactionType::BetWin) else {
            panic!("serialization failed");
        };
        assert_eq!(json, "\"bet_win\"");
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert!(entry(Decimal::ZERO, TransactionType::Deposit).validate().is_err());
    }

    #[test]
    fn empty_reference_is_rejected() {
        let mut e = entry(Decimal::from(10), TransactionType::Deposit);
        e.reference_id = "  ".to_string();
        assert!(e.validate().is_err());
    }

    #[test]
    fn sign_must_match_type() {
        assert!(entry(Decimal::from(10), TransactionType::Deposit).validate().is_ok());
        assert!(entry(Decimal::from(-10), TransactionType::Deposit).validate().is_err());
        assert!(entry(Decimal::from(-10), TransactionType::Withdrawal).validate().is_ok());
        assert!(entry(Decimal::from(10), TransactionType::AdminDebit).validate().is_err());
        assert!(entry(Decimal::new(5, 1), TransactionType::Interest).validate().is_ok());
    }
}
