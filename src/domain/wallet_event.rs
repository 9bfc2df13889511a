//! Domain events reflecting committed wallet and grading changes.
//!
//! Every committed ledger entry and every graded prediction emits a
//! [`WalletEvent`] through the [`super::EventBus`]. Events are broadcast to
//! WebSocket subscribers; they are never the source of truth.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{ContestId, EntryId, PredictionId, PredictionStatus, TransactionType, UserId};

/// Event emitted after a state change has been committed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WalletEvent {
    /// A ledger entry was committed (replays do not emit).
    BalanceChanged {
        /// Wallet owner.
        user_id: UserId,
        /// Committed entry.
        entry_id: EntryId,
        /// Reason code.
        transaction_type: TransactionType,
        /// Signed change.
        amount: Decimal,
        /// Balance after the change.
        new_balance: Decimal,
        /// Idempotency key of the entry.
        reference_id: String,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A prediction reached a terminal status.
    PredictionGraded {
        /// Staking user.
        user_id: UserId,
        /// Contest graded.
        contest_id: ContestId,
        /// Graded prediction.
        prediction_id: PredictionId,
        /// `won` or `lost`.
        status: PredictionStatus,
        /// Amount paid (zero when lost).
        payout: Decimal,
        /// Grading timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A contest finished grading.
    ContestGraded {
        /// Contest graded.
        contest_id: ContestId,
        /// Result applied.
        result: String,
        /// Winners successfully credited.
        winners_count: u64,
        /// Sum of credited payouts.
        total_payout: Decimal,
        /// Grading timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl WalletEvent {
    /// Returns the user this event concerns, if it concerns a single user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::BalanceChanged { user_id, .. } | Self::PredictionGraded { user_id, .. } => {
                Some(*user_id)
            }
            Self::ContestGraded { .. } => None,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::BalanceChanged { .. } => "balance_changed",
            Self::PredictionGraded { .. } => "prediction_graded",
            Self::ContestGraded { .. } => "contest_graded",
        }
    }
}
