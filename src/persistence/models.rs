//! Database row types and their conversion into domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    AdminLogEntry, Contest, ContestId, EntryId, GradingLogEntry, GradingRunStatus,
    InterestSetting, LedgerEntry, LedgerReceipt, Prediction, PredictionId, UserId, Wallet,
};
use crate::error::LedgerError;

/// Row returned by `update_wallet_balance`.
#[derive(Debug, Clone, FromRow)]
pub struct ApplyRow {
    /// Committed (or previously committed) entry.
    pub entry_id: Uuid,
    /// Balance after the entry.
    pub balance_after: Decimal,
    /// Whether the call was a replay.
    pub replayed: bool,
}

impl From<ApplyRow> for LedgerReceipt {
    fn from(row: ApplyRow) -> Self {
        Self {
            entry_id: EntryId::from_uuid(row.entry_id),
            new_balance: row.balance_after,
            replayed: row.replayed,
        }
    }
}

/// A row from the `wallets` table.
#[derive(Debug, Clone, FromRow)]
pub struct WalletRow {
    /// Owner.
    pub user_id: Uuid,
    /// Balance column.
    pub bet_points: Decimal,
    /// Cumulative deposits.
    pub total_deposited: Decimal,
    /// Cumulative withdrawals.
    pub total_withdrawn: Decimal,
    /// Last mutation.
    pub updated_at: DateTime<Utc>,
}

impl From<WalletRow> for Wallet {
    fn from(row: WalletRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            balance: row.bet_points,
            total_deposited: row.total_deposited,
            total_withdrawn: row.total_withdrawn,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `wallet_transactions` table.
#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntryRow {
    /// Row identity.
    pub id: Uuid,
    /// Owner.
    pub user_id: Uuid,
    /// Signed amount.
    pub amount: Decimal,
    /// Transaction type discriminator.
    pub transaction_type: String,
    /// Description.
    pub description: String,
    /// Idempotency key.
    pub reference_id: String,
    /// Balance after the entry.
    pub balance_after: Decimal,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EntryId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            amount: row.amount,
            transaction_type: row.transaction_type.parse()?,
            description: row.description,
            reference_id: row.reference_id,
            balance_after: row.balance_after,
            created_at: row.created_at,
        })
    }
}

/// A row from the `interest_settings` table.
#[derive(Debug, Clone, FromRow)]
pub struct InterestSettingRow {
    /// Owner.
    pub user_id: Uuid,
    /// Flag.
    pub enabled: bool,
    /// Insert time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl From<InterestSettingRow> for InterestSetting {
    fn from(row: InterestSettingRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `contests` table.
#[derive(Debug, Clone, FromRow)]
pub struct ContestRow {
    /// Identity.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Status discriminator.
    pub status: String,
    /// Recorded result.
    pub result: Option<String>,
    /// Close time.
    pub closes_at: Option<DateTime<Utc>>,
    /// Grading time.
    pub graded_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContestRow> for Contest {
    type Error = LedgerError;

    fn try_from(row: ContestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContestId::from_uuid(row.id),
            title: row.title,
            status: row.status.parse()?,
            result: row.result,
            closes_at: row.closes_at,
            graded_at: row.graded_at,
        })
    }
}

/// A row from the `predictions` table.
#[derive(Debug, Clone, FromRow)]
pub struct PredictionRow {
    /// Identity.
    pub id: Uuid,
    /// Contest.
    pub contest_id: Uuid,
    /// Staking user.
    pub user_id: Uuid,
    /// JSONB payload.
    pub prediction_data: serde_json::Value,
    /// Stake.
    pub bet_amount: Decimal,
    /// Quoted payout.
    pub potential_payout: Option<Decimal>,
    /// Status discriminator.
    pub status: String,
    /// Paid amount.
    pub actual_payout: Option<Decimal>,
}

impl TryFrom<PredictionRow> for Prediction {
    type Error = LedgerError;

    fn try_from(row: PredictionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PredictionId::from_uuid(row.id),
            contest_id: ContestId::from_uuid(row.contest_id),
            user_id: UserId::from_uuid(row.user_id),
            prediction_data: row.prediction_data,
            bet_amount: row.bet_amount,
            potential_payout: row.potential_payout,
            status: row.status.parse()?,
            actual_payout: row.actual_payout,
        })
    }
}

/// A row from the `admin_logs` table.
#[derive(Debug, Clone, FromRow)]
pub struct AdminLogRow {
    /// Auto-increment id.
    pub id: i64,
    /// Actor.
    pub admin_id: Uuid,
    /// Target user.
    pub target_user_id: Option<Uuid>,
    /// Action discriminator.
    pub action: String,
    /// JSONB details.
    pub details: serde_json::Value,
    /// Insert time.
    pub created_at: DateTime<Utc>,
}

impl From<AdminLogRow> for AdminLogEntry {
    fn from(row: AdminLogRow) -> Self {
        Self {
            id: row.id,
            admin_id: UserId::from_uuid(row.admin_id),
            target_user_id: row.target_user_id.map(UserId::from_uuid),
            action: row.action,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

/// A row from the `auto_grading_logs` table.
#[derive(Debug, Clone, FromRow)]
pub struct GradingLogRow {
    /// Contest concerned.
    pub contest_id: Option<Uuid>,
    /// Status discriminator.
    pub status: String,
    /// Message.
    pub message: String,
    /// Insert time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GradingLogRow> for GradingLogEntry {
    type Error = LedgerError;

    fn try_from(row: GradingLogRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "completed" => GradingRunStatus::Completed,
            "failed" => GradingRunStatus::Failed,
            other => {
                return Err(LedgerError::Validation(format!(
                    "unknown grading status: {other}"
                )));
            }
        };
        Ok(Self {
            contest_id: row.contest_id.map(ContestId::from_uuid),
            status,
            message: row.message,
            created_at: row.created_at,
        })
    }
}
