//! Persistence layer: the balance store and the tables around it.
//!
//! The store is split by concern into [`LedgerStore`], [`AccountStore`],
//! [`ContestStore`] and [`AuditStore`]; services hold an `Arc<dyn Store>`.
//! [`postgres::PostgresStore`] is the production implementation and relies
//! on the `update_wallet_balance` function for per-user serialization;
//! [`memory::MemoryStore`] keeps everything in process for development
//! and tests.

#[cfg(test)]
pub(crate) mod faulty;
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    AdminLogEntry, AutoGradingConfig, Contest, ContestId, GradingLogEntry, InterestSetting,
    KycLevel, LedgerEntry, LedgerReceipt, NewAdminLogEntry, NewLedgerEntry, Prediction,
    PredictionId, PredictionStatus, TransactionType, UserId, Wallet,
};
use crate::error::LedgerError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Wallets and the append-only transaction log.
#[async_trait]
pub trait LedgerStore: fmt::Debug + Send + Sync {
    /// Atomically applies one signed entry to a wallet.
    ///
    /// Reading the balance, checking it, appending the entry and writing the
    /// new balance (and deposit/withdrawal counters) happen as one unit
    /// serialized per user. A `(reference_id, transaction_type)` pair that
    /// was already committed for the same user returns the original receipt
    /// with `replayed = true` and changes nothing. When `daily_cap` is set,
    /// the user's total of the same type since midnight UTC plus this entry
    /// must not exceed it; the check runs inside the same unit.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientFunds`] if the balance would go negative.
    /// - [`LedgerError::DailyLimitExceeded`] if the entry would break its cap.
    /// - [`LedgerError::DuplicateReference`] if the key belongs to another user.
    /// - [`LedgerError::PersistenceError`] if the unit cannot be committed.
    async fn apply_transaction(&self, entry: &NewLedgerEntry)
    -> Result<LedgerReceipt, LedgerError>;

    /// Returns the user's committed entry for `(reference_id, transaction_type)`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn entry_by_reference(
        &self,
        user_id: UserId,
        reference_id: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Returns the user's wallet, if one has been created.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError>;

    /// Counts the user's entries, optionally restricted to one type.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn count_entries(
        &self,
        user_id: UserId,
        transaction_type: Option<TransactionType>,
    ) -> Result<u64, LedgerError>;

    /// Sums the absolute amounts of the user's entries of one type committed
    /// at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn sum_since(
        &self,
        user_id: UserId,
        transaction_type: TransactionType,
        since: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError>;

    /// Returns a page of the user's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn entries(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;
}

/// Per-user records that are not balances.
#[async_trait]
pub trait AccountStore: fmt::Debug + Send + Sync {
    /// Returns the user's KYC level; users without a record are `none`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn kyc_level(&self, user_id: UserId) -> Result<KycLevel, LedgerError>;

    /// Inserts or updates the user's interest flag.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn upsert_interest_setting(
        &self,
        user_id: UserId,
        enabled: bool,
    ) -> Result<InterestSetting, LedgerError>;

    /// Returns the user's interest flag, if ever set.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn interest_setting(
        &self,
        user_id: UserId,
    ) -> Result<Option<InterestSetting>, LedgerError>;
}

/// Contests and predictions.
#[async_trait]
pub trait ContestStore: fmt::Debug + Send + Sync {
    /// Looks up a contest.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn contest(&self, contest_id: ContestId) -> Result<Option<Contest>, LedgerError>;

    /// Returns open contests with a recorded result whose close time has
    /// passed at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn due_contests(&self, now: DateTime<Utc>) -> Result<Vec<Contest>, LedgerError>;

    /// Returns the contest's predictions still in `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn pending_predictions(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<Prediction>, LedgerError>;

    /// Moves a pending prediction to a terminal status. Predictions already
    /// out of `pending` are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn record_prediction_outcome(
        &self,
        prediction_id: PredictionId,
        status: PredictionStatus,
        actual_payout: Decimal,
    ) -> Result<(), LedgerError>;

    /// Transitions an open contest to `graded` with its result.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ContestAlreadyGraded`] if the contest was not
    /// open, or [`LedgerError::PersistenceError`] on store failure.
    async fn mark_contest_graded(
        &self,
        contest_id: ContestId,
        result: &str,
    ) -> Result<(), LedgerError>;
}

/// Audit sinks and global switches.
#[async_trait]
pub trait AuditStore: fmt::Debug + Send + Sync {
    /// Appends an admin/settings audit record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn append_admin_log(&self, entry: NewAdminLogEntry)
    -> Result<AdminLogEntry, LedgerError>;

    /// Returns a page of admin audit records, newest first, and the total.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn admin_logs(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<AdminLogEntry>, u64), LedgerError>;

    /// Appends an auto-grading audit record.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn append_grading_log(&self, entry: &GradingLogEntry) -> Result<(), LedgerError>;

    /// Returns the most recent auto-grading records, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn grading_logs(&self, limit: u32) -> Result<Vec<GradingLogEntry>, LedgerError>;

    /// Reads the global auto-grading switch.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn auto_grading_config(&self) -> Result<AutoGradingConfig, LedgerError>;

    /// Writes the global auto-grading switch.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    async fn set_auto_grading_config(&self, config: AutoGradingConfig)
    -> Result<(), LedgerError>;
}

/// Everything the services need from the backing store.
pub trait Store: LedgerStore + AccountStore + ContestStore + AuditStore {}

impl<T> Store for T where T: LedgerStore + AccountStore + ContestStore + AuditStore {}
