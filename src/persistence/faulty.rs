//! Store wrapper that injects failures into selected calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{AccountStore, AuditStore, ContestStore, LedgerStore, MemoryStore};
use crate::domain::{
    AdminLogEntry, AutoGradingConfig, Contest, ContestId, GradingLogEntry, InterestSetting,
    KycLevel, LedgerEntry, LedgerReceipt, NewAdminLogEntry, NewLedgerEntry, Prediction,
    PredictionId, PredictionStatus, TransactionType, UserId, Wallet,
};
use crate::error::LedgerError;

/// Delegates to a [`MemoryStore`] except where a fault is configured.
#[derive(Debug, Default)]
pub(crate) struct FaultyStore {
    pub inner: MemoryStore,
    /// Ledger mutations for this user fail.
    pub fail_user: Option<UserId>,
    /// Ledger mutations of this type fail.
    pub fail_transaction_type: Option<TransactionType>,
    /// Admin log writes fail.
    pub fail_admin_log: bool,
    /// Listing predictions of this contest fails.
    pub fail_contest: Option<ContestId>,
    /// Listing due contests fails.
    pub fail_due_listing: bool,
}

fn injected() -> LedgerError {
    LedgerError::PersistenceError("injected failure".to_string())
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn apply_transaction(
        &self,
        entry: &NewLedgerEntry,
    ) -> Result<LedgerReceipt, LedgerError> {
        if self.fail_user == Some(entry.user_id)
            || self.fail_transaction_type == Some(entry.transaction_type)
        {
            return Err(injected());
        }
        self.inner.apply_transaction(entry).await
    }

    async fn entry_by_reference(
        &self,
        user_id: UserId,
        reference_id: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        self.inner
            .entry_by_reference(user_id, reference_id, transaction_type)
            .await
    }

    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        self.inner.wallet(user_id).await
    }

    async fn count_entries(
        &self,
        user_id: UserId,
        transaction_type: Option<TransactionType>,
    ) -> Result<u64, LedgerError> {
        self.inner.count_entries(user_id, transaction_type).await
    }

    async fn sum_since(
        &self,
        user_id: UserId,
        transaction_type: TransactionType,
        since: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        self.inner.sum_since(user_id, transaction_type, since).await
    }

    async fn entries(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.inner.entries(user_id, limit, offset).await
    }
}

#[async_trait]
impl AccountStore for FaultyStore {
    async fn kyc_level(&self, user_id: UserId) -> Result<KycLevel, LedgerError> {
        self.inner.kyc_level(user_id).await
    }

    async fn upsert_interest_setting(
        &self,
        user_id: UserId,
        enabled: bool,
    ) -> Result<InterestSetting, LedgerError> {
        self.inner.upsert_interest_setting(user_id, enabled).await
    }

    async fn interest_setting(
        &self,
        user_id: UserId,
    ) -> Result<Option<InterestSetting>, LedgerError> {
        self.inner.interest_setting(user_id).await
    }
}

#[async_trait]
impl ContestStore for FaultyStore {
    async fn contest(&self, contest_id: ContestId) -> Result<Option<Contest>, LedgerError> {
        self.inner.contest(contest_id).await
    }

    async fn due_contests(&self, now: DateTime<Utc>) -> Result<Vec<Contest>, LedgerError> {
        if self.fail_due_listing {
            return Err(injected());
        }
        self.inner.due_contests(now).await
    }

    async fn pending_predictions(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<Prediction>, LedgerError> {
        if self.fail_contest == Some(contest_id) {
            return Err(injected());
        }
        self.inner.pending_predictions(contest_id).await
    }

    async fn record_prediction_outcome(
        &self,
        prediction_id: PredictionId,
        status: PredictionStatus,
        actual_payout: Decimal,
    ) -> Result<(), LedgerError> {
        self.inner
            .record_prediction_outcome(prediction_id, status, actual_payout)
            .await
    }

    async fn mark_contest_graded(
        &self,
        contest_id: ContestId,
        result: &str,
    ) -> Result<(), LedgerError> {
        self.inner.mark_contest_graded(contest_id, result).await
    }
}

#[async_trait]
impl AuditStore for FaultyStore {
    async fn append_admin_log(
        &self,
        entry: NewAdminLogEntry,
    ) -> Result<AdminLogEntry, LedgerError> {
        if self.fail_admin_log {
            return Err(injected());
        }
        self.inner.append_admin_log(entry).await
    }

    async fn admin_logs(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<AdminLogEntry>, u64), LedgerError> {
        self.inner.admin_logs(limit, offset).await
    }

    async fn append_grading_log(&self, entry: &GradingLogEntry) -> Result<(), LedgerError> {
        self.inner.append_grading_log(entry).await
    }

    async fn grading_logs(&self, limit: u32) -> Result<Vec<GradingLogEntry>, LedgerError> {
        self.inner.grading_logs(limit).await
    }

    async fn auto_grading_config(&self) -> Result<AutoGradingConfig, LedgerError> {
        self.inner.auto_grading_config().await
    }

    async fn set_auto_grading_config(
        &self,
        config: AutoGradingConfig,
    ) -> Result<(), LedgerError> {
        self.inner.set_auto_grading_config(config).await
    }
}
