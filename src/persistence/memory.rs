//! In-process store with per-user fine-grained locking.
//!
//! Wallets live in a `HashMap` where each user's slot is individually
//! protected by a [`tokio::sync::Mutex`], mirroring the row lock the
//! PostgreSQL function takes. Mutations for one user are serialized while
//! different users proceed concurrently. Only valid within a single process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};

use super::{AccountStore, AuditStore, ContestStore, LedgerStore};
use crate::domain::{
    AdminLogEntry, AutoGradingConfig, Contest, ContestId, ContestStatus, EntryId, GradingLogEntry,
    InterestSetting, KycLevel, LedgerEntry, LedgerReceipt, NewAdminLogEntry, NewLedgerEntry,
    Prediction, PredictionId, PredictionStatus, TransactionType, UserId, Wallet,
    start_of_utc_day,
};
use crate::error::LedgerError;

type WalletSlot = Arc<Mutex<Option<Wallet>>>;

/// Append-only log plus the `(reference_id, transaction_type)` index that
/// enforces idempotency.
#[derive(Debug, Default)]
struct LedgerLog {
    entries: Vec<LedgerEntry>,
    by_reference: HashMap<(String, TransactionType), usize>,
}

/// Store backed by in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    wallets: RwLock<HashMap<UserId, WalletSlot>>,
    ledger: Mutex<LedgerLog>,
    kyc: RwLock<HashMap<UserId, KycLevel>>,
    interest: RwLock<HashMap<UserId, InterestSetting>>,
    contests: RwLock<HashMap<ContestId, Contest>>,
    predictions: RwLock<Vec<Prediction>>,
    admin_logs: RwLock<Vec<AdminLogEntry>>,
    grading_logs: RwLock<Vec<GradingLogEntry>>,
    auto_grading: RwLock<AutoGradingConfig>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user's KYC level.
    pub async fn set_kyc_level(&self, user_id: UserId, level: KycLevel) {
        self.kyc.write().await.insert(user_id, level);
    }

    /// Inserts or replaces a contest.
    pub async fn insert_contest(&self, contest: Contest) {
        self.contests.write().await.insert(contest.id, contest);
    }

    /// Appends a prediction.
    pub async fn insert_prediction(&self, prediction: Prediction) {
        self.predictions.write().await.push(prediction);
    }

    /// Looks up a prediction by id.
    pub async fn prediction(&self, prediction_id: PredictionId) -> Option<Prediction> {
        self.predictions
            .read()
            .await
            .iter()
            .find(|p| p.id == prediction_id)
            .cloned()
    }

    /// Sum of every committed entry for the user.
    pub async fn ledger_sum(&self, user_id: UserId) -> Decimal {
        self.ledger
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.amount)
            .sum()
    }

    async fn wallet_slot(&self, user_id: UserId) -> WalletSlot {
        if let Some(slot) = self.wallets.read().await.get(&user_id) {
            return Arc::clone(slot);
        }
        let mut map = self.wallets.write().await;
        Arc::clone(map.entry(user_id).or_default())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn apply_transaction(
        &self,
        entry: &NewLedgerEntry,
    ) -> Result<LedgerReceipt, LedgerError> {
        let slot = self.wallet_slot(entry.user_id).await;
        let mut wallet_guard = slot.lock().await;
        let mut ledger = self.ledger.lock().await;

        let key = (entry.reference_id.clone(), entry.transaction_type);
        if let Some(existing) = ledger
            .by_reference
            .get(&key)
            .and_then(|&idx| ledger.entries.get(idx))
        {
            if existing.user_id != entry.user_id {
                return Err(LedgerError::DuplicateReference(entry.reference_id.clone()));
            }
            return Ok(LedgerReceipt::replay_of(existing));
        }

        if let Some(cap) = entry.daily_cap {
            let since = start_of_utc_day(Utc::now());
            let today: Decimal = ledger
                .entries
                .iter()
                .filter(|e| {
                    e.user_id == entry.user_id
                        && e.transaction_type == entry.transaction_type
                        && e.created_at >= since
                })
                .map(|e| e.amount.abs())
                .sum();
            if today + entry.amount.abs() > cap {
                return Err(LedgerError::DailyLimitExceeded {
                    cap,
                    withdrawn_today: today,
                    requested: entry.amount.abs(),
                });
            }
        }

        let mut wallet = wallet_guard
            .clone()
            .unwrap_or_else(|| Wallet::empty(entry.user_id));
        let new_balance = wallet.balance + entry.amount;
        if new_balance < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                balance: wallet.balance,
                requested: entry.amount.abs(),
            });
        }

        let now = Utc::now();
        let committed = LedgerEntry {
            id: EntryId::new(),
            user_id: entry.user_id,
            amount: entry.amount,
            transaction_type: entry.transaction_type,
            description: entry.description.clone(),
            reference_id: entry.reference_id.clone(),
            balance_after: new_balance,
            created_at: now,
        };

        wallet.balance = new_balance;
        match entry.transaction_type {
            TransactionType::Deposit => wallet.total_deposited += entry.amount,
            TransactionType::Withdrawal => wallet.total_withdrawn += entry.amount.abs(),
            _ => {}
        }
        wallet.updated_at = now;

        let receipt = LedgerReceipt {
            entry_id: committed.id,
            new_balance,
            replayed: false,
        };
        let idx = ledger.entries.len();
        ledger.entries.push(committed);
        ledger.by_reference.insert(key, idx);
        *wallet_guard = Some(wallet);

        Ok(receipt)
    }

    async fn entry_by_reference(
        &self,
        user_id: UserId,
        reference_id: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .by_reference
            .get(&(reference_id.to_string(), transaction_type))
            .and_then(|&idx| ledger.entries.get(idx))
            .filter(|e| e.user_id == user_id)
            .cloned())
    }

    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        let slot = self.wallets.read().await.get(&user_id).map(Arc::clone);
        match slot {
            Some(slot) => Ok(slot.lock().await.clone()),
            None => Ok(None),
        }
    }

    async fn count_entries(
        &self,
        user_id: UserId,
        transaction_type: Option<TransactionType>,
    ) -> Result<u64, LedgerError> {
        let ledger = self.ledger.lock().await;
        let count = ledger
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter(|e| transaction_type.is_none_or(|t| e.transaction_type == t))
            .count();
        Ok(count as u64)
    }

    async fn sum_since(
        &self,
        user_id: UserId,
        transaction_type: TransactionType,
        since: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .entries
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && e.transaction_type == transaction_type
                    && e.created_at >= since
            })
            .map(|e| e.amount.abs())
            .sum())
    }

    async fn entries(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn kyc_level(&self, user_id: UserId) -> Result<KycLevel, LedgerError> {
        Ok(self
            .kyc
            .read()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default())
    }

    async fn upsert_interest_setting(
        &self,
        user_id: UserId,
        enabled: bool,
    ) -> Result<InterestSetting, LedgerError> {
        let now = Utc::now();
        let mut map = self.interest.write().await;
        let setting = map.entry(user_id).or_insert_with(|| InterestSetting {
            user_id,
            enabled,
            created_at: now,
            updated_at: now,
        });
        setting.enabled = enabled;
        setting.updated_at = now;
        Ok(setting.clone())
    }

    async fn interest_setting(
        &self,
        user_id: UserId,
    ) -> Result<Option<InterestSetting>, LedgerError> {
        Ok(self.interest.read().await.get(&user_id).cloned())
    }
}

#[async_trait]
impl ContestStore for MemoryStore {
    async fn contest(&self, contest_id: ContestId) -> Result<Option<Contest>, LedgerError> {
        Ok(self.contests.read().await.get(&contest_id).cloned())
    }

    async fn due_contests(&self, now: DateTime<Utc>) -> Result<Vec<Contest>, LedgerError> {
        let mut due: Vec<Contest> = self
            .contests
            .read()
            .await
            .values()
            .filter(|c| c.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|c| c.closes_at);
        Ok(due)
    }

    async fn pending_predictions(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<Prediction>, LedgerError> {
        Ok(self
            .predictions
            .read()
            .await
            .iter()
            .filter(|p| p.contest_id == contest_id && p.status == PredictionStatus::Pending)
            .cloned()
            .collect())
    }

    async fn record_prediction_outcome(
        &self,
        prediction_id: PredictionId,
        status: PredictionStatus,
        actual_payout: Decimal,
    ) -> Result<(), LedgerError> {
        let mut predictions = self.predictions.write().await;
        if let Some(p) = predictions
            .iter_mut()
            .find(|p| p.id == prediction_id && p.status == PredictionStatus::Pending)
        {
            p.status = status;
            p.actual_payout = Some(actual_payout);
        }
        Ok(())
    }

    async fn mark_contest_graded(
        &self,
        contest_id: ContestId,
        result: &str,
    ) -> Result<(), LedgerError> {
        let mut contests = self.contests.write().await;
        let contest = contests
            .get_mut(&contest_id)
            .ok_or(LedgerError::ContestNotFound(contest_id))?;
        if contest.status != ContestStatus::Open {
            return Err(LedgerError::ContestAlreadyGraded(contest_id));
        }
        contest.status = ContestStatus::Graded;
        contest.result = Some(result.to_string());
        contest.graded_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append_admin_log(
        &self,
        entry: NewAdminLogEntry,
    ) -> Result<AdminLogEntry, LedgerError> {
        let mut logs = self.admin_logs.write().await;
        let id = i64::try_from(logs.len()).unwrap_or(i64::MAX).saturating_add(1);
        let row = AdminLogEntry {
            id,
            admin_id: entry.admin_id,
            target_user_id: entry.target_user_id,
            action: entry.action,
            details: entry.details,
            created_at: Utc::now(),
        };
        logs.push(row.clone());
        Ok(row)
    }

    async fn admin_logs(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<AdminLogEntry>, u64), LedgerError> {
        let logs = self.admin_logs.read().await;
        let page = logs
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, logs.len() as u64))
    }

    async fn append_grading_log(&self, entry: &GradingLogEntry) -> Result<(), LedgerError> {
        self.grading_logs.write().await.push(entry.clone());
        Ok(())
    }

    async fn grading_logs(&self, limit: u32) -> Result<Vec<GradingLogEntry>, LedgerError> {
        Ok(self
            .grading_logs
            .read()
            .await
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn auto_grading_config(&self) -> Result<AutoGradingConfig, LedgerError> {
        Ok(*self.auto_grading.read().await)
    }

    async fn set_auto_grading_config(
        &self,
        config: AutoGradingConfig,
    ) -> Result<(), LedgerError> {
        *self.auto_grading.write().await = config;
        Ok(())
    }
}
