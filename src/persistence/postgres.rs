//! PostgreSQL implementation of the balance store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::{PgDatabaseError, PgPoolOptions};
use uuid::Uuid;

use super::models::{
    AdminLogRow, ApplyRow, ContestRow, GradingLogRow, InterestSettingRow, LedgerEntryRow,
    PredictionRow, WalletRow,
};
use super::{AccountStore, AuditStore, ContestStore, LedgerStore};
use crate::config::LedgerConfig;
use crate::domain::{
    AdminLogEntry, AutoGradingConfig, Contest, ContestId, GradingLogEntry, InterestSetting,
    KycLevel, LedgerEntry, LedgerReceipt, NewAdminLogEntry, NewLedgerEntry, Prediction,
    PredictionId, PredictionStatus, TransactionType, UserId, Wallet,
};
use crate::error::LedgerError;

const INSUFFICIENT_FUNDS: &str = "LD001";
const REFERENCE_CONFLICT: &str = "LD002";
const DAILY_LIMIT: &str = "LD003";
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool from configuration and, when enabled,
    /// applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;
            tracing::info!("database migrations applied");
        }

        Ok(Self::new(pool))
    }
}

/// Maps failures raised by `update_wallet_balance` to domain errors.
fn map_apply_error(err: sqlx::Error, entry: &NewLedgerEntry) -> LedgerError {
    let sqlx::Error::Database(db_err) = &err else {
        return LedgerError::from(err);
    };
    let detail = || {
        db_err
            .try_downcast_ref::<PgDatabaseError>()
            .and_then(PgDatabaseError::detail)
            .and_then(|d| d.parse::<Decimal>().ok())
            .unwrap_or_default()
    };
    match db_err.code().as_deref() {
        Some(INSUFFICIENT_FUNDS) => LedgerError::InsufficientFunds {
            balance: detail(),
            requested: entry.amount.abs(),
        },
        Some(DAILY_LIMIT) => LedgerError::DailyLimitExceeded {
            cap: entry.daily_cap.unwrap_or_default(),
            withdrawn_today: detail(),
            requested: entry.amount.abs(),
        },
        Some(REFERENCE_CONFLICT | UNIQUE_VIOLATION) => {
            LedgerError::DuplicateReference(entry.reference_id.clone())
        }
        _ => LedgerError::from(err),
    }
}

fn to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

#[async_trait]
impl LedgerStore for PostgresStore {
    async fn apply_transaction(
        &self,
        entry: &NewLedgerEntry,
    ) -> Result<LedgerReceipt, LedgerError> {
        let row = sqlx::query_as::<_, ApplyRow>(
            "SELECT entry_id, balance_after, replayed \
             FROM update_wallet_balance($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.user_id.as_uuid())
        .bind(entry.amount)
        .bind(entry.transaction_type.as_str())
        .bind(&entry.description)
        .bind(&entry.reference_id)
        .bind(entry.daily_cap)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_apply_error(e, entry))?;

        Ok(row.into())
    }

    async fn entry_by_reference(
        &self,
        user_id: UserId,
        reference_id: &str,
        transaction_type: TransactionType,
    ) -> Result<Option<LedgerEntry>, LedgerError> {
        let row = sqlx::query_as::<_, LedgerEntryRow>(
            "SELECT id, user_id, amount, transaction_type, description, reference_id, \
                    balance_after, created_at \
             FROM wallet_transactions \
             WHERE user_id = $1 AND reference_id = $2 AND transaction_type = $3",
        )
        .bind(user_id.as_uuid())
        .bind(reference_id)
        .bind(transaction_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(LedgerEntry::try_from).transpose()
    }

    async fn wallet(&self, user_id: UserId) -> Result<Option<Wallet>, LedgerError> {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT user_id, bet_points, total_deposited, total_withdrawn, updated_at \
             FROM wallets WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Wallet::from))
    }

    async fn count_entries(
        &self,
        user_id: UserId,
        transaction_type: Option<TransactionType>,
    ) -> Result<u64, LedgerError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM wallet_transactions \
             WHERE user_id = $1 AND ($2::TEXT IS NULL OR transaction_type = $2)",
        )
        .bind(user_id.as_uuid())
        .bind(transaction_type.map(TransactionType::as_str))
        .fetch_one(&self.pool)
        .await?;

        Ok(to_u64(count))
    }

    async fn sum_since(
        &self,
        user_id: UserId,
        transaction_type: TransactionType,
        since: DateTime<Utc>,
    ) -> Result<Decimal, LedgerError> {
        let sum = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(ABS(amount)), 0) FROM wallet_transactions \
             WHERE user_id = $1 AND transaction_type = $2 AND created_at >= $3",
        )
        .bind(user_id.as_uuid())
        .bind(transaction_type.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    async fn entries(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            "SELECT id, user_id, amount, transaction_type, description, reference_id, \
                    balance_after, created_at \
             FROM wallet_transactions WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id.as_uuid())
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn kyc_level(&self, user_id: UserId) -> Result<KycLevel, LedgerError> {
        let level = sqlx::query_scalar::<_, String>(
            "SELECT kyc_level FROM kyc_records WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        level.map_or(Ok(KycLevel::None), |l| l.parse())
    }

    async fn upsert_interest_setting(
        &self,
        user_id: UserId,
        enabled: bool,
    ) -> Result<InterestSetting, LedgerError> {
        let row = sqlx::query_as::<_, InterestSettingRow>(
            "INSERT INTO interest_settings (user_id, enabled) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET enabled = EXCLUDED.enabled, updated_at = NOW() \
             RETURNING user_id, enabled, created_at, updated_at",
        )
        .bind(user_id.as_uuid())
        .bind(enabled)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn interest_setting(
        &self,
        user_id: UserId,
    ) -> Result<Option<InterestSetting>, LedgerError> {
        let row = sqlx::query_as::<_, InterestSettingRow>(
            "SELECT user_id, enabled, created_at, updated_at FROM interest_settings \
             WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InterestSetting::from))
    }
}

#[async_trait]
impl ContestStore for PostgresStore {
    async fn contest(&self, contest_id: ContestId) -> Result<Option<Contest>, LedgerError> {
        let row = sqlx::query_as::<_, ContestRow>(
            "SELECT id, title, status, result, closes_at, graded_at FROM contests WHERE id = $1",
        )
        .bind(contest_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Contest::try_from).transpose()
    }

    async fn due_contests(&self, now: DateTime<Utc>) -> Result<Vec<Contest>, LedgerError> {
        let rows = sqlx::query_as::<_, ContestRow>(
            "SELECT id, title, status, result, closes_at, graded_at FROM contests \
             WHERE status = 'open' AND result IS NOT NULL AND btrim(result) <> '' \
               AND (closes_at IS NULL OR closes_at <= $1) \
             ORDER BY closes_at ASC NULLS FIRST",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Contest::try_from).collect()
    }

    async fn pending_predictions(
        &self,
        contest_id: ContestId,
    ) -> Result<Vec<Prediction>, LedgerError> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            "SELECT id, contest_id, user_id, prediction_data, bet_amount, potential_payout, \
                    status, actual_payout \
             FROM predictions WHERE contest_id = $1 AND status = 'pending' \
             ORDER BY created_at ASC",
        )
        .bind(contest_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Prediction::try_from).collect()
    }

    async fn record_prediction_outcome(
        &self,
        prediction_id: PredictionId,
        status: PredictionStatus,
        actual_payout: Decimal,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "UPDATE predictions SET status = $2, actual_payout = $3 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(prediction_id.as_uuid())
        .bind(status.as_str())
        .bind(actual_payout)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_contest_graded(
        &self,
        contest_id: ContestId,
        result: &str,
    ) -> Result<(), LedgerError> {
        let updated = sqlx::query(
            "UPDATE contests SET status = 'graded', result = $2, graded_at = NOW() \
             WHERE id = $1 AND status = 'open'",
        )
        .bind(contest_id.as_uuid())
        .bind(result)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return match self.contest(contest_id).await? {
                Some(_) => Err(LedgerError::ContestAlreadyGraded(contest_id)),
                None => Err(LedgerError::ContestNotFound(contest_id)),
            };
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    async fn append_admin_log(
        &self,
        entry: NewAdminLogEntry,
    ) -> Result<AdminLogEntry, LedgerError> {
        let row = sqlx::query_as::<_, AdminLogRow>(
            "INSERT INTO admin_logs (admin_id, target_user_id, action, details) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, admin_id, target_user_id, action, details, created_at",
        )
        .bind(entry.admin_id.as_uuid())
        .bind(entry.target_user_id.map(Uuid::from))
        .bind(&entry.action)
        .bind(&entry.details)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn admin_logs(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<AdminLogEntry>, u64), LedgerError> {
        let rows = sqlx::query_as::<_, AdminLogRow>(
            "SELECT id, admin_id, target_user_id, action, details, created_at FROM admin_logs \
             ORDER BY id DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(AdminLogEntry::from).collect(),
            to_u64(total),
        ))
    }

    async fn append_grading_log(&self, entry: &GradingLogEntry) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO auto_grading_logs (contest_id, status, message, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(entry.contest_id.map(Uuid::from))
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn grading_logs(&self, limit: u32) -> Result<Vec<GradingLogEntry>, LedgerError> {
        let rows = sqlx::query_as::<_, GradingLogRow>(
            "SELECT contest_id, status, message, created_at FROM auto_grading_logs \
             ORDER BY id DESC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GradingLogEntry::try_from).collect()
    }

    async fn auto_grading_config(&self) -> Result<AutoGradingConfig, LedgerError> {
        let enabled =
            sqlx::query_scalar::<_, bool>("SELECT enabled FROM auto_grading_config WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(AutoGradingConfig {
            enabled: enabled.unwrap_or(false),
        })
    }

    async fn set_auto_grading_config(
        &self,
        config: AutoGradingConfig,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO auto_grading_config (id, enabled) VALUES (1, $1) \
             ON CONFLICT (id) DO UPDATE SET enabled = EXCLUDED.enabled, updated_at = NOW()",
        )
        .bind(config.enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
