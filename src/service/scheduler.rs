//! Auto-grading scheduler.
//!
//! A trigger (the cron endpoint or the in-process interval task) runs one
//! cycle: if the switch passed in is on, every due contest is graded in
//! turn and the outcome of each is written to the grading log. Cycles do
//! not overlap; a trigger that arrives while one is running is refused.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use super::{GradingService, GradingSummary};
use crate::domain::{AutoGradingConfig, ContestId, GradingLogEntry, GradingRunStatus};
use crate::error::LedgerError;

/// A contest the cycle could not grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContestFailure {
    /// Contest concerned.
    pub contest_id: ContestId,
    /// Error message.
    pub error: String,
}

/// Result of one scheduler trigger.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct CycleReport {
    /// `true` when the switch was off and nothing ran.
    pub skipped: bool,
    /// Contests graded in this cycle.
    pub graded: Vec<GradingSummary>,
    /// Contests that failed to grade.
    pub failures: Vec<ContestFailure>,
    /// Winners credited across all graded contests.
    pub winners_count: u64,
    /// Payout credited across all graded contests.
    pub total_payout: Decimal,
}

impl CycleReport {
    /// Report of a trigger that found the switch off.
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Non-reentrant driver of the [`GradingService`].
#[derive(Debug)]
pub struct AutoGrader {
    grading: GradingService,
    running: Mutex<()>,
}

impl AutoGrader {
    /// Creates a new `AutoGrader`.
    #[must_use]
    pub fn new(grading: GradingService) -> Self {
        Self {
            grading,
            running: Mutex::new(()),
        }
    }

    /// Runs one grading cycle under `config`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::GradingInProgress`] if another cycle is running.
    /// - The store error if due contests cannot be listed; a `failed` row
    ///   is written to the grading log first.
    pub async fn run_cycle(&self, config: AutoGradingConfig) -> Result<CycleReport, LedgerError> {
        if !config.enabled {
            tracing::debug!("auto-grading disabled; cycle skipped");
            return Ok(CycleReport::skipped());
        }

        let Ok(_guard) = self.running.try_lock() else {
            return Err(LedgerError::GradingInProgress);
        };

        let store = self.grading.ledger().store();
        let due = match store.due_contests(Utc::now()).await {
            Ok(due) => due,
            Err(err) => {
                tracing::error!(error = %err, "could not list due contests");
                self.log(GradingLogEntry::new(None, GradingRunStatus::Failed, err.to_string()))
                    .await;
                return Err(err);
            }
        };

        let mut report = CycleReport::default();
        for contest in due {
            let Some(result) = contest.result.as_deref() else {
                continue;
            };
            match self.grading.grade_contest(contest.id, result).await {
                Ok(summary) => {
                    self.log(GradingLogEntry::new(
                        Some(contest.id),
                        GradingRunStatus::Completed,
                        format!(
                            "graded with result '{}': {} winners, total payout {}",
                            summary.result, summary.winners_count, summary.total_payout
                        ),
                    ))
                    .await;
                    report.winners_count += summary.winners_count;
                    report.total_payout += summary.total_payout;
                    report.graded.push(summary);
                }
                Err(err) => {
                    tracing::error!(contest_id = %contest.id, error = %err, "auto-grading failed");
                    self.log(GradingLogEntry::new(
                        Some(contest.id),
                        GradingRunStatus::Failed,
                        err.to_string(),
                    ))
                    .await;
                    report.failures.push(ContestFailure {
                        contest_id: contest.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            graded = report.graded.len(),
            failed = report.failures.len(),
            winners = report.winners_count,
            total_payout = %report.total_payout,
            "auto-grading cycle finished"
        );
        Ok(report)
    }

    /// Reads the stored switch and runs one cycle with it.
    ///
    /// # Errors
    ///
    /// Same as [`AutoGrader::run_cycle`], plus store errors reading the
    /// switch.
    pub async fn trigger(&self) -> Result<CycleReport, LedgerError> {
        let config = self.grading.ledger().store().auto_grading_config().await?;
        self.run_cycle(config).await
    }

    /// Spawns a task that calls [`AutoGrader::trigger`] every `period`.
    pub fn spawn_periodic(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match self.trigger().await {
                    Ok(report) if report.skipped => {}
                    Ok(report) => tracing::debug!(graded = report.graded.len(), "periodic cycle done"),
                    Err(err) => tracing::warn!(error = %err, "periodic cycle failed"),
                }
            }
        })
    }

    /// Returns up to `limit` grading log rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PersistenceError`] on store failure.
    pub async fn recent_logs(&self, limit: u32) -> Result<Vec<GradingLogEntry>, LedgerError> {
        self.grading.ledger().store().grading_logs(limit).await
    }

    async fn log(&self, entry: GradingLogEntry) {
        if let Err(err) = self.grading.ledger().store().append_grading_log(&entry).await {
            tracing::warn!(error = %err, "grading log write failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{
        Contest, ContestStatus, EventBus, Prediction, PredictionId, PredictionStatus, UserId,
    };
    use crate::persistence::faulty::FaultyStore;
    use crate::persistence::{AuditStore, ContestStore, MemoryStore, Store};
    use crate::service::LedgerService;

    const ENABLED: AutoGradingConfig = AutoGradingConfig { enabled: true };

    fn due_contest(result: Option<&str>) -> Contest {
        Contest {
            id: ContestId::new(),
            title: "Match".to_string(),
            status: ContestStatus::Open,
            result: result.map(str::to_string),
            closes_at: Some(Utc::now() - chrono::Duration::minutes(5)),
            graded_at: None,
        }
    }

    fn stake(contest_id: ContestId, pick: &str) -> Prediction {
        Prediction {
            id: PredictionId::new(),
            contest_id,
            user_id: UserId::new(),
            prediction_data: json!({ "selection": pick }),
            bet_amount: Decimal::from(100),
            potential_payout: None,
            status: PredictionStatus::Pending,
            actual_payout: None,
        }
    }

    fn grader_over(store: Arc<dyn Store>) -> AutoGrader {
        let ledger = LedgerService::new(store, EventBus::new(64));
        AutoGrader::new(GradingService::new(ledger, Decimal::new(18, 1), 2))
    }

    #[tokio::test]
    async fn disabled_switch_skips_without_grading() {
        let store = Arc::new(MemoryStore::new());
        let grader = grader_over(Arc::clone(&store) as Arc<dyn Store>);
        let c = due_contest(Some("Home"));
        store.insert_contest(c.clone()).await;

        let Ok(report) = grader.run_cycle(AutoGradingConfig::default()).await else {
            panic!("cycle failed");
        };
        assert!(report.skipped);
        let Ok(Some(still_open)) = store.contest(c.id).await else {
            panic!("contest missing");
        };
        assert_eq!(still_open.status, ContestStatus::Open);
        assert_eq!(store.grading_logs(10).await.map(|l| l.len()).ok(), Some(0));
    }

    #[tokio::test]
    async fn enabled_cycle_grades_due_contests_and_logs() {
        let store = Arc::new(MemoryStore::new());
        let grader = grader_over(Arc::clone(&store) as Arc<dyn Store>);
        let due = due_contest(Some("Home"));
        let no_result = due_contest(None);
        store.insert_contest(due.clone()).await;
        store.insert_contest(no_result.clone()).await;
        store.insert_prediction(stake(due.id, "Home")).await;

        let Ok(report) = grader.run_cycle(ENABLED).await else {
            panic!("cycle failed");
        };
        assert!(!report.skipped);
        assert_eq!(report.graded.len(), 1);
        assert_eq!(report.winners_count, 1);
        assert_eq!(report.total_payout, Decimal::from(180));

        let Ok(logs) = store.grading_logs(10).await else {
            panic!("logs failed");
        };
        assert_eq!(logs.len(), 1);
        assert!(logs
            .iter()
            .all(|l| l.status == GradingRunStatus::Completed && l.contest_id == Some(due.id)));
    }

    #[tokio::test]
    async fn failing_contest_is_logged_and_cycle_continues() {
        let broken = due_contest(Some("Away"));
        let healthy = due_contest(Some("Away"));
        let store = Arc::new(FaultyStore {
            fail_contest: Some(broken.id),
            ..FaultyStore::default()
        });
        let grader = grader_over(Arc::clone(&store) as Arc<dyn Store>);
        store.inner.insert_contest(broken.clone()).await;
        store.inner.insert_contest(healthy.clone()).await;

        let Ok(report) = grader.run_cycle(ENABLED).await else {
            panic!("cycle failed");
        };
        assert_eq!(report.graded.len(), 1);
        assert_eq!(report.failures.len(), 1);

        let Ok(logs) = store.inner.grading_logs(10).await else {
            panic!("logs failed");
        };
        assert!(logs
            .iter()
            .any(|l| l.status == GradingRunStatus::Failed && l.contest_id == Some(broken.id)));
        assert!(logs
            .iter()
            .any(|l| l.status == GradingRunStatus::Completed && l.contest_id == Some(healthy.id)));
    }

    #[tokio::test]
    async fn listing_failure_writes_failed_row_and_errors() {
        let store = Arc::new(FaultyStore {
            fail_due_listing: true,
            ..FaultyStore::default()
        });
        let grader = grader_over(Arc::clone(&store) as Arc<dyn Store>);

        let result = grader.run_cycle(ENABLED).await;
        assert!(matches!(result, Err(LedgerError::PersistenceError(_))));

        let Ok(logs) = store.inner.grading_logs(10).await else {
            panic!("logs failed");
        };
        assert_eq!(logs.len(), 1);
        assert!(logs
            .iter()
            .all(|l| l.status == GradingRunStatus::Failed && l.contest_id.is_none()));
    }

    #[tokio::test]
    async fn overlapping_trigger_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let grader = grader_over(Arc::clone(&store) as Arc<dyn Store>);

        let _held = grader.running.lock().await;
        assert_eq!(
            grader.run_cycle(ENABLED).await,
            Err(LedgerError::GradingInProgress)
        );
    }

    #[tokio::test]
    async fn trigger_reads_stored_switch() {
        let store = Arc::new(MemoryStore::new());
        let grader = grader_over(Arc::clone(&store) as Arc<dyn Store>);

        let Ok(report) = grader.trigger().await else {
            panic!("trigger failed");
        };
        assert!(report.skipped);

        let _ = store.set_auto_grading_config(ENABLED).await;
        let Ok(report) = grader.trigger().await else {
            panic!("trigger failed");
        };
        assert!(!report.skipped);
    }
}
