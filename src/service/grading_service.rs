//! Contest grading: settles pending predictions against a result.
//!
//! Predictions are independent, so they are graded concurrently up to a
//! configured width. Each winner is credited through the
//! [`LedgerService`] with the prediction id as reference, which makes a
//! re-run of the same contest unable to pay a prediction twice. A failed
//! credit is logged and excluded from the totals; the batch continues.

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::LedgerService;
use crate::domain::{
    ContestId, ContestStatus, NewLedgerEntry, Prediction, PredictionStatus, TransactionType,
    WalletEvent, outcome_matches,
};
use crate::error::LedgerError;

/// Aggregate result of grading one contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GradingSummary {
    /// Contest graded.
    pub contest_id: ContestId,
    /// Result applied.
    pub result: String,
    /// Pending predictions evaluated.
    pub total_predictions: u64,
    /// Winners whose payout was credited.
    pub winners_count: u64,
    /// Predictions marked lost.
    pub losers_count: u64,
    /// Winners whose credit failed.
    pub failed_credits: u64,
    /// Sum of credited payouts.
    pub total_payout: Decimal,
}

/// How a single prediction settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PredictionOutcome {
    Won { payout: Decimal, credited: bool },
    Lost,
}

/// Grades contests and pays winners.
#[derive(Debug, Clone)]
pub struct GradingService {
    ledger: LedgerService,
    default_payout_multiplier: Decimal,
    concurrency: usize,
}

impl GradingService {
    /// Creates a new `GradingService`.
    ///
    /// `concurrency` bounds how many predictions of one contest are graded
    /// at once; `0` is treated as `1`.
    #[must_use]
    pub fn new(ledger: LedgerService, default_payout_multiplier: Decimal, concurrency: usize) -> Self {
        Self {
            ledger,
            default_payout_multiplier,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns the underlying [`LedgerService`].
    #[must_use]
    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    /// Grades every pending prediction of `contest_id` against `result`
    /// and marks the contest graded.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] if `result` is blank.
    /// - [`LedgerError::ContestNotFound`] if the contest does not exist.
    /// - [`LedgerError::ContestAlreadyGraded`] if it was graded before.
    /// - [`LedgerError::PersistenceError`] if predictions cannot be loaded or
    ///   the contest cannot be marked graded.
    pub async fn grade_contest(
        &self,
        contest_id: ContestId,
        result: &str,
    ) -> Result<GradingSummary, LedgerError> {
        let result = result.trim();
        if result.is_empty() {
            return Err(LedgerError::Validation("result must not be empty".to_string()));
        }

        let store = self.ledger.store();
        let contest = store
            .contest(contest_id)
            .await?
            .ok_or(LedgerError::ContestNotFound(contest_id))?;
        if contest.status == ContestStatus::Graded {
            return Err(LedgerError::ContestAlreadyGraded(contest_id));
        }

        let predictions = store.pending_predictions(contest_id).await?;
        let total_predictions = predictions.len() as u64;
        tracing::info!(%contest_id, result, total_predictions, "grading contest");

        let outcomes: Vec<PredictionOutcome> = stream::iter(predictions)
            .map(|prediction| self.grade_prediction(prediction, &contest.title, result))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = GradingSummary {
            contest_id,
            result: result.to_string(),
            total_predictions,
            winners_count: 0,
            losers_count: 0,
            failed_credits: 0,
            total_payout: Decimal::ZERO,
        };
        for outcome in outcomes {
            match outcome {
                PredictionOutcome::Won {
                    payout,
                    credited: true,
                } => {
                    summary.winners_count += 1;
                    summary.total_payout += payout;
                }
                PredictionOutcome::Won { credited: false, .. } => summary.failed_credits += 1,
                PredictionOutcome::Lost => summary.losers_count += 1,
            }
        }

        store.mark_contest_graded(contest_id, result).await?;

        let _ = self.ledger.event_bus().publish(WalletEvent::ContestGraded {
            contest_id,
            result: summary.result.clone(),
            winners_count: summary.winners_count,
            total_payout: summary.total_payout,
            timestamp: Utc::now(),
        });

        tracing::info!(
            %contest_id,
            winners = summary.winners_count,
            losers = summary.losers_count,
            failed_credits = summary.failed_credits,
            total_payout = %summary.total_payout,
            "contest graded"
        );
        Ok(summary)
    }

    /// Settles one prediction. Never fails: errors are logged and reflected
    /// in the returned outcome.
    async fn grade_prediction(
        &self,
        prediction: Prediction,
        contest_title: &str,
        result: &str,
    ) -> PredictionOutcome {
        let matched = prediction
            .selection()
            .is_some_and(|selection| outcome_matches(selection, result));

        let outcome = if matched {
            let payout = prediction.winning_payout(self.default_payout_multiplier);
            let credit = self
                .ledger
                .apply_transaction(NewLedgerEntry::new(
                    prediction.user_id,
                    payout,
                    TransactionType::BetWin,
                    format!("Contest win: {contest_title}"),
                    prediction.id.to_string(),
                ))
                .await;
            if let Err(err) = &credit {
                tracing::error!(
                    prediction_id = %prediction.id,
                    user_id = %prediction.user_id,
                    %payout,
                    error = %err,
                    "payout credit failed"
                );
            }
            PredictionOutcome::Won {
                payout,
                credited: credit.is_ok(),
            }
        } else {
            PredictionOutcome::Lost
        };

        let (status, payout) = match outcome {
            PredictionOutcome::Won { payout, .. } => (PredictionStatus::Won, payout),
            PredictionOutcome::Lost => (PredictionStatus::Lost, Decimal::ZERO),
        };
        if let Err(err) = self
            .ledger
            .store()
            .record_prediction_outcome(prediction.id, status, payout)
            .await
        {
            tracing::error!(
                prediction_id = %prediction.id,
                %status,
                error = %err,
                "could not persist prediction outcome"
            );
        }

        let _ = self.ledger.event_bus().publish(WalletEvent::PredictionGraded {
            user_id: prediction.user_id,
            contest_id: prediction.contest_id,
            prediction_id: prediction.id,
            status,
            payout,
            timestamp: Utc::now(),
        });

        outcome
    }
}
