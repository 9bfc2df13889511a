//! Contests, predictions, and the outcome-matching rule used by grading.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ContestId, PredictionId, UserId};
use crate::error::LedgerError;

/// Object keys searched, in order, for the chosen outcome inside
/// `prediction_data`.
const SELECTION_KEYS: [&str; 6] = ["selection", "prediction", "outcome", "choice", "pick", "team"];

/// Lifecycle of a contest. `Open -> Graded` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContestStatus {
    /// Accepting or awaiting grading.
    Open,
    /// Result applied; immutable.
    Graded,
}

impl ContestStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Graded => "graded",
        }
    }
}

impl FromStr for ContestStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "graded" => Ok(Self::Graded),
            other => Err(LedgerError::Validation(format!("unknown contest status: {other}"))),
        }
    }
}

/// A market whose outstanding predictions are settled once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Contest {
    /// Identity.
    pub id: ContestId,
    /// Display title.
    pub title: String,
    /// Lifecycle state.
    pub status: ContestStatus,
    /// Authoritative result, once known.
    pub result: Option<String>,
    /// Closing time; auto-grading only picks contests past it.
    pub closes_at: Option<DateTime<Utc>>,
    /// When the contest was graded.
    pub graded_at: Option<DateTime<Utc>>,
}

impl Contest {
    /// Returns `true` if the scheduler should grade this contest at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ContestStatus::Open
            && self.result.as_deref().is_some_and(|r| !r.trim().is_empty())
            && self.closes_at.is_none_or(|closes| closes <= now)
    }
}

/// Settlement state of a prediction. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    /// Awaiting grading.
    Pending,
    /// Matched the result.
    Won,
    /// Did not match the result.
    Lost,
}

impl PredictionStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            other => Err(LedgerError::Validation(format!(
                "unknown prediction status: {other}"
            ))),
        }
    }
}

/// One user's stake on a contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Prediction {
    /// Identity; also the payout's ledger reference.
    pub id: PredictionId,
    /// Contest the stake belongs to.
    pub contest_id: ContestId,
    /// Staking user.
    pub user_id: UserId,
    /// Free-form payload holding the chosen outcome.
    #[schema(value_type = Object)]
    pub prediction_data: serde_json::Value,
    /// Amount staked.
    pub bet_amount: Decimal,
    /// Quoted payout, if one was fixed when the stake was placed.
    pub potential_payout: Option<Decimal>,
    /// Settlement state.
    pub status: PredictionStatus,
    /// Amount paid out after grading.
    pub actual_payout: Option<Decimal>,
}

impl Prediction {
    /// The user's chosen outcome string, if the payload holds one.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        extract_selection(&self.prediction_data)
    }

    /// Payout owed if this prediction wins: the quoted payout when present,
    /// otherwise `bet_amount * default_multiplier`.
    #[must_use]
    pub fn winning_payout(&self, default_multiplier: Decimal) -> Decimal {
        self.potential_payout
            .unwrap_or_else(|| self.bet_amount * default_multiplier)
    }
}

/// Pulls the chosen outcome out of a prediction payload.
///
/// Accepts a bare string, the first string of an array, or the first
/// string-valued key of [`SELECTION_KEYS`] in an object.
#[must_use]
pub fn extract_selection(data: &serde_json::Value) -> Option<&str> {
    let raw = match data {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Array(items) => items.iter().find_map(serde_json::Value::as_str),
        serde_json::Value::Object(map) => SELECTION_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(serde_json::Value::as_str)),
        _ => None,
    }?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Decides whether a selection matches the contest result.
///
/// Case-insensitive substring containment in either direction. Kept loose
/// for compatibility with existing contests; short results like `"Win"`
/// match unrelated selections that contain them.
#[must_use]
pub fn outcome_matches(selection: &str, result: &str) -> bool {
    let selection = selection.trim().to_lowercase();
    let result = result.trim().to_lowercase();
    if selection.is_empty() || result.is_empty() {
        return false;
    }
    selection.contains(&result) || result.contains(&selection)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn prediction(data: serde_json::Value, bet: i64, potential: Option<i64>) -> Prediction {
        Prediction {
            id: PredictionId::new(),
            contest_id: ContestId::new(),
            user_id: UserId::new(),
            prediction_data: data,
            bet_amount: Decimal::from(bet),
            potential_payout: potential.map(Decimal::from),
            status: PredictionStatus::Pending,
            actual_payout: None,
        }
    }

    #[test]
    fn matching_is_bidirectional_and_case_insensitive() {
        assert!(outcome_matches("Over 2.5", "Over"));
        assert!(outcome_matches("over", "OVER 2.5 goals"));
        assert!(!outcome_matches("Under 1.5", "Over"));
    }

    #[test]
    fn empty_strings_never_match() {
        assert!(!outcome_matches("", "Over"));
        assert!(!outcome_matches("Over", "   "));
    }

    #[test]
    fn extracts_from_supported_shapes() {
        assert_eq!(extract_selection(&json!("Over 2.5")), Some("Over 2.5"));
        assert_eq!(extract_selection(&json!(["Over 2.5"])), Some("Over 2.5"));
        assert_eq!(extract_selection(&json!({"selection": "Lakers"})), Some("Lakers"));
        assert_eq!(extract_selection(&json!({"odds": 2, "pick": " Home "})), Some("Home"));
        assert_eq!(extract_selection(&json!({"odds": 2})), None);
        assert_eq!(extract_selection(&json!(42)), None);
        assert_eq!(extract_selection(&json!("")), None);
    }

    #[test]
    fn payout_defaults_to_multiplier() {
        let multiplier = Decimal::new(18, 1);
        assert_eq!(
            prediction(json!("x"), 100, None).winning_payout(multiplier),
            Decimal::from(180)
        );
        assert_eq!(
            prediction(json!("x"), 100, Some(250)).winning_payout(multiplier),
            Decimal::from(250)
        );
    }

    #[test]
    fn due_requires_open_result_and_past_close() {
        let now = Utc::now();
        let mut contest = Contest {
            id: ContestId::new(),
            title: "Final".to_string(),
            status: ContestStatus::Open,
            result: None,
            closes_at: Some(now - chrono::Duration::minutes(5)),
            graded_at: None,
        };
        assert!(!contest.is_due(now));

        contest.result = Some("Home".to_string());
        assert!(contest.is_due(now));

        contest.closes_at = Some(now + chrono::Duration::minutes(5));
        assert!(!contest.is_due(now));

        contest.closes_at = None;
        contest.status = ContestStatus::Graded;
        assert!(!contest.is_due(now));
    }
}
