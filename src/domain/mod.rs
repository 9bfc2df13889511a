//! Domain layer: ledger types, policies, contests, and the event system.
//!
//! Everything here is free of I/O. The KYC policy and the outcome-matching
//! rule are pure functions; the persistence and service layers build on
//! these types.

pub mod audit;
pub mod contest;
pub mod event_bus;
pub mod ids;
pub mod kyc;
pub mod payment;
pub mod transaction;
pub mod wallet_event;

pub use audit::{
    AdminLogEntry, AutoGradingConfig, GradingLogEntry, GradingRunStatus, InterestSetting,
    NewAdminLogEntry,
};
pub use contest::{Contest, ContestStatus, Prediction, PredictionStatus, outcome_matches};
pub use event_bus::EventBus;
pub use ids::{ContestId, EntryId, PredictionId, UserId};
pub use kyc::{
    KycLevel, WithdrawalDecision, WithdrawalDenial, can_user_withdraw, start_of_utc_day,
};
pub use payment::PaymentMethod;
pub use transaction::{LedgerEntry, LedgerReceipt, NewLedgerEntry, TransactionType, Wallet};
pub use wallet_event::WalletEvent;
