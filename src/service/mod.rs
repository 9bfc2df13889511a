//! Service layer: business logic orchestration.
//!
//! Every money-moving path converges on [`LedgerService`]. The
//! [`WalletService`], [`AdminService`] and [`GradingService`] build their
//! policies on top of it, and [`AutoGrader`] drives grading on a trigger.

pub mod admin_service;
pub mod grading_service;
pub mod ledger_service;
pub mod scheduler;
pub mod wallet_service;

pub use admin_service::{AdjustmentOutcome, AdminService};
pub use grading_service::{GradingService, GradingSummary};
pub use ledger_service::LedgerService;
pub use scheduler::{AutoGrader, ContestFailure, CycleReport};
pub use wallet_service::{DepositCommand, DepositOutcome, WalletService, WithdrawalOutcome};
