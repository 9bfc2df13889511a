//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::domain::EventBus;
use crate::persistence::Store;
use crate::service::{AdminService, AutoGrader, GradingService, LedgerService, WalletService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Deposits, withdrawals and wallet queries.
    pub wallet_service: Arc<WalletService>,
    /// Audited operator actions.
    pub admin_service: Arc<AdminService>,
    /// Manual contest grading.
    pub grading_service: Arc<GradingService>,
    /// Auto-grading trigger.
    pub auto_grader: Arc<AutoGrader>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires every service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &LedgerConfig) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let ledger = LedgerService::new(store, event_bus.clone());
        let grading = GradingService::new(
            ledger.clone(),
            config.policy.default_payout_multiplier,
            config.grading_concurrency,
        );

        Self {
            wallet_service: Arc::new(WalletService::new(ledger.clone(), config.policy)),
            admin_service: Arc::new(AdminService::new(ledger)),
            grading_service: Arc::new(grading.clone()),
            auto_grader: Arc::new(AutoGrader::new(grading)),
            event_bus,
        }
    }
}
