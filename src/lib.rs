//! # wager-ledger
//!
//! Wallet ledger and contest settlement service for a sports-spread
//! trading platform.
//!
//! Every balance change goes through one atomic, idempotent primitive
//! ([`service::LedgerService::apply_transaction`]). Deposits, withdrawals,
//! admin adjustments and grading payouts are policies on top of it; the
//! auto-grader drives grading on a schedule.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── WalletService / AdminService / GradingService / AutoGrader (service/)
//!     ├── LedgerService (service/)  ──►  EventBus (domain/)
//!     │
//!     └── Store (persistence/)
//!           ├── PostgresStore  (update_wallet_balance, row lock per user)
//!           └── MemoryStore    (per-user mutex)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the full HTTP application: REST API, `/ws`, tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws::handler::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
