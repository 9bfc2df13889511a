//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use wager_ledger::app_state::AppState;
use wager_ledger::build_app;
use wager_ledger::config::LedgerConfig;
use wager_ledger::persistence::{MemoryStore, Store};

/// App over a fresh in-memory store, plus a handle to seed it.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let (state, store) = test_state();
    (build_app(state), store)
}

/// State over a fresh in-memory store.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = LedgerConfig {
        persistence_enabled: false,
        ..LedgerConfig::default()
    };
    let state = AppState::new(Arc::clone(&store) as Arc<dyn Store>, &config);
    (state, store)
}

/// Serves the app on an ephemeral port and returns its address.
#[allow(clippy::panic)]
pub async fn spawn_server() -> (std::net::SocketAddr, Arc<MemoryStore>) {
    let (app, store) = test_app();
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, store)
}
