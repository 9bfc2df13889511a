//! wager-ledger server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and, when
//! configured, the periodic auto-grading task.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use wager_ledger::app_state::AppState;
use wager_ledger::build_app;
use wager_ledger::config::LedgerConfig;
use wager_ledger::persistence::{MemoryStore, PostgresStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = LedgerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("invalid configuration")?;
    tracing::info!(addr = %config.listen_addr, "starting wager-ledger");

    // Select the store
    let store: Arc<dyn Store> = if config.persistence_enabled {
        let pg = PostgresStore::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        tracing::info!("using PostgreSQL store");
        Arc::new(pg)
    } else {
        tracing::warn!("persistence disabled; balances live in memory only");
        Arc::new(MemoryStore::new())
    };

    // Build application state
    let app_state = AppState::new(store, &config);

    if config.auto_grading_interval_secs > 0 {
        let period = Duration::from_secs(config.auto_grading_interval_secs);
        let _ = Arc::clone(&app_state.auto_grader).spawn_periodic(period);
        tracing::info!(period_secs = config.auto_grading_interval_secs, "auto-grading task started");
    }

    let app = build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
