//! System endpoints: liveness plus a store round-trip.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"healthy"`, or `"degraded"` when the store did not answer.
    pub status: String,
    /// Whether the store answered the probe.
    pub store_reachable: bool,
    /// Current auto-grading switch; absent when the store is unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_grading_enabled: Option<bool>,
    /// Current server time (RFC 3339).
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// `GET /health` — Service and store status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Probes the store by reading the auto-grading switch.",
    responses(
        (status = 200, description = "Service and store are up", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let probe = state.admin_service.auto_grading().await;
    if let Err(err) = &probe {
        tracing::warn!(error = %err, "health probe failed");
    }
    let reachable = probe.is_ok();
    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if reachable { "healthy" } else { "degraded" }.to_string(),
            store_reachable: reachable,
            auto_grading_enabled: probe.ok().map(|c| c.enabled),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
