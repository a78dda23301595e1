//! Service health handler
//!
//! A healthy pool does not guarantee the dashboard works: the reorder view
//! is provisioned by the hosted database, so the probe checks it separately.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Reported health of the portal and its database dependencies
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub reorder_view: &'static str,
}

/// Liveness probe: pings the database and confirms `v_reorder_final` is
/// reachable
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let reorder_view = match sqlx::query("SELECT 1 FROM v_reorder_final LIMIT 1")
        .fetch_optional(&state.db)
        .await
    {
        Ok(_) => "reachable",
        Err(_) => "unreachable",
    };

    let status = if database == "connected" && reorder_view == "reachable" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
        reorder_view,
    })
}
