//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub active_sessions: usize,
    pub version: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Driver errors go to the log only; the body stays fixed
    let (status, store) = match state.auth_service.store_health().await {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            tracing::error!(error = %e, "Health check could not reach the credential store");
            ("unhealthy", "unavailable")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        store: store.to_string(),
        active_sessions: state.channels.active_sessions().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
