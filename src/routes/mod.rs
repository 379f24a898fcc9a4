//! Route definitions for the chatgate API

mod auth;
mod channel;

use axum::{routing::get, Router};

use crate::handlers::health_check;
use crate::middleware;
use crate::state::AppState;

pub use auth::auth_routes;
pub use channel::{channel_routes, CHANNEL_PATH};

/// Assemble the API router with request tracing and security headers
///
/// Static assets, CORS and HSTS are layered on by the binary.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(channel_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(middleware::request_trace_layer())
}
