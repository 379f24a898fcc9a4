//! Real-time channel routes

use axum::{routing::get, Router};

use crate::state::AppState;
use crate::websocket::channel_handler;

/// Path clients open channels on
pub const CHANNEL_PATH: &str = "/db";

pub fn channel_routes() -> Router<AppState> {
    Router::new().route(CHANNEL_PATH, get(channel_handler))
}
