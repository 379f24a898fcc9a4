//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::AuthService;
use crate::websocket::ChannelRegistry;

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub channels: ChannelRegistry,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, channels: ChannelRegistry) -> Self {
        Self {
            auth_service,
            channels,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for ChannelRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.channels.clone()
    }
}
