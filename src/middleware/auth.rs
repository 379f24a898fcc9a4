//! Channel authentication
//!
//! Extractor that runs the token check for a real-time channel before the
//! connection is upgraded.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::error::ApiError;
use crate::models::ChannelParams;

/// Session established for an authenticated channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSession {
    pub user_id: String,
}

/// Extractor for authenticated channel sessions
///
/// Reads `userId` and `authToken` from the query string. Missing or
/// unparseable parameters are treated like a wrong token so the rejection
/// looks the same in every case.
///
/// # Example
///
/// ```rust,ignore
/// async fn open_channel(session: ChannelSession, ws: WebSocketUpgrade) -> Response {
///     ws.on_upgrade(move |socket| serve(socket, session))
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for ChannelSession
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = Query::<ChannelParams>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| params)
            .unwrap_or_default();

        let user_id = params.user_id.unwrap_or_default();
        let auth_token = params.auth_token.unwrap_or_default();

        let auth_service = Arc::<AuthService>::from_ref(state);

        match auth_service.token_auth(&user_id, &auth_token).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "Channel upgrade accepted");
                Ok(ChannelSession { user_id })
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Channel upgrade rejected");
                Err(ApiError::from(e).into_response())
            }
        }
    }
}
