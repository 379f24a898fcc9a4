//! Authentication HTTP handlers
//!
//! Credentials arrive as query parameters; responses carry only the user id
//! and the issued token.

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::error::ApiResult;
use crate::models::{AuthCredentials, CredentialsRequest};
use crate::state::AppState;

/// POST /signup - Create an account and issue its first token
pub async fn signup(
    State(state): State<AppState>,
    Query(req): Query<CredentialsRequest>,
) -> ApiResult<Json<AuthCredentials>> {
    req.validate()?;

    let creds = state
        .auth_service
        .signup(&req.user_id, &req.password)
        .await?;

    Ok(Json(creds))
}

/// POST /login - Verify a password and rotate the session token
///
/// No shape validation here: empty or oversized values simply fail to
/// match and get the same response as a wrong password.
pub async fn login(
    State(state): State<AppState>,
    Query(req): Query<CredentialsRequest>,
) -> ApiResult<Json<AuthCredentials>> {
    let creds = state
        .auth_service
        .login(&req.user_id, &req.password)
        .await?;

    Ok(Json(creds))
}
