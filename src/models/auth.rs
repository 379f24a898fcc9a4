//! Request and response shapes for authentication

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters accepted by `/signup` and `/login`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 256, message = "userId must be 1-256 characters"))]
    pub user_id: String,

    #[validate(length(min = 1, max = 1024, message = "password must be 1-1024 characters"))]
    pub password: String,
}

/// Successful signup/login payload
///
/// Carries exactly the user id and the freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCredentials {
    pub user_id: String,
    pub auth_token: String,
}

/// Connection parameters presented when opening a real-time channel
///
/// Both fields are optional at the parsing layer so that a missing value is
/// treated as a failed authentication rather than a malformed request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelParams {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
}
