//! Data models for the chatgate server

use sqlx::types::chrono::{DateTime, Utc};

pub mod auth;
pub use auth::*;

/// User record as held by the credential store
///
/// `auth_token` is `None` until the first successful signup or login.
#[derive(sqlx::FromRow, Clone)]
pub struct User {
    pub id: String,
    pub hashed_password: String,
    pub auth_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("hashed_password", &"<redacted>")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Fields written when a new user is created
#[derive(Clone)]
pub struct NewUser {
    pub id: String,
    pub hashed_password: String,
    pub auth_token: String,
}

/// Fields to overwrite on an existing user; `None` leaves the column alone
#[derive(Clone, Default)]
pub struct UserUpdate {
    pub hashed_password: Option<String>,
    pub auth_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_debug_redacts_secrets() {
        let now = Utc::now();
        let user = User {
            id: "alice".to_string(),
            hashed_password: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            auth_token: Some("c2VjcmV0LXRva2Vu".to_string()),
            created_at: now,
            updated_at: now,
        };

        let debug = format!("{:?}", user);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("$2b$04$"));
        assert!(!debug.contains("c2VjcmV0LXRva2Vu"));
    }
}
