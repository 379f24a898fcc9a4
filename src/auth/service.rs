//! Authentication service
//!
//! Signup, login and token checks against the credential store.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{AuthCredentials, NewUser, UserUpdate};

use super::password::{PasswordError, PasswordHasher};
use super::store::{StoreError, UserStore};
use super::token::TokenIssuer;

/// Auth service errors
///
/// `UnknownUser` and `InvalidCredentials` stay distinct here for logging;
/// the HTTP layer folds them into one response.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unknown user")]
    UnknownUser,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    DuplicateUser,

    #[error("Authentication failure")]
    AuthenticationFailure,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for every outcome that means "these credentials are not good"
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::UnknownUser
                | AuthError::InvalidCredentials
                | AuthError::AuthenticationFailure
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AuthError::DuplicateUser,
            StoreError::NotFound => AuthError::UnknownUser,
            StoreError::Unavailable(msg) => {
                tracing::error!(error = %msg, "Credential store unavailable");
                AuthError::StoreUnavailable(msg)
            }
            StoreError::Migration(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Empty => AuthError::InvalidRequest(e.to_string()),
            _ => AuthError::Internal(e.to_string()),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl AuthService {
    /// Create a new AuthService over an injected store
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        tracing::info!(
            bcrypt_cost = hasher.cost(),
            token_bytes = tokens.token_bytes(),
            "Auth service ready"
        );

        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// Register a new user and issue their first token
    pub async fn signup(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<AuthCredentials, AuthError> {
        if user_id.is_empty() {
            return Err(AuthError::InvalidRequest("userId must not be empty".to_string()));
        }

        let hashed_password = self.hasher.hash(password).await?;
        let auth_token = self.tokens.issue();

        let user = self
            .store
            .insert(NewUser {
                id: user_id.to_string(),
                hashed_password,
                auth_token: auth_token.clone(),
            })
            .await
            .map_err(|e| {
                if matches!(e, StoreError::Duplicate) {
                    tracing::warn!(user_id = %user_id, "Signup rejected: user already exists");
                }
                AuthError::from(e)
            })?;

        tracing::info!(user_id = %user.id, "User signed up");

        Ok(AuthCredentials {
            user_id: user.id,
            auth_token,
        })
    }

    /// Check a password and rotate the user's token
    ///
    /// The new token replaces the stored one, so any earlier token stops
    /// passing [`token_auth`](Self::token_auth).
    pub async fn login(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<AuthCredentials, AuthError> {
        let user = match self.store.get(user_id).await? {
            Some(user) => user,
            None => {
                self.hasher.verify_decoy(password).await;
                tracing::warn!(user_id = %user_id, "Login rejected: unknown user");
                return Err(AuthError::UnknownUser);
            }
        };

        if !self.hasher.verify(password, &user.hashed_password).await {
            tracing::warn!(user_id = %user_id, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let auth_token = self.tokens.issue();
        self.store
            .replace(
                &user.id,
                UserUpdate {
                    auth_token: Some(auth_token.clone()),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthCredentials {
            user_id: user.id,
            auth_token,
        })
    }

    /// Gate for new real-time connections
    ///
    /// Read-only: succeeds only if `auth_token` equals the most recently
    /// issued token for `user_id`. Unknown users, users without a token and
    /// mismatches all fail the same way.
    pub async fn token_auth(&self, user_id: &str, auth_token: &str) -> Result<(), AuthError> {
        let stored = if user_id.is_empty() {
            None
        } else {
            self.store.get(user_id).await?.and_then(|user| user.auth_token)
        };

        if self.tokens.verify(stored.as_deref(), auth_token) {
            tracing::debug!(user_id = %user_id, "Token accepted");
            Ok(())
        } else {
            tracing::warn!(user_id = %user_id, "Token rejected");
            Err(AuthError::AuthenticationFailure)
        }
    }

    /// Check the backing store is reachable
    pub async fn store_health(&self) -> Result<(), AuthError> {
        self.store.ping().await.map_err(AuthError::from)
    }
}
