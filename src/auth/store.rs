//! Credential store access
//!
//! The orchestrator talks to user records only through [`UserStore`]. The
//! store owns identifier uniqueness and per-key atomicity; callers only see
//! whole-record reads, create-if-absent inserts and field replacement.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::models::{NewUser, User, UserUpdate};

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User already exists")]
    Duplicate,

    #[error("User not found")]
    NotFound,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Access to user records keyed by user id
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Load a user record, `None` if absent
    async fn get(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Create a user; fails with `Duplicate` if the id is taken
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    /// Overwrite the given fields of an existing user
    async fn replace(&self, user_id: &str, update: UserUpdate) -> StoreResult<()>;

    /// Cheap reachability check
    async fn ping(&self) -> StoreResult<()>;
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized and timed from the config
    ///
    /// An exhausted pool fails after `db_acquire_timeout` with `Unavailable`;
    /// callers never retry.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        tracing::info!(
            url = %config.database_url_masked(),
            max_connections = config.db_max_connections,
            acquire_timeout_secs = config.db_acquire_timeout.as_secs(),
            "Connecting to credential store"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Bring the `users` table up to date
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("Credential store schema up to date");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<User>> {
        let user: Option<User> = sqlx::query_as(
            r#"
            SELECT id, hashed_password, auth_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        // Plain INSERT: a taken id must surface as a unique violation, never
        // as an overwrite.
        let row: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, hashed_password, auth_token, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, hashed_password, auth_token, created_at, updated_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.hashed_password)
        .bind(&user.auth_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn replace(&self, user_id: &str, update: UserUpdate) -> StoreResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users
            SET hashed_password = COALESCE($1, hashed_password),
                auth_token = COALESCE($2, auth_token),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&update.hashed_password)
        .bind(&update.auth_token)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// In-process user store
///
/// Same semantics as the PostgreSQL store, held in a map. Useful for
/// embedding the server without a database and for tests.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        use std::collections::hash_map::Entry;

        let mut users = self.users.write().await;
        match users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let row = User {
                    id: user.id,
                    hashed_password: user.hashed_password,
                    auth_token: Some(user.auth_token),
                    created_at: now,
                    updated_at: now,
                };
                Ok(slot.insert(row).clone())
            }
        }
    }

    async fn replace(&self, user_id: &str, update: UserUpdate) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(user_id).ok_or(StoreError::NotFound)?;

        if let Some(hashed_password) = update.hashed_password {
            user.hashed_password = hashed_password;
        }
        if let Some(auth_token) = update.auth_token {
            user.auth_token = Some(auth_token);
        }
        user.updated_at = Utc::now();

        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
