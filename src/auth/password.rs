//! Password hashing
//!
//! bcrypt with a configurable work factor. Every hash carries a fresh random
//! salt, so hashing the same password twice yields two different strings that
//! both verify. bcrypt is CPU-bound, so all work runs on tokio's blocking pool
//! instead of stalling the request executor.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;

/// Errors that can occur while hashing
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Hashing task failed: {0}")]
    Task(String),
}

/// Salted, cost-parameterized password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Hash of a throw-away secret, verified against when the account does not
    // exist so that the miss costs the same as a wrong password.
    decoy: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost (4..=31)
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: Arc::new(OnceCell::new()),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh salt
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Empty);
        }

        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
            .map_err(PasswordError::from)
    }

    /// Check a password against a stored hash
    ///
    /// Never fails: a corrupted hash, a panicked task or a mismatch all come
    /// back as `false`, so callers can treat every outcome other than `true`
    /// as a failed authentication.
    pub async fn verify(&self, password: &str, hashed: &str) -> bool {
        let password = password.to_owned();
        let hashed = hashed.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// Burn the same amount of work as a real verification
    pub async fn verify_decoy(&self, password: &str) {
        let decoy = self
            .decoy
            .get_or_try_init(|| async {
                let secret = super::token::random_bytes(16);
                let cost = self.cost;
                tokio::task::spawn_blocking(move || bcrypt::hash(secret, cost))
                    .await
                    .map_err(|e| PasswordError::Task(e.to_string()))?
                    .map_err(PasswordError::from)
            })
            .await;

        match decoy {
            Ok(hashed) => {
                let _ = self.verify(password, hashed).await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to prepare decoy hash"),
        }
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_hash_is_salted() {
        let hasher = PasswordHasher::new(TEST_COST);
        let first = hasher.hash("hunter2").await.unwrap();
        let second = hasher.hash("hunter2").await.unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("hunter2", &first).await);
        assert!(hasher.verify("hunter2", &second).await);
    }

    #[tokio::test]
    async fn test_hash_never_contains_plaintext() {
        let hasher = PasswordHasher::new(TEST_COST);
        let hashed = hasher.hash("correct horse").await.unwrap();
        assert!(!hashed.contains("correct horse"));
        assert!(hashed.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_hash_uses_configured_cost() {
        let hasher = PasswordHasher::new(TEST_COST);
        assert_eq!(hasher.cost(), TEST_COST);

        let hashed = hasher.hash("pw1").await.unwrap();
        let cost_field = format!("{:02}", hasher.cost());
        assert_eq!(hashed.split('$').nth(2), Some(cost_field.as_str()));
    }

    #[tokio::test]
    async fn test_verify_wrong_password() {
        let hasher = PasswordHasher::new(TEST_COST);
        let hashed = hasher.hash("pw1").await.unwrap();
        assert!(!hasher.verify("pw2", &hashed).await);
        assert!(!hasher.verify("", &hashed).await);
    }

    #[tokio::test]
    async fn test_verify_corrupted_hash_is_false() {
        let hasher = PasswordHasher::new(TEST_COST);
        assert!(!hasher.verify("pw1", "").await);
        assert!(!hasher.verify("pw1", "not-a-bcrypt-hash").await);
        assert!(!hasher.verify("pw1", "$2b$04$truncated").await);
    }

    #[tokio::test]
    async fn test_empty_password_rejected() {
        let hasher = PasswordHasher::new(TEST_COST);
        assert!(matches!(hasher.hash("").await, Err(PasswordError::Empty)));
    }

    #[tokio::test]
    async fn test_invalid_cost_is_an_error() {
        let hasher = PasswordHasher::new(2);
        assert!(matches!(
            hasher.hash("pw1").await,
            Err(PasswordError::Hash(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_decoy_completes() {
        let hasher = PasswordHasher::new(TEST_COST);
        hasher.verify_decoy("anything").await;
        hasher.verify_decoy("anything else").await;
        assert!(hasher.decoy.get().is_some());
    }
}
