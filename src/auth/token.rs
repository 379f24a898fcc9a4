//! Session token issuing
//!
//! Tokens are raw bytes from the operating system's CSPRNG encoded as
//! URL-safe base64 without padding, so they survive being passed as query
//! parameters on the channel URL.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Issues opaque session tokens of a fixed byte length
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    token_bytes: usize,
}

impl TokenIssuer {
    pub fn new(token_bytes: usize) -> Self {
        Self { token_bytes }
    }

    pub fn token_bytes(&self) -> usize {
        self.token_bytes
    }

    /// Draw a fresh token
    pub fn issue(&self) -> String {
        URL_SAFE_NO_PAD.encode(random_bytes(self.token_bytes))
    }

    /// Compare a presented token with the stored one
    ///
    /// A missing stored token never matches, including against an empty
    /// presented token.
    pub fn verify(&self, stored: Option<&str>, presented: &str) -> bool {
        match stored {
            Some(stored) if !stored.is_empty() => {
                constant_time_eq(stored.as_bytes(), presented.as_bytes())
            }
            _ => {
                // Same amount of work as a real comparison
                let _ = constant_time_eq(presented.as_bytes(), presented.as_bytes());
                false
            }
        }
    }
}

/// Fill a buffer from the OS CSPRNG
pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Constant-time byte slice comparison
///
/// Length is not treated as secret; contents are compared without early exit.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_issue_length() {
        let issuer = TokenIssuer::new(32);
        assert_eq!(issuer.token_bytes(), 32);
        let token = issuer.issue();
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(token.len(), 43);
        assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap().len(), 32);
    }

    #[test]
    fn test_issue_is_url_safe() {
        let issuer = TokenIssuer::new(48);
        for _ in 0..200 {
            let token = issuer.issue();
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn test_issue_no_collisions() {
        let issuer = TokenIssuer::new(16);
        let tokens: HashSet<String> = (0..10_000).map(|_| issuer.issue()).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn test_verify() {
        let issuer = TokenIssuer::new(32);
        let token = issuer.issue();

        assert!(issuer.verify(Some(&token), &token));
        assert!(!issuer.verify(Some(&token), &issuer.issue()));
        assert!(!issuer.verify(Some(&token), ""));
        assert!(!issuer.verify(None, &token));
        assert!(!issuer.verify(None, ""));
        assert!(!issuer.verify(Some(""), ""));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello world", b"hello world"));
        assert!(!constant_time_eq(b"hello world", b"hello worle"));
        assert!(!constant_time_eq(b"hello", b"hello world"));
        assert!(constant_time_eq(b"", b""));
    }
}
