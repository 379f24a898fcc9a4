//! Authentication module for the chatgate server
//!
//! Password-based accounts with opaque session tokens.
//! - bcrypt password hashing on the blocking pool
//! - CSPRNG session tokens, rotated on every signup and login
//! - Token checks gating each new real-time channel

mod password;
mod service;
mod store;
mod token;

pub use password::{PasswordError, PasswordHasher};
pub use service::{AuthError, AuthService};
pub use store::{MemoryUserStore, PgUserStore, StoreError, StoreResult, UserStore};
pub use token::{constant_time_eq, TokenIssuer};
