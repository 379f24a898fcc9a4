//! HTTP handlers for the chatgate API

pub mod auth;
pub mod health;

pub use health::{health_check, HealthResponse};
