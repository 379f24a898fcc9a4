//! Chatgate Server Library
//!
//! Password accounts, session tokens, and token-gated real-time channels.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod websocket;
