//! Middleware for the chatgate API
//!
//! Request tracing, security headers, and channel authentication.

pub mod auth;
mod security;
mod tracing;

pub use auth::ChannelSession;
pub use security::{hsts_header, security_headers};
pub use tracing::{request_trace_layer, RequestTraceLayer};
