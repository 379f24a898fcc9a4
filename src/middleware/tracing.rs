//! Request tracing
//!
//! A `TraceLayer` whose span carries a request id, the method and the path.
//! The query string is left out because signup, login and channel opens all
//! carry credentials there. Anything logged while handling the request (the
//! channel gate's accept/reject, the auth service's outcomes) lands in that
//! span.

use axum::http::{HeaderMap, Request, Response};
use std::time::Duration;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{MakeSpan, OnResponse, TraceLayer};
use tracing::Span;
use uuid::Uuid;

/// Span builder that never records the query string
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialSafeSpan;

impl<B> MakeSpan<B> for CredentialSafeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
            client_ip = ?client_ip(request.headers()),
        )
    }
}

/// Completion logger: server errors at `error`, everything else at `info`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCompletion;

impl<B> OnResponse<B> for LogCompletion {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let status = response.status();
        let duration_ms = latency.as_millis();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), duration_ms, "Request failed");
        } else {
            tracing::info!(status = status.as_u16(), duration_ms, "Request completed");
        }
    }
}

pub type RequestTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, CredentialSafeSpan, (), LogCompletion, (), (), ()>;

/// Tracing layer for the API router
pub fn request_trace_layer() -> RequestTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(CredentialSafeSpan)
        .on_request(())
        .on_response(LogCompletion)
        .on_body_chunk(())
        .on_eos(())
        .on_failure(())
}

/// First hop from `x-forwarded-for`, else `x-real-ip`
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string())
        })
}
