//! Error types and response handling for the gateway.
//!
//! Every failure ends in a well-formed JSON response with the shape
//! `{"message": "API Proxy Error", "detail": "<error>"}`.

use std::error::Error as StdError;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Fixed `message` of every error body the gateway produces itself.
pub const PROXY_ERROR_MESSAGE: &str = "API Proxy Error";

/// Errors that can occur while relaying a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The resolver produced no backend candidates.
    #[error("no backend candidates configured")]
    NoCandidates,

    /// Candidate URL plus request path did not form a valid URI.
    #[error("invalid backend target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// Connection-level failure (refused, DNS, reset before headers).
    #[error("connection to {candidate} failed: {}", chain(.source))]
    Connect {
        candidate: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// No response headers (or full body, for buffered routes) in time.
    #[error("{candidate} did not respond within {}s", .timeout.as_secs_f64())]
    Timeout { candidate: String, timeout: Duration },

    /// Every candidate failed at the connection level.
    #[error("all backend candidates failed: {}", join(.0))]
    Exhausted(Vec<ProxyError>),

    /// The backend answered but its body could not be read.
    #[error("reading response body from {candidate} failed: {source}")]
    BodyRead {
        candidate: String,
        #[source]
        source: axum::Error,
    },

    /// The inbound request body could not be read.
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    /// The inbound body grew past `security.max_body_size`.
    #[error("request body exceeds the configured limit")]
    BodyTooLarge,

    #[error("method {0} is not supported")]
    MethodNotAllowed(Method),

    #[error("failed to build response: {0}")]
    Http(#[from] axum::http::Error),
}

impl ProxyError {
    /// Map error variant to the HTTP status returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether the failure happened before any backend responded.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            ProxyError::Connect { .. } | ProxyError::Timeout { .. } | ProxyError::InvalidTarget { .. }
        )
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = json!({
            "message": PROXY_ERROR_MESSAGE,
            "detail": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Render an error with its source chain, e.g.
/// `client error (Connect): tcp connect error: Connection refused`.
fn chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn join(errors: &[ProxyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
