//! Response handling and transformation.
//!
//! # Responsibilities
//! - Pick the outbound representation from the route and content type
//! - Relay event streams unbuffered with fixed streaming headers
//! - Pass plain text through with the backend content type
//! - Re-encode JSON, or explain why it could not be decoded
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Backend status codes are passed through untouched, errors included
//! - A non-JSON body never fails the request; it comes back as a diagnostic

use axum::body::{to_bytes, Body, Bytes, HttpBody};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::{BoxError, Json};
use serde_json::{json, Value};

use crate::http::error::ProxyError;
use crate::resilience::Deadline;
use crate::routing::RouteKind;

pub const EVENT_STREAM: &str = "text/event-stream";
pub const DEFAULT_TEXT_TYPE: &str = "text/plain; charset=utf-8";

/// `message` of the diagnostic returned when a backend body is not JSON.
pub const INVALID_JSON_MESSAGE: &str = "Backend returned a non-JSON response";

/// Outbound representation of a backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    EventStream,
    Text,
    Json,
}

impl ResponseShape {
    /// Streaming routes always stream; otherwise `text/*` content is text
    /// and everything else is treated as JSON.
    pub fn select(route: RouteKind, headers: &HeaderMap) -> Self {
        if route.is_streaming() {
            return ResponseShape::EventStream;
        }
        let is_text = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/"));
        if is_text {
            ResponseShape::Text
        } else {
            ResponseShape::Json
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseShape::EventStream => "event-stream",
            ResponseShape::Text => "text",
            ResponseShape::Json => "json",
        }
    }

    /// Turn the backend response into the outbound response.
    ///
    /// `deadline` bounds the body read for buffered shapes and is ignored for
    /// event streams.
    pub async fn apply<B>(
        self,
        upstream: Response<B>,
        candidate: &str,
        deadline: Option<Deadline>,
    ) -> Result<Response<Body>, ProxyError>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        match self {
            ResponseShape::EventStream => event_stream(upstream),
            ResponseShape::Text => {
                let content_type = upstream
                    .headers()
                    .get(CONTENT_TYPE)
                    .cloned()
                    .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_TEXT_TYPE));
                let (status, bytes) = read_body(upstream, candidate, deadline).await?;
                let text = String::from_utf8_lossy(&bytes).into_owned();
                Ok(Response::builder()
                    .status(status)
                    .header(CONTENT_TYPE, content_type)
                    .body(Body::from(text))?)
            }
            ResponseShape::Json => {
                let (status, bytes) = read_body(upstream, candidate, deadline).await?;
                Ok(json_response(status, &bytes))
            }
        }
    }
}

/// Relay the body as it arrives. Dropping the returned response (for example
/// when the client disconnects) drops the backend body and its connection.
fn event_stream<B>(upstream: Response<B>) -> Result<Response<Body>, ProxyError>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = upstream.into_parts();

    let mut response = Response::builder()
        .status(parts.status)
        .header(CONTENT_TYPE, EVENT_STREAM)
        .header(CACHE_CONTROL, "no-cache")
        .header(CONNECTION, "keep-alive")
        .header(CONTENT_ENCODING, "none")
        .body(Body::new(body))?;

    // Non-canonical status text from the backend, if it sent one.
    if let Some(reason) = parts.extensions.get::<hyper::ext::ReasonPhrase>() {
        response.extensions_mut().insert(reason.clone());
    }

    Ok(response)
}

async fn read_body<B>(
    upstream: Response<B>,
    candidate: &str,
    deadline: Option<Deadline>,
) -> Result<(StatusCode, Bytes), ProxyError>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = upstream.into_parts();
    let read = to_bytes(Body::new(body), usize::MAX);

    let result = match deadline {
        Some(deadline) => deadline.run(read).await.map_err(|e| ProxyError::Timeout {
            candidate: candidate.to_string(),
            timeout: e.0,
        })?,
        None => read.await,
    };

    let bytes = result.map_err(|source| ProxyError::BodyRead {
        candidate: candidate.to_string(),
        source,
    })?;
    Ok((parts.status, bytes))
}

fn json_response(status: StatusCode, bytes: &Bytes) -> Response<Body> {
    if bytes.is_empty() && is_bodyless(status) {
        return status.into_response();
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => {
            let raw = String::from_utf8_lossy(bytes).into_owned();
            tracing::warn!(
                status = %status,
                error = %e,
                body_len = bytes.len(),
                "Backend body is not valid JSON, returning fallback"
            );
            let diagnostic = json!({
                "message": INVALID_JSON_MESSAGE,
                "detail": e.to_string(),
                "fallback": raw,
            });
            (status, Json(diagnostic)).into_response()
        }
    }
}

fn is_bodyless(status: StatusCode) -> bool {
    status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}
