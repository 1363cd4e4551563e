//! Request handling and transformation.
//!
//! # Responsibilities
//! - Capture the inbound request once so it can be replayed per candidate
//! - Rewrite the target to `candidate + path + query`
//! - Strip the client-facing `Host` so the backend authority is used
//! - Drop hop-by-hop headers and the client's `Accept-Encoding`
//! - Never attach a body to GET or HEAD
//!
//! # Design Decisions
//! - Body buffered once (bounded by the body limit layer), then cloned per
//!   attempt; `Bytes` clones are reference-counted
//! - Framing headers are recomputed by the client for the relayed body
//! - The backend client negotiates its own encodings and decompresses replies,
//!   so the browser's `Accept-Encoding` never reaches the backend

use axum::body::{to_bytes, Body, Bytes};
use axum::http::header::{
    ACCEPT_ENCODING, CONNECTION, CONTENT_LENGTH, HOST, PROXY_AUTHENTICATE, PROXY_AUTHORIZATION,
    TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
};
use axum::http::{HeaderMap, HeaderName, Method, Request, Uri};
use http_body_util::LengthLimitError;
use std::error::Error as StdError;

use crate::http::error::ProxyError;

/// Methods the gateway relays. Anything else is answered with 405.
pub const FORWARDED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

pub fn is_forwardable(method: &Method) -> bool {
    FORWARDED_METHODS.contains(method)
}

/// Inbound headers never copied to the backend.
static SKIPPED_HEADERS: [HeaderName; 11] = [
    HOST,
    CONTENT_LENGTH,
    TRANSFER_ENCODING,
    CONNECTION,
    HeaderName::from_static("keep-alive"),
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    UPGRADE,
    ACCEPT_ENCODING,
];

fn is_forwarded_header(name: &HeaderName) -> bool {
    !SKIPPED_HEADERS.contains(name)
}

/// Whether requests with this method carry a body to the backend.
pub fn carries_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}

/// Whether buffering stopped because the body limit layer cut the body off.
fn exceeded_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}

/// A captured inbound request, replayable against any candidate.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    path_and_query: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl InboundRequest {
    /// Capture `request`, buffering its body when the method carries one.
    pub async fn capture(request: Request<Body>) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();

        let body = if carries_body(&parts.method) {
            // The body limit layer already bounds how much can arrive here.
            let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
                if exceeded_limit(&e) {
                    ProxyError::BodyTooLarge
                } else {
                    ProxyError::RequestBody(e)
                }
            })?;
            Some(bytes)
        } else {
            None
        };

        Ok(Self::from_parts(parts.method, &parts.uri, parts.headers, body))
    }

    pub fn from_parts(method: Method, uri: &Uri, headers: HeaderMap, body: Option<Bytes>) -> Self {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        let body = if carries_body(&method) { body } else { None };

        Self {
            method,
            path_and_query,
            headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        match self.path_and_query.split_once('?') {
            Some((path, _)) => path,
            None => &self.path_and_query,
        }
    }

    /// Full backend URL for `candidate`.
    pub fn target(&self, candidate: &str) -> String {
        format!("{}{}", candidate, self.path_and_query)
    }

    /// Build the outbound request for one attempt against `candidate`.
    pub fn to_backend(&self, candidate: &str) -> Result<Request<Body>, ProxyError> {
        let target = self.target(candidate);
        let uri: Uri = target.parse().map_err(|e: axum::http::uri::InvalidUri| {
            ProxyError::InvalidTarget {
                target: target.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut builder = Request::builder().method(self.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in &self.headers {
                if is_forwarded_header(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }

        let body = match &self.body {
            Some(bytes) => Body::from(bytes.clone()),
            None => Body::empty(),
        };

        builder.body(body).map_err(|e| ProxyError::InvalidTarget {
            target,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn inbound(method: Method, uri: &str, body: Option<&'static str>) -> InboundRequest {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("dashboard.example.com"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("99"));
        let uri: Uri = uri.parse().unwrap();
        InboundRequest::from_parts(method, &uri, headers, body.map(|b| Bytes::from_static(b.as_bytes())))
    }

    #[test]
    fn test_target_keeps_path_and_query() {
        let req = inbound(Method::GET, "/api/health?target=example.com", None);
        assert_eq!(req.path(), "/api/health");
        assert_eq!(
            req.target("http://backend:8000"),
            "http://backend:8000/api/health?target=example.com"
        );
    }

    #[test]
    fn test_host_stripped_other_headers_kept() {
        let req = inbound(Method::POST, "/api/deploy", Some("{}"));
        let out = req.to_backend("http://backend:8000").unwrap();

        assert!(out.headers().get(HOST).is_none());
        assert!(out.headers().get(CONTENT_LENGTH).is_none());
        assert_eq!(out.headers()["x-custom"], "kept");
        assert_eq!(out.headers().get_all("accept").iter().count(), 2);
        assert_eq!(out.uri().authority().unwrap().as_str(), "backend:8000");
        assert_eq!(out.method(), Method::POST);
    }

    #[test]
    fn test_hop_by_hop_and_encoding_headers_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close, upgrade"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(TE, HeaderValue::from_static("trailers"));
        headers.insert(PROXY_AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        headers.insert("authorization", HeaderValue::from_static("Bearer t0k3n"));
        let uri: Uri = "/api/servers".parse().unwrap();
        let req = InboundRequest::from_parts(Method::GET, &uri, headers, None);

        let out = req.to_backend("http://backend:8000").unwrap();
        for name in ["connection", "keep-alive", "upgrade", "te", "proxy-authorization", "accept-encoding"] {
            assert!(out.headers().get(name).is_none(), "{name} was forwarded");
        }
        assert_eq!(out.headers()["authorization"], "Bearer t0k3n");
    }

    #[test]
    fn test_get_and_head_never_carry_body() {
        for method in [Method::GET, Method::HEAD] {
            let req = inbound(method.clone(), "/api/logs", Some("ignored"));
            assert!(req.body.is_none(), "{method} kept a body");
        }
        let post = inbound(Method::POST, "/api/logs", Some("kept"));
        assert_eq!(post.body.as_deref(), Some(&b"kept"[..]));
    }

    #[tokio::test]
    async fn test_capture_skips_body_for_get() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/servers")
            .body(Body::from("stray body"))
            .unwrap();
        let captured = InboundRequest::capture(request).await.unwrap();
        assert!(captured.body.is_none());
    }

    #[tokio::test]
    async fn test_capture_buffers_body_for_patch() {
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/api/servers/1")
            .body(Body::from("{\"name\":\"web\"}"))
            .unwrap();
        let captured = InboundRequest::capture(request).await.unwrap();
        assert_eq!(captured.body.as_deref(), Some(&b"{\"name\":\"web\"}"[..]));
    }

    #[test]
    fn test_invalid_candidate_is_invalid_target() {
        let req = inbound(Method::GET, "/api/logs", None);
        let err = req.to_backend("http://bad host").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
    }

    #[test]
    fn test_method_filter() {
        assert!(is_forwardable(&Method::PATCH));
        assert!(is_forwardable(&Method::HEAD));
        assert!(!is_forwardable(&Method::OPTIONS));
        assert!(!is_forwardable(&Method::TRACE));
    }
}
