//! Backend forwarding with ordered failover.
//!
//! # Responsibilities
//! - Try each backend candidate in priority order, one at a time
//! - Bound every attempt with the request deadline
//! - Stop at the first HTTP response, whatever its status
//! - Decompress gzip/deflate replies before shaping
//! - Hand the response to shaping

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tower::ServiceExt;
use tower_http::decompression::Decompression;

use crate::config::GatewayConfig;
use crate::http::error::ProxyError;
use crate::http::request::InboundRequest;
use crate::http::response::ResponseShape;
use crate::observability::metrics;
use crate::resilience::{Deadline, Failover};
use crate::resolver::BackendCandidates;
use crate::routing::{RouteKind, RouteTable};

/// Relays requests to the first backend candidate that answers.
#[derive(Clone)]
pub struct Forwarder {
    client: Decompression<Client<HttpConnector, Body>>,
    candidates: BackendCandidates,
    routes: Arc<RouteTable>,
    request_timeout: Duration,
}

impl Forwarder {
    pub fn new(candidates: BackendCandidates, routes: RouteTable, request_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);

        let client = Decompression::new(Client::builder(TokioExecutor::new()).build(connector));

        Self {
            client,
            candidates,
            routes: Arc::new(routes),
            request_timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            BackendCandidates::from_config(&config.backend),
            RouteTable::from_config(&config.streaming),
            config.timeouts.request_timeout(),
        )
    }

    pub fn candidates(&self) -> &BackendCandidates {
        &self.candidates
    }

    /// Relay `inbound` and shape the first backend response received.
    ///
    /// Connection failures and timeouts move on to the next candidate. Once a
    /// backend answers, its response is final.
    pub async fn forward(
        &self,
        inbound: &InboundRequest,
    ) -> Result<(Response<Body>, ResponseShape), ProxyError> {
        let route = self.routes.classify(inbound.path());
        let mut failover = Failover::new(&self.candidates);

        while let Some(attempt) = failover.next_attempt() {
            let candidate = attempt.candidate;
            let request = match inbound.to_backend(candidate) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(candidate = %candidate, error = %e, "Skipping candidate");
                    failover.record(e);
                    continue;
                }
            };

            let deadline = Deadline::after(self.request_timeout);
            tracing::debug!(
                attempt = attempt.number,
                candidate = %candidate,
                method = %inbound.method(),
                target = %inbound.target(candidate),
                timeout_secs = deadline.budget().as_secs(),
                streaming = route.is_streaming(),
                "Forwarding to backend"
            );

            let error = match deadline.run(self.client.clone().oneshot(request)).await {
                Ok(Ok(upstream)) => {
                    let shape = ResponseShape::select(route, upstream.headers());
                    tracing::debug!(
                        attempt = attempt.number,
                        candidate = %candidate,
                        status = %upstream.status(),
                        shape = shape.as_str(),
                        "Backend responded"
                    );

                    // Event streams stay open indefinitely; only the headers
                    // were bounded by the deadline.
                    let body_deadline = match route {
                        RouteKind::Standard => Some(deadline),
                        RouteKind::EventStream => None,
                    };
                    let response = shape.apply(upstream, candidate, body_deadline).await?;
                    return Ok((response, shape));
                }
                Ok(Err(source)) => ProxyError::Connect {
                    candidate: candidate.to_string(),
                    source,
                },
                Err(timed_out) => ProxyError::Timeout {
                    candidate: candidate.to_string(),
                    timeout: timed_out.0,
                },
            };

            if !error.is_connection_level() {
                return Err(error);
            }
            tracing::warn!(
                attempt = attempt.number,
                candidate = %candidate,
                error = %error,
                "Backend attempt failed"
            );
            metrics::record_failover(candidate);
            failover.record(error);
        }

        if failover.attempts_made() > 0 {
            metrics::record_exhausted();
        }
        Err(failover.exhausted())
    }
}
