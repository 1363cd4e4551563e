//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all forwarding handler
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener
//! - Forward requests through the failover forwarder
//! - Observability (metrics, request IDs)

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    response::IntoResponse,
    routing::any,
    Router,
};
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::request::{is_forwardable, InboundRequest};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let forwarder = Forwarder::from_config(&config);

        if forwarder.candidates().is_empty() {
            tracing::warn!("No backend candidates configured; every request will fail with 502");
        } else {
            let candidates: Vec<&str> = forwarder.candidates().iter().collect();
            tracing::info!(candidates = ?candidates, "Backend candidates resolved");
        }

        let state = AppState { forwarder };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size)),
            )
    }

    /// The router, for driving the server without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Captures the request, forwards it, and records the outcome.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let method = request.method().clone();
    let method_str = method.to_string();
    let path = request.uri().path().to_string();

    if !is_forwardable(&method) {
        tracing::debug!(method = %method, path = %path, "Rejecting unsupported method");
        let err = ProxyError::MethodNotAllowed(method);
        metrics::record_request(&method_str, err.status_code().as_u16(), "error", start_time);
        return err.into_response();
    }

    let inbound = match InboundRequest::capture(request).await {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!(method = %method, path = %path, error = %e, "Failed to read request");
            metrics::record_request(&method_str, e.status_code().as_u16(), "error", start_time);
            return e.into_response();
        }
    };

    match state.forwarder.forward(&inbound).await {
        Ok((response, shape)) => {
            metrics::record_request(&method_str, response.status().as_u16(), shape.as_str(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "API Proxy Error");
            metrics::record_request(&method_str, e.status_code().as_u16(), "error", start_time);
            e.into_response()
        }
    }
}
