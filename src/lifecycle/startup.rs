//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order from a validated config
//! - Start the metrics endpoint
//! - Bind the listener and begin accepting traffic
//! - Drive shutdown with a bounded drain
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)
//! - Open event streams never end on their own, so draining is time-boxed

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// How long in-flight requests get to finish after a shutdown signal.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        stream_paths = ?config.streaming.paths,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            return flatten(result);
        }
        _ = signals::wait_for_signal() => {
            let notified = shutdown.trigger();
            tracing::info!(
                servers = notified,
                drain_secs = DRAIN_TIMEOUT.as_secs(),
                "Draining in-flight requests"
            );
        }
    }

    match tokio::time::timeout(DRAIN_TIMEOUT, &mut server_task).await {
        Ok(result) => flatten(result),
        Err(_) => {
            tracing::warn!(
                timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "Drain timeout elapsed, closing remaining connections"
            );
            server_task.abort();
            Ok(())
        }
    }
}

fn flatten(
    result: Result<Result<(), std::io::Error>, tokio::task::JoinError>,
) -> Result<(), StartupError> {
    match result {
        Ok(inner) => inner.map_err(StartupError::Serve),
        Err(e) => Err(StartupError::Serve(std::io::Error::other(e))),
    }
}
