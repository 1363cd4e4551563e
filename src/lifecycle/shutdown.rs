//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;

/// Tells every running `HttpServer` to stop accepting and start draining.
///
/// Clones share one channel, so any handle can stop the gateway.
#[derive(Debug, Clone)]
pub struct Shutdown {
    stop: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (stop, _) = broadcast::channel(1);
        Self { stop }
    }

    /// Receiver handed to `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.stop.subscribe()
    }

    /// Start draining. Returns how many servers were told to stop.
    pub fn trigger(&self) -> usize {
        let notified = self.stop.send(()).unwrap_or(0);
        tracing::debug!(servers = notified, "Shutdown triggered");
        notified
    }

    /// Number of tasks still listening for the signal.
    pub fn receiver_count(&self) -> usize {
        self.stop.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
