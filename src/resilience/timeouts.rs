//! Timeout enforcement.
//!
//! # Responsibilities
//! - Give each backend attempt a fixed deadline from the moment it starts
//! - Cancel the wrapped future cleanly once the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - One deadline covers connect + response headers; buffered routes reuse it
//!   for the body so a slow body cannot outlive the attempt budget
//! - Timeout errors are distinct from connection errors

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// The deadline for a wrapped future passed before it completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// A fixed point in time by which an attempt must finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start a deadline that expires `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// The total duration this deadline was started with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Drive `fut` to completion unless the deadline passes first, in which
    /// case `fut` is dropped.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, TimedOut> {
        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| TimedOut(self.budget))
    }
}
