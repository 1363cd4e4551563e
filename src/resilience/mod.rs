//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → failover.rs (pick next candidate in priority order)
//!     → timeouts.rs (enforce per-attempt deadline)
//!     → On connection failure or timeout: failover.rs records it, next candidate
//!     → On any HTTP response: stop, hand off to response shaping
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend attempt has a deadline
//! - Failover never runs candidates in parallel
//! - Backend error statuses are results, not failures

pub mod failover;
pub mod timeouts;

pub use failover::{Attempt, Failover};
pub use timeouts::{Deadline, TimedOut};
