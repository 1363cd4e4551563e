//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (route lookup)
//!     → Return: RouteKind::EventStream or RouteKind::Standard
//!
//! Route Compilation (at startup):
//!     StreamingConfig.paths
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Every path is forwarded; routing only decides how the exchange is carried
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same path always gets the same kind

pub mod router;

pub use router::{RouteKind, RouteTable};
