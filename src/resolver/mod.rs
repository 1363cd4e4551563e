//! Backend resolution subsystem.
//!
//! # Data Flow
//! ```text
//! BackendConfig (explicit url + fallback_urls)
//!     → candidates.rs (normalize, drop blanks, de-duplicate)
//!     → BackendCandidates (ordered, immutable)
//!     → consumed by the forwarder as the failover order
//! ```
//!
//! # Design Decisions
//! - Resolved once at startup; order is fixed for the process lifetime
//! - Pure function of injected config, no ambient globals
//! - An empty result is legal; the forwarder answers 502 without dialing

pub mod candidates;

pub use candidates::BackendCandidates;
