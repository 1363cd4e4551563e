//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (BACKEND_API_URL, NEXT_PUBLIC_BACKEND_API_URL)
//!     → command-line overrides
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared by value with the HTTP server at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; backend candidates never change while running
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::BackendConfig;
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::StreamingConfig;
pub use schema::TimeoutConfig;
