//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body limit, tracing)
//!     → request.rs (capture method/path/headers/body, strip Host)
//!     → forward.rs (candidate failover + per-attempt deadline)
//!     → response.rs (event stream / text / JSON shaping)
//!     → Send to client
//!
//! Any failure:
//!     → error.rs (ProxyError → uniform JSON error response)
//! ```

pub mod error;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use forward::Forwarder;
pub use request::InboundRequest;
pub use response::ResponseShape;
pub use server::HttpServer;
