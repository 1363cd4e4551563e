//! Deployment dashboard API gateway.
//!
//! Sits between the dashboard in the browser and the deployment backend,
//! forwarding every request to the first backend candidate that answers.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  DEPLOY GATEWAY                  │
//!   Browser request     │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!   ────────────────────┼─▶│  http   │───▶│ routing  │───▶│  resolver  │   │
//!                       │  │ server  │    │ (stream?)│    │ candidates │   │
//!                       │  └─────────┘    └──────────┘    └─────┬──────┘   │
//!                       │                                       ▼          │
//!                       │                 ┌──────────────────────────────┐ │
//!                       │                 │ forward: failover + deadline │─┼──▶ Backend A
//!                       │                 │      (one candidate at a     │─┼──▶ Backend B
//!                       │                 │       time, in order)        │ │
//!                       │                 └─────────────┬────────────────┘ │
//!   Browser response    │  ┌───────────────────────┐    │                  │
//!   ◀───────────────────┼──│ response shaping      │◀───┘                  │
//!                       │  │ stream / text / JSON  │                       │
//!                       │  └───────────────────────┘                       │
//!                       │  config · observability · resilience · lifecycle │
//!                       └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod resolver;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
