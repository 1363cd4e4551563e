//! Route classification.
//!
//! # Responsibilities
//! - Store the set of event-stream routes
//! - Classify an inbound path as streaming or standard
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Exact, case-sensitive path match; query string is not part of the path

use std::collections::HashSet;

use crate::config::StreamingConfig;

/// How a route's exchange with the backend is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Buffered exchange; the response body is read in full before replying.
    Standard,
    /// Half-duplex exchange; the response body is relayed as it arrives and
    /// may stay open indefinitely.
    EventStream,
}

impl RouteKind {
    pub fn is_streaming(self) -> bool {
        matches!(self, RouteKind::EventStream)
    }
}

/// Compiled route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    stream_paths: HashSet<String>,
}

impl RouteTable {
    pub fn new<I, S>(stream_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stream_paths: stream_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &StreamingConfig) -> Self {
        Self::new(config.paths.iter().cloned())
    }

    /// Classify a request path.
    pub fn classify(&self, path: &str) -> RouteKind {
        if self.stream_paths.contains(path) {
            RouteKind::EventStream
        } else {
            RouteKind::Standard
        }
    }
}
