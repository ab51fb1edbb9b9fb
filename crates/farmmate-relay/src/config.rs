//! Relay configuration.

use std::time::Duration;

/// Default backend worker root.
pub const DEFAULT_BACKEND_URL: &str = "ws://agent-python:8000";
/// Default bound on establishing a backend connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default per-link frame queue depth.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 64;

/// Settings the relay core needs, injected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Backend worker root URL; sessions connect to `{backend_url}/ws/{id}`.
    pub backend_url: String,
    /// Bound on one connection attempt.
    pub connect_timeout: Duration,
    /// Frames buffered per direction on each backend link.
    pub outbound_queue: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
        }
    }
}
