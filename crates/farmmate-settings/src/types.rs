//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a partial
//! JSON file only needs the fields it changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root settings for the gateway.
///
/// ```json
/// {
///   "server": { "port": 5050, "allowedOrigins": ["https://farmmate.app"] },
///   "backend": { "url": "ws://127.0.0.1:8000" },
///   "logging": { "json": true }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FarmmateSettings {
    /// Client-facing listener.
    pub server: ServerSettings,
    /// Python advice worker.
    pub backend: BackendSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Client-facing HTTP and WebSocket listener.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
    /// Interval between server pings.
    pub heartbeat_interval_ms: u64,
    /// Disconnect a client silent for this long.
    pub pong_timeout_ms: u64,
    /// Outbound events buffered per client before dropping.
    pub send_queue: usize,
    /// Largest accepted client frame.
    pub max_message_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
            heartbeat_interval_ms: 30_000,
            pong_timeout_ms: 60_000,
            send_queue: 256,
            max_message_bytes: 1024 * 1024,
        }
    }
}

impl ServerSettings {
    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ping interval as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Pong timeout as a [`Duration`].
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }
}

/// Connection to the advice worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendSettings {
    /// Worker root; sessions connect to `{url}/ws/{session_id}`.
    pub url: String,
    /// Bound on establishing one backend connection.
    pub connect_timeout_ms: u64,
    /// Frames buffered per direction on each backend link.
    pub queue: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: "ws://agent-python:8000".to_string(),
            connect_timeout_ms: 10_000,
            queue: 64,
        }
    }
}

impl BackendSettings {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}
