//! Gateway configuration resolved from settings.

use std::time::Duration;

use farmmate_relay::RelayConfig;
use farmmate_settings::{BackendSettings, ServerSettings};

/// Runtime configuration for [`crate::server::FarmmateServer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Browser origins allowed by CORS and on WebSocket upgrades.
    pub allowed_origins: Vec<String>,
    /// Interval between server pings.
    pub heartbeat_interval: Duration,
    /// Disconnect a client silent for longer than this.
    pub pong_timeout: Duration,
    /// Outbound events buffered per client.
    pub send_queue: usize,
    /// Largest accepted client frame in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            allowed_origins: Vec::new(),
            heartbeat_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(60),
            send_queue: 256,
            max_message_size: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Build from the `server` settings section.
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            allowed_origins: settings.allowed_origins.clone(),
            heartbeat_interval: settings.heartbeat_interval(),
            pong_timeout: settings.pong_timeout(),
            send_queue: settings.send_queue,
            max_message_size: settings.max_message_bytes,
        }
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether a browser `Origin` may open a client socket.
    ///
    /// Requests without an `Origin` (non-browser clients) are always allowed.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        origin.is_none_or(|o| self.allowed_origins.iter().any(|allowed| allowed == o))
    }
}

/// Relay settings from the `backend` settings section.
pub fn relay_config(settings: &BackendSettings) -> RelayConfig {
    RelayConfig {
        backend_url: settings.url.clone(),
        connect_timeout: settings.connect_timeout(),
        outbound_queue: settings.queue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmmate_settings::FarmmateSettings;

    #[test]
    fn default_binds_loopback_auto_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:0");
    }

    #[test]
    fn from_default_settings() {
        let settings = FarmmateSettings::default();
        let cfg = ServerConfig::from_settings(&settings.server);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(cfg.pong_timeout, Duration::from_secs(60));
        assert_eq!(cfg.max_message_size, 1_048_576);
        assert_eq!(
            cfg.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:3001"]
        );
    }

    #[test]
    fn relay_config_from_backend_settings() {
        let settings = FarmmateSettings::default();
        let relay = relay_config(&settings.backend);
        assert_eq!(relay.backend_url, "ws://agent-python:8000");
        assert_eq!(relay.connect_timeout, Duration::from_secs(10));
        assert_eq!(relay.outbound_queue, 64);
    }

    #[test]
    fn origin_check() {
        let cfg = ServerConfig {
            allowed_origins: vec!["http://localhost:3000".into()],
            ..ServerConfig::default()
        };
        assert!(cfg.origin_allowed(None));
        assert!(cfg.origin_allowed(Some("http://localhost:3000")));
        assert!(!cfg.origin_allowed(Some("https://evil.example")));
    }
}
