//! `/health` and `/api/status` bodies.

use std::time::Instant;

use farmmate_relay::{Language, RegistryStats};
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Connected client sockets.
    pub connections: usize,
    /// Registered relay sessions.
    pub sessions: usize,
    /// Open backend links.
    pub backend_links: usize,
}

/// Build a health response from live counters.
pub fn health_check(start_time: Instant, connections: usize, stats: RegistryStats) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
        sessions: stats.sessions,
        backend_links: stats.open_links,
    }
}

/// One supported language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageInfo {
    /// Tag accepted in `user_query.language`.
    pub code: &'static str,
    /// Name in its own script.
    pub name: &'static str,
}

/// Status response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Always `"running"`.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Backend worker root.
    pub backend_url: String,
    /// Connected client sockets.
    pub clients: usize,
    /// Events dropped on full client queues, across connected clients.
    pub dropped_events: u64,
    /// Relay registry counters.
    pub relay: RegistryStats,
    /// Languages clients may request.
    pub languages: Vec<LanguageInfo>,
}

/// Build a status response.
pub fn status_report(
    start_time: Instant,
    backend_url: &str,
    clients: usize,
    dropped_events: u64,
    relay: RegistryStats,
) -> StatusResponse {
    StatusResponse {
        status: "running".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        backend_url: backend_url.to_owned(),
        clients,
        dropped_events,
        relay,
        languages: Language::ALL
            .iter()
            .map(|l| LanguageInfo {
                code: l.as_str(),
                name: l.native_name(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(sessions: usize, open_links: usize) -> RegistryStats {
        RegistryStats {
            sessions,
            open_links,
            connecting: 0,
        }
    }

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0, stats(0, 0));
        assert_eq!(resp.status, "ok");
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn uptime_increases() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(60))
            .unwrap();
        assert!(health_check(start, 0, stats(0, 0)).uptime_secs >= 59);
    }

    #[test]
    fn health_serialization() {
        let json = serde_json::to_value(health_check(Instant::now(), 4, stats(3, 2))).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"], 4);
        assert_eq!(json["sessions"], 3);
        assert_eq!(json["backendLinks"], 2);
        assert!(json["uptimeSecs"].is_number());
    }

    #[test]
    fn status_lists_every_language() {
        let resp = status_report(Instant::now(), "ws://agent-python:8000", 1, 0, stats(1, 1));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["backendUrl"], "ws://agent-python:8000");
        assert_eq!(json["relay"]["openLinks"], 1);
        assert_eq!(json["droppedEvents"], 0);
        let codes: Vec<&str> = resp.languages.iter().map(|l| l.code).collect();
        assert_eq!(codes, ["en", "hi", "mr", "gu", "pa"]);
    }
}
