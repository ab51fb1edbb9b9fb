//! Prometheus metrics recorder and `/metrics` rendering.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::error::{Result, ServerError};

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Call once at startup before
/// any metrics are recorded.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

/// Client sockets opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Client sockets closed (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Open client sockets (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Client socket lifetime seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Client frames that could not be parsed (counter).
pub const WS_MALFORMED_FRAMES_TOTAL: &str = "ws_malformed_frames_total";
/// Clients dropped for missing pongs (counter).
pub const WS_HEARTBEAT_TIMEOUTS_TOTAL: &str = "ws_heartbeat_timeouts_total";
/// Outbound client events dropped on a full queue (counter).
pub const WS_SEND_DROPS_TOTAL: &str = "ws_send_drops_total";
