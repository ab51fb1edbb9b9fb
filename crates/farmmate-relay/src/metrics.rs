//! Metric names recorded by the relay core.
//!
//! The recorder itself is installed by the embedding server.

/// Backend dial attempts started (counter).
pub const BACKEND_DIALS_TOTAL: &str = "backend_dials_total";
/// Backend dial failures (counter, labels: reason).
pub const BACKEND_DIAL_FAILURES_TOTAL: &str = "backend_dial_failures_total";
/// Backend dial duration seconds, successful dials only (histogram).
pub const BACKEND_DIAL_DURATION_SECONDS: &str = "backend_dial_duration_seconds";
/// Live backend links (gauge).
pub const BACKEND_LINKS_ACTIVE: &str = "backend_links_active";
/// Backend envelopes decoded (counter, labels: kind).
pub const BACKEND_ENVELOPES_TOTAL: &str = "backend_envelopes_total";
/// Queries forwarded to the backend (counter).
pub const QUERIES_TOTAL: &str = "relay_queries_total";
/// Error events emitted to clients (counter).
pub const CLIENT_ERRORS_TOTAL: &str = "relay_client_errors_total";
