//! # farmmate-server
//!
//! Axum HTTP + `WebSocket` gateway in front of the relay.
//!
//! - `/ws`: client sockets carrying `{event, data}` frames, with heartbeat
//! - `/health`, `/api/status`: connection counts and backend details
//! - `/metrics`: Prometheus exposition
//! - CORS restricted to configured origins
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod telemetry;
pub mod websocket;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use server::{AppState, FarmmateServer};
