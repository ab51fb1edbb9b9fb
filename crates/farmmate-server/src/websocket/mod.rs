//! Client WebSocket handling: connection state, frame parsing, session loop.

pub mod clients;
pub mod connection;
pub mod handler;
pub mod session;
