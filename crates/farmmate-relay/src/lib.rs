//! # farmmate-relay
//!
//! Session relay core between front-end chat clients and the shared
//! agricultural backend worker.
//!
//! - [`registry`]: session id → backend connection map, single-flight
//!   establishment under a timeout, identity-checked eviction
//! - [`envelope`]: tagged decoding of the backend's JSON messages
//! - [`interpreter`]: per-query progress state machine
//! - [`formatter`]: localized multi-section reply rendering
//! - [`i18n`]: status / label / error catalog with default-language fallback
//! - [`service`]: [`RelayService`], the facade the gateway drives
//!
//! ## Data Flow
//!
//! client query → [`SessionRegistry::get_or_create`] → backend send →
//! reader task → [`ResponseInterpreter`] → [`ClientSink`] of the session.

#![deny(unsafe_code)]

pub mod advice;
pub mod backend;
pub mod config;
pub mod envelope;
pub mod error;
pub mod formatter;
pub mod i18n;
pub mod interpreter;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod session;

mod establish;
mod reader;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BackendChannel, BackendDialer, BackendLink, LinkState, WsDialer};
pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use formatter::{FormattedReply, ResponseFormatter};
pub use i18n::{Catalog, Category, Language, Localizer};
pub use interpreter::{QueryState, ResponseInterpreter};
pub use protocol::{AiResponse, ClientEvent, InboundQuery, StatusKind, UserQuery};
pub use registry::{RegistryStats, SessionRegistry};
pub use service::RelayService;
pub use session::{ClientSink, Session};
