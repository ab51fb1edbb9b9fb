//! Backend envelope decoding.
//!
//! The backend protocol is loosely typed: every message is a JSON object with
//! a `type` discriminator, but any message may also carry a top-level
//! `message` that is meant for the user. Decoding classifies each frame into
//! exactly one [`BackendEnvelope`] variant.

use serde_json::{Map, Value};

use crate::error::{RelayError, Result};

/// Processing stage reported by a `status_update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// `analyzing_query`
    AnalyzingQuery,
    /// `generating_response`
    GeneratingResponse,
    /// Any other stage name.
    Other(String),
}

impl Stage {
    fn parse(raw: &str) -> Self {
        match raw {
            "analyzing_query" => Self::AnalyzingQuery,
            "generating_response" => Self::GeneratingResponse,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// One decoded backend message.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEnvelope {
    /// Welcome frame sent right after the backend accepts the socket.
    ConnectionEstablished,
    /// The backend accepted a query.
    MessageReceived,
    /// Intermediate progress.
    StatusUpdate {
        /// Reported stage, if any.
        stage: Option<Stage>,
    },
    /// Final structured answer.
    AgriculturalResponse {
        /// Backend success flag.
        success: bool,
        /// Structured payload (`null` is treated as absent).
        data: Option<Value>,
        /// Human-readable summary sent alongside the payload.
        message: Option<String>,
    },
    /// Any other frame carrying a top-level `message`.
    Generic {
        /// User-facing text.
        message: String,
        /// `false` only when the backend said `success: false`.
        success: bool,
    },
    /// Frame with nothing the relay can act on.
    Unrecognized {
        /// Raw `type` discriminator, if any.
        kind: Option<String>,
    },
}

impl BackendEnvelope {
    /// Decode a text frame.
    ///
    /// Fails with [`RelayError::Response`] when the frame is not a JSON object.
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RelayError::response(format!("invalid JSON: {e}")))?;
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(RelayError::response(format!(
                "expected JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Self {
        let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
        let message = match map.remove("message") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        };

        match kind.as_deref() {
            Some("connection_established") => Self::ConnectionEstablished,
            Some("message_received") => Self::MessageReceived,
            Some("status_update") => {
                let stage = map
                    .get("details")
                    .and_then(|d| d.get("stage"))
                    .or_else(|| map.get("stage"))
                    .and_then(Value::as_str)
                    .map(Stage::parse);
                Self::StatusUpdate { stage }
            }
            Some("agricultural_response") => {
                let success = map.get("success").and_then(Value::as_bool).unwrap_or(false);
                let data = map.remove("data").filter(|d| !d.is_null());
                Self::AgriculturalResponse {
                    success,
                    data,
                    message,
                }
            }
            _ => match message {
                Some(message) => {
                    let success = map.get("success").and_then(Value::as_bool) != Some(false);
                    Self::Generic { message, success }
                }
                None => Self::Unrecognized { kind },
            },
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "connection_established",
            Self::MessageReceived => "message_received",
            Self::StatusUpdate { .. } => "status_update",
            Self::AgriculturalResponse { .. } => "agricultural_response",
            Self::Generic { .. } => "generic",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
