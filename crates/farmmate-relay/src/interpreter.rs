//! Per-connection progress state machine.
//!
//! ```text
//! PENDING ─message_received─▶ RECEIVED ─analyzing─▶ ANALYZING ─generating─▶ GENERATING
//!    │                                                                          │
//!    └──────────────── response / generic message ──────────────────────────────┴─▶ FINALIZED
//!                      undecodable payload ──────────────────────────────────────▶ ERROR
//! ```
//!
//! Status events are one-shot and never buffered. Once terminal, status
//! updates are dropped until the next `message_received` opens a new query.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use metrics::counter;
use tracing::{debug, warn};

use crate::advice::AdvicePayload;
use crate::envelope::{BackendEnvelope, Stage};
use crate::error::RelayError;
use crate::formatter::ResponseFormatter;
use crate::i18n::{Language, Localizer};
use crate::metrics::BACKEND_ENVELOPES_TOTAL;
use crate::protocol::{AiResponse, ClientEvent, StatusKind};

/// Progress of the query currently in flight on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Query sent, nothing heard yet.
    Pending,
    /// Backend acknowledged the query.
    Received,
    /// Backend is analyzing.
    Analyzing,
    /// Backend is generating the answer.
    Generating,
    /// Reply delivered.
    Finalized,
    /// Reply could not be decoded.
    Error,
}

impl QueryState {
    /// Whether no further status updates belong to this query.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Error)
    }
}

/// Turns backend frames into client events.
pub struct ResponseInterpreter {
    state: QueryState,
    localizer: Arc<dyn Localizer>,
    formatter: ResponseFormatter,
}

impl ResponseInterpreter {
    /// Create an interpreter in [`QueryState::Pending`].
    pub fn new(localizer: Arc<dyn Localizer>) -> Self {
        Self {
            state: QueryState::Pending,
            formatter: ResponseFormatter::new(Arc::clone(&localizer)),
            localizer,
        }
    }

    /// Current state.
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Localizer used for status and error text.
    pub fn localizer(&self) -> &Arc<dyn Localizer> {
        &self.localizer
    }

    /// Decode and handle one text frame.
    pub fn on_frame(&mut self, text: &str, language: Language) -> Option<ClientEvent> {
        match BackendEnvelope::decode(text) {
            Ok(envelope) => self.on_envelope(envelope, language),
            Err(err) => Some(self.fail(&err, language)),
        }
    }

    /// Handle one decoded envelope.
    pub fn on_envelope(
        &mut self,
        envelope: BackendEnvelope,
        language: Language,
    ) -> Option<ClientEvent> {
        counter!(BACKEND_ENVELOPES_TOTAL, "kind" => envelope.kind()).increment(1);

        match envelope {
            BackendEnvelope::ConnectionEstablished => None,
            BackendEnvelope::MessageReceived => {
                self.state = QueryState::Received;
                Some(self.status("messageReceived", StatusKind::Received, language))
            }
            BackendEnvelope::StatusUpdate { stage } => {
                if self.state.is_terminal() {
                    debug!(state = ?self.state, "dropping status update after terminal state");
                    return None;
                }
                let key = match &stage {
                    Some(Stage::AnalyzingQuery) => {
                        self.state = QueryState::Analyzing;
                        "analyzingQuery"
                    }
                    Some(Stage::GeneratingResponse) => {
                        self.state = QueryState::Generating;
                        "generatingResponse"
                    }
                    Some(Stage::Other(name)) => {
                        debug!(stage = %name, "unrecognized stage");
                        "processing"
                    }
                    None => "processing",
                };
                Some(self.status(key, StatusKind::Processing, language))
            }
            BackendEnvelope::AgriculturalResponse {
                success: true,
                data: Some(data),
                ..
            } => Some(self.finalize_advice(data, language)),
            BackendEnvelope::AgriculturalResponse {
                success,
                message: Some(message),
                ..
            } => Some(self.finalize_generic(message, success)),
            BackendEnvelope::AgriculturalResponse { .. } => Some(self.fail(
                &RelayError::response("agricultural_response without data or message"),
                language,
            )),
            BackendEnvelope::Generic { message, success } => {
                Some(self.finalize_generic(message, success))
            }
            BackendEnvelope::Unrecognized { kind } => {
                debug!(kind = ?kind, "ignoring unrecognized backend message");
                None
            }
        }
    }

    /// Move to [`QueryState::Error`] and build the client error event.
    pub fn fail(&mut self, err: &RelayError, language: Language) -> ClientEvent {
        warn!(error = %err, "backend reply failed");
        self.state = QueryState::Error;
        ClientEvent::error(err.localized(self.localizer.as_ref(), language))
    }

    fn status(&self, key: &str, status: StatusKind, language: Language) -> ClientEvent {
        ClientEvent::AiStatus {
            message: self.localizer.status_message(key, language),
            status,
        }
    }

    fn finalize_advice(&mut self, data: serde_json::Value, language: Language) -> ClientEvent {
        match AdvicePayload::from_value(data) {
            Ok(payload) => {
                self.state = QueryState::Finalized;
                let reply = self.formatter.format(&payload, language);
                ClientEvent::AiResponse(reply.into_response())
            }
            Err(err) => self.fail(&err, language),
        }
    }

    fn finalize_generic(&mut self, message: String, success: bool) -> ClientEvent {
        self.state = QueryState::Finalized;
        ClientEvent::AiResponse(AiResponse {
            message,
            success,
            kind: None,
            language: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            comprehensive: None,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
