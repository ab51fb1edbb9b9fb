//! Client-facing event payloads and the outbound backend query.
//!
//! Client frames are `{"event": <name>, "data": {...}}`.

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Event name of an inbound client query.
pub const USER_QUERY_EVENT: &str = "user_query";

/// Progress class carried by an `ai_status` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// The backend acknowledged the query.
    Received,
    /// The backend is working on it.
    Processing,
}

/// Events emitted to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// First frame after the WebSocket upgrade.
    Connected {
        /// Transport connection id assigned by the gateway.
        #[serde(rename = "clientId")]
        client_id: String,
    },
    /// Transient progress notice.
    AiStatus {
        /// Localized status text.
        message: String,
        /// Progress class.
        status: StatusKind,
    },
    /// Terminal reply to a query.
    AiResponse(AiResponse),
    /// Localized failure notice.
    Error {
        /// Localized error text.
        message: String,
    },
}

impl ClientEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::AiStatus { .. } => "ai_status",
            Self::AiResponse(_) => "ai_response",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event answers a query, ending it.
    pub fn ends_query(&self) -> bool {
        matches!(self, Self::AiResponse(_) | Self::Error { .. })
    }

    /// Build an `error` event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Payload of an `ai_response` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    /// Display text.
    pub message: String,
    /// Whether the backend reported success.
    pub success: bool,
    /// Reply type (`agricultural_advice` for formatted payloads).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Language the reply was rendered in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Whether the comprehensive layout was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehensive: Option<bool>,
}

/// `data` of an inbound `user_query` frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    /// Free-text question.
    pub query: String,
    /// Explicit session id; defaults to the client connection id.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Requested language tag; defaults to `en`.
    #[serde(default)]
    pub language: Option<String>,
}

/// A query with its session id and language resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundQuery {
    /// Question text.
    pub raw_text: String,
    /// Validated language.
    pub language: Language,
    /// Session the query belongs to.
    pub session_id: String,
}

impl InboundQuery {
    /// Resolve defaults: a blank `userId` means the client connection id, an
    /// unsupported language means the default language.
    pub fn resolve(query: UserQuery, client_id: &str) -> Self {
        let session_id = query
            .user_id
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| client_id.to_owned());
        Self {
            raw_text: query.query,
            language: Language::resolve(query.language.as_deref()),
            session_id,
        }
    }

    /// Backend wire form.
    pub fn to_backend(&self) -> BackendQuery<'_> {
        BackendQuery {
            raw_query: &self.raw_text,
            language: self.language,
            user_id: &self.session_id,
        }
    }
}

/// JSON sent to the backend worker for one query.
#[derive(Debug, Serialize)]
pub struct BackendQuery<'a> {
    /// Question text.
    pub raw_query: &'a str,
    /// Language tag.
    pub language: Language,
    /// Session id.
    pub user_id: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_event_wire_shape() {
        let event = ClientEvent::AiStatus {
            message: "Processing...".into(),
            status: StatusKind::Processing,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({"event": "ai_status", "data": {"message": "Processing...", "status": "processing"}})
        );
    }

    #[test]
    fn connected_event_uses_camel_case_id() {
        let event = ClientEvent::Connected {
            client_id: "c-1".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "connected");
        assert_eq!(value["data"]["clientId"], "c-1");
    }

    #[test]
    fn response_event_omits_absent_fields() {
        let event = ClientEvent::AiResponse(AiResponse {
            message: "ok".into(),
            success: true,
            kind: None,
            language: None,
            timestamp: "2025-01-01T00:00:00Z".into(),
            comprehensive: None,
        });
        let value = serde_json::to_value(&event).unwrap();
        let data = value["data"].as_object().unwrap();
        assert!(!data.contains_key("type"));
        assert!(!data.contains_key("language"));
        assert!(!data.contains_key("comprehensive"));
    }

    #[test]
    fn response_event_renames_kind() {
        let event = ClientEvent::AiResponse(AiResponse {
            message: "ok".into(),
            success: true,
            kind: Some("agricultural_advice".into()),
            language: Some(Language::Hi),
            timestamp: "t".into(),
            comprehensive: Some(false),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"]["type"], "agricultural_advice");
        assert_eq!(value["data"]["language"], "hi");
    }

    #[test]
    fn event_names() {
        assert_eq!(ClientEvent::error("x").name(), "error");
        assert_eq!(
            ClientEvent::Connected {
                client_id: String::new()
            }
            .name(),
            "connected"
        );
    }

    #[test]
    fn user_query_defaults() {
        let q: UserQuery = serde_json::from_value(json!({"query": "hello"})).unwrap();
        let resolved = InboundQuery::resolve(q, "client-9");
        assert_eq!(resolved.session_id, "client-9");
        assert_eq!(resolved.language, Language::En);
        assert_eq!(resolved.raw_text, "hello");
    }

    #[test]
    fn explicit_user_id_and_language() {
        let q: UserQuery =
            serde_json::from_value(json!({"query": "q", "userId": "farmer-1", "language": "mr"}))
                .unwrap();
        let resolved = InboundQuery::resolve(q, "client-9");
        assert_eq!(resolved.session_id, "farmer-1");
        assert_eq!(resolved.language, Language::Mr);
    }

    #[test]
    fn blank_user_id_falls_back_to_client() {
        let q: UserQuery =
            serde_json::from_value(json!({"query": "q", "userId": "  ", "language": "xx"}))
                .unwrap();
        let resolved = InboundQuery::resolve(q, "client-9");
        assert_eq!(resolved.session_id, "client-9");
        assert_eq!(resolved.language, Language::En);
    }

    #[test]
    fn backend_query_wire_shape() {
        let query = InboundQuery {
            raw_text: "what crop for soil pH 7.2?".into(),
            language: Language::Hi,
            session_id: "s1".into(),
        };
        let value = serde_json::to_value(query.to_backend()).unwrap();
        assert_eq!(
            value,
            json!({"raw_query": "what crop for soil pH 7.2?", "language": "hi", "user_id": "s1"})
        );
    }
}
