//! Relay sessions and the client sink they deliver to.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::i18n::Language;
use crate::protocol::ClientEvent;

/// Where a session's events are delivered.
///
/// Implemented by the gateway's per-client connection.
pub trait ClientSink: Send + Sync {
    /// Transport connection id of the client.
    fn client_id(&self) -> &str;

    /// Queue an event for the client. Returns `false` if it could not be queued.
    fn emit(&self, event: &ClientEvent) -> bool;
}

/// One conversational session.
///
/// The session id is the client's connection id unless the client supplied
/// its own user id. The active language and the sink follow the most recent
/// query, so a reconnecting client with the same user id takes the session
/// over.
pub struct Session {
    id: String,
    language: RwLock<Language>,
    sink: RwLock<Arc<dyn ClientSink>>,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Session {
    /// Create a session bound to `sink`.
    pub fn new(id: impl Into<String>, language: Language, sink: Arc<dyn ClientSink>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            language: RwLock::new(language),
            sink: RwLock::new(sink),
            created_at: now,
            last_activity: RwLock::new(now),
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Active language.
    pub fn language(&self) -> Language {
        *self.language.read()
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last query.
    pub fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read()
    }

    /// Record a new query: update the language, rebind the sink, bump activity.
    pub fn touch(&self, language: Language, sink: &Arc<dyn ClientSink>) {
        *self.language.write() = language;
        if !Arc::ptr_eq(&*self.sink.read(), sink) {
            *self.sink.write() = Arc::clone(sink);
        }
        *self.last_activity.write() = Utc::now();
    }

    /// Whether the session currently delivers to `client_id`.
    pub fn is_owned_by(&self, client_id: &str) -> bool {
        self.sink.read().client_id() == client_id
    }

    /// Deliver an event to the current sink.
    pub fn emit(&self, event: &ClientEvent) -> bool {
        let sink = Arc::clone(&*self.sink.read());
        sink.emit(event)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("language", &self.language())
            .field("client_id", &self.sink.read().client_id())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
