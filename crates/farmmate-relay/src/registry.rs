//! Session registry: session id → backend link.
//!
//! The map is the single source of truth for "is this session wired to a
//! live backend connection". It is guarded by one short-held lock that is
//! never held across an await. Every mutation names the attempt or link it
//! expects to replace, so a late event from an old connection cannot clobber
//! a newer one.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::{BackendDialer, BackendLink, LinkState};
use crate::error::Result;
use crate::i18n::Localizer;
use crate::session::Session;

/// Outcome of one connection attempt, shared by every caller that joined it.
pub(crate) type AttemptOutcome = Shared<BoxFuture<'static, Result<Arc<BackendLink>>>>;

pub(crate) enum Slot {
    Connecting {
        attempt: u64,
        outcome: AttemptOutcome,
    },
    Open(Arc<BackendLink>),
}

pub(crate) struct Entry {
    pub(crate) session: Arc<Session>,
    pub(crate) slot: Option<Slot>,
}

pub(crate) struct RegistryInner {
    pub(crate) entries: Mutex<HashMap<String, Entry>>,
    pub(crate) dialer: Arc<dyn BackendDialer>,
    pub(crate) localizer: Arc<dyn Localizer>,
    pub(crate) connect_timeout: Duration,
    pub(crate) next_attempt: AtomicU64,
}

/// Connection counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    /// Registered sessions.
    pub sessions: usize,
    /// Sessions with a usable backend link.
    pub open_links: usize,
    /// Connection attempts in flight.
    pub connecting: usize,
}

/// Shared session → backend-link map. Cheap to clone.
#[derive(Clone)]
pub struct SessionRegistry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(
        dialer: Arc<dyn BackendDialer>,
        localizer: Arc<dyn Localizer>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                dialer,
                localizer,
                connect_timeout,
                next_attempt: AtomicU64::new(1),
            }),
        }
    }

    /// Bound on a single connection attempt.
    pub fn connect_timeout(&self) -> Duration {
        self.inner.connect_timeout
    }

    pub(crate) fn localizer(&self) -> Arc<dyn Localizer> {
        Arc::clone(&self.inner.localizer)
    }

    pub(crate) fn next_attempt_id(&self) -> u64 {
        self.inner.next_attempt.fetch_add(1, Ordering::Relaxed)
    }

    /// Registered session, if any.
    pub fn session(&self, session_id: &str) -> Option<Arc<Session>> {
        self.inner
            .entries
            .lock()
            .get(session_id)
            .map(|e| Arc::clone(&e.session))
    }

    /// Link state of a session; `None` when unregistered or not wired.
    pub fn state(&self, session_id: &str) -> Option<LinkState> {
        match self.inner.entries.lock().get(session_id)?.slot.as_ref()? {
            Slot::Connecting { .. } => Some(LinkState::Connecting),
            Slot::Open(link) => Some(link.state()),
        }
    }

    /// Current counts.
    pub fn stats(&self) -> RegistryStats {
        let entries = self.inner.entries.lock();
        let mut stats = RegistryStats {
            sessions: entries.len(),
            ..RegistryStats::default()
        };
        for entry in entries.values() {
            match &entry.slot {
                Some(Slot::Open(link)) if link.is_open() => stats.open_links += 1,
                Some(Slot::Connecting { .. }) => stats.connecting += 1,
                _ => {}
            }
        }
        stats
    }

    /// Remove the session only if `link_id` is still its registered link.
    ///
    /// Called when a link ends; a link replaced by a newer one is a no-op.
    pub(crate) fn evict_if_current(&self, session_id: &str, link_id: u64) -> bool {
        let mut entries = self.inner.entries.lock();
        let is_current = matches!(
            entries.get(session_id).and_then(|e| e.slot.as_ref()),
            Some(Slot::Open(link)) if link.id() == link_id
        );
        if is_current {
            let _ = entries.remove(session_id);
            debug!(session_id, link_id, "evicted session after link closed");
        }
        is_current
    }

    /// Remove a session and close its backend link.
    ///
    /// Returns `true` if this call closed a link. Repeating it is a no-op. An
    /// attempt still in flight is orphaned and its late success is closed.
    pub fn disconnect(&self, session_id: &str) -> bool {
        let removed = self.inner.entries.lock().remove(session_id);
        let Some(entry) = removed else {
            return false;
        };
        let closed = close_slot(entry.slot);
        info!(session_id, closed, "session disconnected");
        closed
    }

    /// Disconnect every session currently delivering to `client_id`.
    ///
    /// Returns the number of sessions removed.
    pub fn disconnect_client(&self, client_id: &str) -> usize {
        let removed: Vec<(String, Entry)> = {
            let mut entries = self.inner.entries.lock();
            let owned: Vec<String> = entries
                .iter()
                .filter(|(_, e)| e.session.is_owned_by(client_id))
                .map(|(id, _)| id.clone())
                .collect();
            owned
                .into_iter()
                .filter_map(|id| entries.remove(&id).map(|e| (id, e)))
                .collect()
        };

        let count = removed.len();
        for (session_id, entry) in removed {
            let closed = close_slot(entry.slot);
            debug!(client_id, session_id, closed, "closed session of departing client");
        }
        if count > 0 {
            info!(client_id, sessions = count, "client sessions disconnected");
        }
        count
    }

    /// Remove every session and close every link. Returns links closed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Entry> = self.inner.entries.lock().drain().map(|(_, e)| e).collect();
        let closed = drained
            .into_iter()
            .map(|e| close_slot(e.slot))
            .filter(|closed| *closed)
            .count();
        info!(closed, "closed all backend links");
        closed
    }
}

fn close_slot(slot: Option<Slot>) -> bool {
    match slot {
        Some(Slot::Open(link)) => link.close(),
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
