//! Backend worker transport.
//!
//! A [`BackendDialer`] opens one [`BackendChannel`] per session. The registry
//! wraps each open channel in a [`BackendLink`] that owns the send side and
//! the lifecycle state; the receive side goes to the session's reader task.

mod websocket;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{RelayError, Result};

pub use websocket::WsDialer;

/// Frames arriving from the backend, or the transport error that ended them.
pub type InboundFrames = mpsc::Receiver<Result<String>>;

/// Raw duplex channel to the backend for one session.
pub struct BackendChannel {
    /// Text frames to send.
    pub outbound: mpsc::Sender<String>,
    /// Text frames received, in delivery order.
    pub inbound: InboundFrames,
    /// Cancelling this tears the transport down.
    pub shutdown: CancellationToken,
}

/// Opens backend channels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendDialer: Send + Sync {
    /// Connect a channel for `session_id`.
    async fn dial(&self, session_id: &str) -> Result<BackendChannel>;
}

/// Lifecycle state of a backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Dial in flight.
    Connecting,
    /// Usable.
    Open,
    /// Closed deliberately or by the backend.
    Closed,
    /// Ended by a transport error.
    Errored,
}

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// Handle over an open backend channel, bound to exactly one session.
pub struct BackendLink {
    id: u64,
    session_id: String,
    state: Mutex<LinkState>,
    outbound: mpsc::Sender<String>,
    awaiting: AtomicUsize,
    shutdown: CancellationToken,
}

impl BackendLink {
    /// Wrap the send side of a channel.
    pub fn new(
        session_id: impl Into<String>,
        outbound: mpsc::Sender<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id: NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed),
            session_id: session_id.into(),
            state: Mutex::new(LinkState::Open),
            outbound,
            awaiting: AtomicUsize::new(0),
            shutdown,
        }
    }

    /// Process-unique link id; identity for conditional eviction.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Session this link serves.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current state.
    pub fn state(&self) -> LinkState {
        *self.state.lock()
    }

    /// Whether queries can be sent.
    pub fn is_open(&self) -> bool {
        self.state() == LinkState::Open && !self.shutdown.is_cancelled()
    }

    /// Queue a query frame without waiting for the backend.
    ///
    /// The query counts as awaiting a reply until [`settle`](Self::settle).
    pub fn send(&self, frame: String) -> Result<()> {
        if !self.is_open() {
            return Err(RelayError::server("backend link is not open"));
        }
        // Counted before queueing so a fast reply cannot settle ahead of it.
        let _ = self.awaiting.fetch_add(1, Ordering::AcqRel);
        self.outbound.try_send(frame).map_err(|e| {
            self.settle();
            RelayError::server(format!("backend send failed: {e}"))
        })
    }

    /// Record that the oldest awaiting query got its reply or error.
    pub fn settle(&self) {
        let _ = self
            .awaiting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Queries sent on this link that have not been answered yet.
    pub fn awaiting_replies(&self) -> usize {
        self.awaiting.load(Ordering::Acquire)
    }

    /// Close the link. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.finish(LinkState::Closed)
    }

    /// Mark the link as ended by a transport error.
    pub fn fail(&self) -> bool {
        self.finish(LinkState::Errored)
    }

    fn finish(&self, to: LinkState) -> bool {
        {
            let mut state = self.state.lock();
            if *state != LinkState::Open {
                return false;
            }
            *state = to;
        }
        debug!(link_id = self.id, session_id = %self.session_id, state = ?to, "backend link finished");
        self.shutdown.cancel();
        true
    }

    /// Resolves once the link has been closed or failed.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await;
    }
}

impl std::fmt::Debug for BackendLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendLink")
            .field("id", &self.id)
            .field("session_id", &self.session_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(capacity: usize) -> (BackendLink, mpsc::Receiver<String>, CancellationToken) {
        let (tx, rx) = mpsc::channel(capacity);
        let token = CancellationToken::new();
        (BackendLink::new("s1", tx, token.clone()), rx, token)
    }

    #[test]
    fn ids_are_unique() {
        let (a, _ra, _ta) = link(1);
        let (b, _rb, _tb) = link(1);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn send_queues_frame() {
        let (link, mut rx, _token) = link(4);
        link.send("hello".into()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[test]
    fn sent_queries_await_until_settled() {
        let (link, _rx, _token) = link(4);
        link.send("one".into()).unwrap();
        link.send("two".into()).unwrap();
        assert_eq!(link.awaiting_replies(), 2);
        link.settle();
        assert_eq!(link.awaiting_replies(), 1);
        link.settle();
        link.settle();
        assert_eq!(link.awaiting_replies(), 0);
    }

    #[test]
    fn send_on_full_queue_fails() {
        let (link, _rx, _token) = link(1);
        link.send("one".into()).unwrap();
        let err = link.send("two".into()).unwrap_err();
        assert_eq!(err.error_key(), "serverError");
        assert_eq!(link.awaiting_replies(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let (link, _rx, token) = link(1);
        assert!(link.close());
        assert!(!link.close());
        assert!(!link.fail());
        assert_eq!(link.state(), LinkState::Closed);
        assert!(token.is_cancelled());
    }

    #[test]
    fn send_after_close_fails() {
        let (link, _rx, _token) = link(4);
        let _ = link.close();
        assert!(link.send("late".into()).is_err());
    }

    #[test]
    fn fail_marks_errored() {
        let (link, _rx, _token) = link(1);
        assert!(link.fail());
        assert_eq!(link.state(), LinkState::Errored);
        assert!(!link.is_open());
    }

    #[test]
    fn external_cancel_makes_link_unusable() {
        let (link, _rx, token) = link(1);
        token.cancel();
        assert!(!link.is_open());
    }

    #[tokio::test]
    async fn closed_resolves_after_close() {
        let (link, _rx, _token) = link(1);
        let _ = link.close();
        tokio::time::timeout(std::time::Duration::from_secs(1), link.closed())
            .await
            .unwrap();
    }
}
