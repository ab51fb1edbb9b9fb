//! Ordered gateway teardown.
//!
//! Triggering shutdown cancels the shared token, which stops the listener and
//! ends every client session, and then closes every backend link still in the
//! relay's registry so no worker socket outlives the gateway. [`drain`] also
//! waits a bounded time for the serve task and any other tracked tasks.
//!
//! [`drain`]: ShutdownCoordinator::drain

use std::sync::Arc;
use std::time::Duration;

use farmmate_relay::RelayService;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long [`ShutdownCoordinator::drain`] waits for tasks by default.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// Outcome of a drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Backend links closed by this shutdown.
    pub links_closed: usize,
    /// Tasks waited on.
    pub tasks: usize,
    /// Whether the grace period ran out first.
    pub timed_out: bool,
}

/// Owns the shutdown token and the relay teardown.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    relay: Arc<RelayService>,
    grace: Duration,
}

impl ShutdownCoordinator {
    /// Coordinator over `relay` with [`DEFAULT_GRACE`].
    pub fn new(relay: Arc<RelayService>) -> Self {
        Self::with_grace(relay, DEFAULT_GRACE)
    }

    /// Coordinator with a custom drain timeout.
    pub fn with_grace(relay: Arc<RelayService>, grace: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            relay,
            grace,
        }
    }

    /// Token cancelled when shutdown starts; sessions and the listener watch it.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether shutdown has started.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// End client sessions, then close every backend link.
    ///
    /// Returns the number of links this call closed; later calls return `0`
    /// unless new links appeared in between.
    pub fn trigger(&self) -> usize {
        let first = !self.token.is_cancelled();
        self.token.cancel();
        let links_closed = self.relay.shutdown();
        if first {
            info!(links_closed, "gateway shutdown started");
        }
        links_closed
    }

    /// [`trigger`](Self::trigger), then wait up to the grace period for
    /// `handles`.
    pub async fn drain(&self, handles: Vec<JoinHandle<()>>) -> ShutdownReport {
        let links_closed = self.trigger();
        let tasks = handles.len();
        info!(tasks, grace = ?self.grace, "draining gateway tasks");

        let timed_out = tokio::time::timeout(self.grace, join_all(handles))
            .await
            .is_err();
        if timed_out {
            warn!(grace = ?self.grace, "shutdown grace period elapsed with tasks still running");
        }
        ShutdownReport {
            links_closed,
            tasks,
            timed_out,
        }
    }
}
