//! Single-flight connection establishment.
//!
//! One attempt per session id at a time. The attempt runs in its own task so
//! it always finalizes the registry slot, even when every caller has gone.
//! Callers arriving while it is in flight join the same shared outcome.

use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use metrics::{counter, gauge, histogram};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{BackendChannel, BackendLink};
use crate::error::{RelayError, Result};
use crate::i18n::Language;
use crate::metrics::{
    BACKEND_DIAL_DURATION_SECONDS, BACKEND_DIAL_FAILURES_TOTAL, BACKEND_DIALS_TOTAL,
    BACKEND_LINKS_ACTIVE,
};
use crate::reader;
use crate::registry::{AttemptOutcome, Entry, SessionRegistry, Slot};
use crate::session::{ClientSink, Session};

impl SessionRegistry {
    /// Return the session's open link, establishing one if needed.
    ///
    /// Creates the session on first use and records the query's language and
    /// client on it. Fails with [`RelayError::Connection`] when the backend
    /// is unreachable or the attempt exceeds the connect timeout.
    pub async fn get_or_create(
        &self,
        session_id: &str,
        language: Language,
        client: Arc<dyn ClientSink>,
    ) -> Result<(Arc<Session>, Arc<BackendLink>)> {
        let (session, outcome) = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(session_id.to_owned()).or_insert_with(|| Entry {
                session: Arc::new(Session::new(session_id, language, Arc::clone(&client))),
                slot: None,
            });
            entry.session.touch(language, &client);
            let session = Arc::clone(&entry.session);

            match &entry.slot {
                Some(Slot::Open(link)) if link.is_open() => {
                    return Ok((session, Arc::clone(link)));
                }
                Some(Slot::Connecting { outcome, .. }) => {
                    debug!(session_id, "joining in-flight connection attempt");
                    (session, outcome.clone())
                }
                _ => {
                    // A closed link not yet evicted by its reader is replaced here.
                    if let Some(Slot::Open(stale)) = entry.slot.take() {
                        let _ = stale.close();
                    }
                    let attempt = self.next_attempt_id();
                    let outcome = self.start_attempt(session_id, attempt);
                    entry.slot = Some(Slot::Connecting {
                        attempt,
                        outcome: outcome.clone(),
                    });
                    (session, outcome)
                }
            }
        };

        let link = outcome.await?;
        Ok((session, link))
    }

    fn start_attempt(&self, session_id: &str, attempt: u64) -> AttemptOutcome {
        let registry = self.clone();
        let session_id = session_id.to_owned();
        tokio::spawn(async move { registry.run_attempt(session_id, attempt).await })
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(RelayError::server(format!("connection task failed: {e}")))
                })
            })
            .boxed()
            .shared()
    }

    async fn run_attempt(self, session_id: String, attempt: u64) -> Result<Arc<BackendLink>> {
        counter!(BACKEND_DIALS_TOTAL).increment(1);
        let started = Instant::now();
        let timeout = self.inner.connect_timeout;

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel::<Result<BackendChannel>>();
        let dialer = Arc::clone(&self.inner.dialer);
        let dial_cancel = cancel.clone();
        let dial_id = session_id.clone();
        drop(tokio::spawn(async move {
            let result = tokio::select! {
                () = dial_cancel.cancelled() => return,
                result = dialer.dial(&dial_id) => result,
            };
            if let Err(Ok(late)) = tx.send(result) {
                warn!(session_id = %dial_id, "closing backend channel that connected after timeout");
                late.shutdown.cancel();
            }
        }));

        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => {
                if result.is_err() {
                    counter!(BACKEND_DIAL_FAILURES_TOTAL, "reason" => "error").increment(1);
                }
                result
            }
            Ok(Err(_)) => Err(RelayError::server("dial task ended without a result")),
            Err(_) => {
                cancel.cancel();
                counter!(BACKEND_DIAL_FAILURES_TOTAL, "reason" => "timeout").increment(1);
                Err(RelayError::connection(format!(
                    "no connection within {}ms",
                    timeout.as_millis()
                )))
            }
        };

        self.finish_attempt(&session_id, attempt, result, started)
    }

    fn finish_attempt(
        &self,
        session_id: &str,
        attempt: u64,
        result: Result<BackendChannel>,
        started: Instant,
    ) -> Result<Arc<BackendLink>> {
        let mut entries = self.inner.entries.lock();
        let current = entries.get_mut(session_id).filter(|e| {
            matches!(e.slot, Some(Slot::Connecting { attempt: a, .. }) if a == attempt)
        });

        let Some(entry) = current else {
            // Disconnected (or replaced) while the dial was in flight.
            drop(entries);
            return match result {
                Ok(channel) => {
                    channel.shutdown.cancel();
                    warn!(session_id, attempt, "session went away while connecting");
                    Err(RelayError::connection("session closed while connecting"))
                }
                Err(err) => Err(err),
            };
        };

        match result {
            Ok(channel) => {
                let link = Arc::new(BackendLink::new(
                    session_id,
                    channel.outbound,
                    channel.shutdown,
                ));
                entry.slot = Some(Slot::Open(Arc::clone(&link)));
                let session = Arc::clone(&entry.session);
                drop(entries);

                histogram!(BACKEND_DIAL_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
                gauge!(BACKEND_LINKS_ACTIVE).increment(1.0);
                info!(session_id, link_id = link.id(), "backend link open");
                drop(tokio::spawn(reader::run(
                    self.clone(),
                    session,
                    Arc::clone(&link),
                    channel.inbound,
                )));
                Ok(link)
            }
            Err(err) => {
                entry.slot = None;
                drop(entries);
                warn!(session_id, error = %err, "backend connection attempt failed");
                Err(err)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Semaphore;

    use super::*;
    use crate::backend::LinkState;
    use crate::i18n::Catalog;
    use crate::testing::{Backends, ChannelSink, DialMode, FakeDialer};

    fn registry(mode: DialMode) -> (SessionRegistry, Arc<FakeDialer>, Backends) {
        let (dialer, backends) = FakeDialer::new(mode);
        let registry = SessionRegistry::new(
            dialer.clone(),
            Arc::new(Catalog::builtin()),
            Duration::from_secs(10),
        );
        (registry, dialer, backends)
    }

    async fn wait_for_dials(dialer: &FakeDialer, n: usize) {
        for _ in 0..100 {
            if dialer.dials() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {n} dials, saw {}", dialer.dials());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_dial() {
        let gate = Arc::new(Semaphore::new(0));
        let (registry, dialer, _backends) = registry(DialMode::Gated(Arc::clone(&gate)));

        let mut handles = Vec::new();
        for i in 0..3 {
            let registry = registry.clone();
            let (sink, _events) = ChannelSink::new(format!("c{i}"));
            handles.push(tokio::spawn(async move {
                registry.get_or_create("farmer", Language::En, sink).await
            }));
        }
        wait_for_dials(&dialer, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(registry.stats().connecting, 1);

        gate.add_permits(1);
        let mut ids = Vec::new();
        for handle in handles {
            let (_, link) = handle.await.unwrap().unwrap();
            ids.push(link.id());
        }
        assert_eq!(dialer.dials(), 1);
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.stats().open_links, 1);
    }

    #[tokio::test]
    async fn open_link_is_reused() {
        let (registry, dialer, _backends) = registry(DialMode::Ready);
        let (sink, _events) = ChannelSink::new("c1");
        let (_, first) = registry
            .get_or_create("s1", Language::En, Arc::clone(&sink))
            .await
            .unwrap();
        let (session, second) = registry.get_or_create("s1", Language::Mr, sink).await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(dialer.dials(), 1);
        assert_eq!(session.language(), Language::Mr);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_without_registering() {
        let (registry, dialer, _backends) = registry(DialMode::Hang);
        let (sink, _events) = ChannelSink::new("c1");

        let started = tokio::time::Instant::now();
        let err = registry
            .get_or_create("s1", Language::En, Arc::clone(&sink))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RelayError::Connection { .. }));
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(registry.state("s1").is_none());
        assert_eq!(
            registry.stats(),
            crate::registry::RegistryStats {
                sessions: 1,
                open_links: 0,
                connecting: 0
            }
        );

        // No automatic retry; the next query starts a fresh attempt.
        let _ = registry.get_or_create("s1", Language::En, sink).await;
        assert_eq!(dialer.dials(), 2);
    }

    #[tokio::test]
    async fn refused_dial_leaves_session_unwired() {
        let (registry, _dialer, _backends) = registry(DialMode::Refuse);
        let (sink, _events) = ChannelSink::new("c1");
        let err = registry
            .get_or_create("s1", Language::En, sink)
            .await
            .err()
            .unwrap();
        assert_eq!(err.error_key(), "connectionError");
        assert!(registry.session("s1").is_some());
        assert!(registry.state("s1").is_none());
    }

    #[tokio::test]
    async fn success_after_disconnect_is_closed() {
        let gate = Arc::new(Semaphore::new(0));
        let (registry, dialer, mut backends) = registry(DialMode::Gated(Arc::clone(&gate)));
        let (sink, _events) = ChannelSink::new("c1");

        let pending = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.get_or_create("s1", Language::En, sink).await })
        };
        wait_for_dials(&dialer, 1).await;
        assert_eq!(registry.state("s1"), Some(LinkState::Connecting));
        assert!(!registry.disconnect("s1"));

        gate.add_permits(1);
        let err = pending.await.unwrap().err().unwrap();
        assert!(matches!(err, RelayError::Connection { .. }));
        let backend = backends.recv().await.unwrap();
        assert!(backend.shutdown.is_cancelled());
        assert_eq!(registry.stats().sessions, 0);
    }

    #[tokio::test]
    async fn dropped_callers_do_not_strand_attempt() {
        let gate = Arc::new(Semaphore::new(0));
        let (registry, dialer, _backends) = registry(DialMode::Gated(Arc::clone(&gate)));
        let (sink, _events) = ChannelSink::new("c1");

        let caller = {
            let registry = registry.clone();
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { registry.get_or_create("s1", Language::En, sink).await })
        };
        wait_for_dials(&dialer, 1).await;
        caller.abort();

        gate.add_permits(1);
        for _ in 0..100 {
            if registry.state("s1") == Some(LinkState::Open) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(registry.state("s1"), Some(LinkState::Open));
        let _ = registry.get_or_create("s1", Language::En, sink).await.unwrap();
        assert_eq!(dialer.dials(), 1);
    }
}
