//! In-process fakes for relay tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendChannel, BackendDialer};
use crate::error::{RelayError, Result};
use crate::protocol::ClientEvent;
use crate::session::ClientSink;

/// Backend side of a faked channel.
pub(crate) struct FakeBackend {
    pub session_id: String,
    pub from_relay: mpsc::Receiver<String>,
    pub to_relay: mpsc::Sender<Result<String>>,
    pub shutdown: CancellationToken,
}

pub(crate) type Backends = mpsc::UnboundedReceiver<FakeBackend>;

/// How [`FakeDialer`] answers.
pub(crate) enum DialMode {
    /// Connect immediately.
    Ready,
    /// Connect once a permit is added to the semaphore.
    Gated(Arc<Semaphore>),
    /// Fail with a connection error.
    Refuse,
    /// Never complete.
    Hang,
}

pub(crate) struct FakeDialer {
    mode: DialMode,
    dials: AtomicUsize,
    backends: mpsc::UnboundedSender<FakeBackend>,
}

impl FakeDialer {
    pub(crate) fn new(mode: DialMode) -> (Arc<Self>, Backends) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dialer = Arc::new(Self {
            mode,
            dials: AtomicUsize::new(0),
            backends: tx,
        });
        (dialer, rx)
    }

    pub(crate) fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendDialer for FakeDialer {
    async fn dial(&self, session_id: &str) -> Result<BackendChannel> {
        let _ = self.dials.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            DialMode::Ready => {}
            DialMode::Gated(gate) => {
                gate.acquire()
                    .await
                    .map_err(|e| RelayError::connection(e.to_string()))?
                    .forget();
            }
            DialMode::Refuse => return Err(RelayError::connection("connection refused")),
            DialMode::Hang => std::future::pending::<()>().await,
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(16);
        let (inbound_tx, inbound_rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let _ = self.backends.send(FakeBackend {
            session_id: session_id.to_owned(),
            from_relay: outbound_rx,
            to_relay: inbound_tx,
            shutdown: shutdown.clone(),
        });
        Ok(BackendChannel {
            outbound: outbound_tx,
            inbound: inbound_rx,
            shutdown,
        })
    }
}

/// Sink that forwards events to a channel.
pub(crate) struct ChannelSink {
    id: String,
    tx: mpsc::UnboundedSender<ClientEvent>,
}

impl ChannelSink {
    pub(crate) fn new(
        id: impl Into<String>,
    ) -> (Arc<dyn ClientSink>, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { id: id.into(), tx }), rx)
    }
}

impl ClientSink for ChannelSink {
    fn client_id(&self) -> &str {
        &self.id
    }

    fn emit(&self, event: &ClientEvent) -> bool {
        self.tx.send(event.clone()).is_ok()
    }
}
