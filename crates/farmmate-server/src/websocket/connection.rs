//! WebSocket client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use farmmate_relay::{ClientEvent, ClientSink};
use metrics::counter;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::metrics::WS_SEND_DROPS_TOTAL;

/// A connected client socket.
///
/// Events are queued on a bounded channel drained by the socket's write
/// task; a full queue drops the event rather than blocking the relay.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: String,
    tx: mpsc::Sender<Arc<String>>,
    /// When this connection was established.
    pub connected_at: Instant,
    is_alive: AtomicBool,
    last_pong: Mutex<Instant>,
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Queue a text frame for the client.
    ///
    /// Returns `false` if the channel is full or closed, and increments the
    /// dropped message counter.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            counter!(WS_SEND_DROPS_TOTAL).increment(1);
            false
        }
    }

    /// Serialize an event and queue it.
    pub fn send_event(&self, event: &ClientEvent) -> bool {
        match serde_json::to_string(event) {
            Ok(json) => self.send(Arc::new(json)),
            Err(e) => {
                warn!(client_id = %self.id, event = event.name(), error = %e, "failed to serialize event");
                false
            }
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong or any frame received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for heartbeat.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl ClientSink for ClientConnection {
    fn client_id(&self) -> &str {
        &self.id
    }

    fn emit(&self, event: &ClientEvent) -> bool {
        self.send_event(event)
    }
}
