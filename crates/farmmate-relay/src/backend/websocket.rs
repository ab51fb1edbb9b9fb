//! WebSocket transport to the backend worker, one socket per session at
//! `{base_url}/ws/{session_id}`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{BackendChannel, BackendDialer};
use crate::error::{RelayError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Characters escaped in the session id path segment (RFC 3986 unreserved kept).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Dials the backend worker over WebSocket.
#[derive(Debug, Clone)]
pub struct WsDialer {
    base_url: String,
    queue: usize,
}

impl WsDialer {
    /// `base_url` is the worker root, e.g. `ws://agent-python:8000`.
    pub fn new(base_url: impl Into<String>, queue: usize) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            queue: queue.max(1),
        }
    }

    /// Socket URL for a session.
    pub fn endpoint(&self, session_id: &str) -> String {
        format!(
            "{}/ws/{}",
            self.base_url,
            utf8_percent_encode(session_id, PATH_SEGMENT)
        )
    }
}

#[async_trait]
impl BackendDialer for WsDialer {
    async fn dial(&self, session_id: &str) -> Result<BackendChannel> {
        let url = self.endpoint(session_id);
        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| RelayError::connection(format!("{url}: {e}")))?;
        info!(session_id, url = %url, "backend socket connected");

        let (outbound_tx, outbound_rx) = mpsc::channel(self.queue);
        let (inbound_tx, inbound_rx) = mpsc::channel(self.queue);
        let shutdown = CancellationToken::new();
        drop(tokio::spawn(bridge(
            ws,
            outbound_rx,
            inbound_tx,
            shutdown.clone(),
        )));

        Ok(BackendChannel {
            outbound: outbound_tx,
            inbound: inbound_rx,
            shutdown,
        })
    }
}

/// Pump frames between the socket and the channel halves until either side
/// ends or the link is shut down.
async fn bridge(
    ws: WsStream,
    mut outbound: mpsc::Receiver<String>,
    inbound: mpsc::Sender<Result<String>>,
    shutdown: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
            frame = outbound.recv() => {
                let Some(text) = frame else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    warn!(error = %e, "backend socket write failed");
                    let _ = inbound
                        .send(Err(RelayError::connection(format!("write failed: {e}"))))
                        .await;
                    break;
                }
            }
            msg = ws_rx.next() => {
                let item = match msg {
                    Some(Ok(Message::Text(text))) => Ok(text.as_str().to_owned()),
                    Some(Ok(Message::Binary(data))) => String::from_utf8(data.to_vec())
                        .map_err(|_| RelayError::response("non-UTF-8 binary frame")),
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "backend closed socket");
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = inbound
                            .send(Err(RelayError::connection(format!("read failed: {e}"))))
                            .await;
                        break;
                    }
                    None => break,
                };
                if inbound.send(item).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_session_path() {
        let dialer = WsDialer::new("ws://agent-python:8000", 8);
        assert_eq!(dialer.endpoint("farmer-1"), "ws://agent-python:8000/ws/farmer-1");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let dialer = WsDialer::new("ws://localhost:8000/", 8);
        assert_eq!(dialer.endpoint("a"), "ws://localhost:8000/ws/a");
    }

    #[test]
    fn endpoint_escapes_session_id() {
        let dialer = WsDialer::new("ws://h", 8);
        assert_eq!(dialer.endpoint("a b/c?d"), "ws://h/ws/a%20b%2Fc%3Fd");
        assert_eq!(dialer.endpoint("x_y.z~1-2"), "ws://h/ws/x_y.z~1-2");
    }

    #[test]
    fn zero_queue_is_clamped() {
        let dialer = WsDialer::new("ws://h", 0);
        assert_eq!(dialer.queue, 1);
    }

    #[tokio::test]
    async fn dial_unreachable_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dialer = WsDialer::new(format!("ws://127.0.0.1:{port}"), 8);
        let err = dialer.dial("s1").await.err().unwrap();
        assert!(matches!(err, RelayError::Connection { .. }));
    }
}
