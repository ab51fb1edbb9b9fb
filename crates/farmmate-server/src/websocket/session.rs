//! Client socket lifecycle, from upgrade through disconnect.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use farmmate_relay::{ClientEvent, ClientSink, Language, RelayError, RelayService, UserQuery};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, instrument, warn};

use super::connection::ClientConnection;
use super::handler::{Inbound, parse_frame};
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL,
    WS_DISCONNECTIONS_TOTAL, WS_HEARTBEAT_TIMEOUTS_TOTAL, WS_MALFORMED_FRAMES_TOTAL,
};
use crate::server::AppState;

/// Queries accepted from one client but not yet handed to the relay.
const DISPATCH_QUEUE: usize = 32;

/// Run a client socket.
///
/// 1. Queues a `connected` event carrying the client ID
/// 2. Hands `user_query` frames to a per-client dispatcher, in arrival order
/// 3. Forwards relay events through the outbound task, which also pings
/// 4. Ends on close, heartbeat timeout or server shutdown
/// 5. Closes every backend session the client owns
#[instrument(skip_all, fields(client_id = %client_id))]
pub async fn run_ws_session(ws: WebSocket, client_id: String, state: AppState) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let config = Arc::clone(&state.config);

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(config.send_queue.max(1));
    let connection = Arc::new(ClientConnection::new(client_id.clone(), send_tx));

    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
    state.clients.add(Arc::clone(&connection));

    let _ = connection.send_event(&ClientEvent::Connected {
        client_id: client_id.clone(),
    });

    let outbound_conn = Arc::clone(&connection);
    let mut outbound = tokio::spawn(
        async move {
            let mut ping_interval = tokio::time::interval(config.heartbeat_interval);
            // Skip the immediate first tick
            let _ = ping_interval.tick().await;

            loop {
                tokio::select! {
                    msg = send_rx.recv() => match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = ping_interval.tick() => {
                        if !outbound_conn.check_alive()
                            && outbound_conn.last_pong_elapsed() > config.pong_timeout
                        {
                            warn!(timeout = ?config.pong_timeout, "client unresponsive, disconnecting");
                            counter!(WS_HEARTBEAT_TIMEOUTS_TOTAL).increment(1);
                            break;
                        }
                        if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
            let _ = ws_tx.close().await;
        }
        .in_current_span(),
    );

    let (query_tx, mut query_rx) = mpsc::channel::<UserQuery>(DISPATCH_QUEUE);
    let relay = Arc::clone(&state.relay);
    let sink: Arc<dyn ClientSink> = connection.clone();
    // Sequential per client, across all of its sessions: a pending dial for
    // one `userId` holds back this client's later queries until it resolves
    // or hits the connect timeout.
    let dispatcher = tokio::spawn(
        async move {
            while let Some(query) = query_rx.recv().await {
                relay.handle_user_query(Arc::clone(&sink), query).await;
            }
        }
        .in_current_span(),
    );

    let shutdown = state.shutdown.token();
    loop {
        let frame = tokio::select! {
            () = shutdown.cancelled() => {
                info!("server shutting down, closing client");
                break;
            }
            _ = &mut outbound => {
                debug!("outbound task ended");
                break;
            }
            frame = ws_rx.next() => frame,
        };
        let Some(Ok(msg)) = frame else { break };

        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                Ok(s) => s,
                Err(_) => {
                    debug!(len = data.len(), "received non-UTF8 binary frame");
                    continue;
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                continue;
            }
        };

        route_frame(&text, &connection, &query_tx, &state.relay);
    }

    // Stop dispatching before closing sessions so no attempt outlives them.
    drop(query_tx);
    dispatcher.abort();
    let _ = dispatcher.await;
    let closed = state.relay.handle_disconnect(&client_id);
    outbound.abort();
    let _ = state.clients.remove(&client_id);

    info!(sessions_closed = closed, dropped = connection.drop_count(), "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());
}

fn route_frame(
    text: &str,
    connection: &ClientConnection,
    queries: &mpsc::Sender<UserQuery>,
    relay: &RelayService,
) {
    match parse_frame(text) {
        Inbound::Query(query) => {
            if let Err(err) = queries.try_send(query) {
                let query = err.into_inner();
                warn!("query queue full, rejecting");
                let language = Language::resolve(query.language.as_deref());
                relay.report(
                    connection,
                    &RelayError::server("too many queries in flight"),
                    language,
                );
            }
        }
        Inbound::Ignored(event) => debug!(event, "ignoring client event"),
        Inbound::Malformed { reason, language } => {
            warn!(reason, "malformed client frame");
            counter!(WS_MALFORMED_FRAMES_TOTAL).increment(1);
            relay.report(connection, &RelayError::server(reason), language);
        }
    }
}
