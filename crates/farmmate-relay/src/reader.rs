//! Per-link reader task.
//!
//! Consumes backend frames in delivery order, drives the session's
//! [`ResponseInterpreter`] and emits the resulting events. When the link ends
//! it evicts the session, but only if this link is still the registered one.

use std::sync::Arc;

use metrics::{counter, gauge};
use tracing::{debug, info, instrument, warn};

use crate::backend::{BackendLink, InboundFrames};
use crate::error::RelayError;
use crate::interpreter::ResponseInterpreter;
use crate::metrics::{BACKEND_LINKS_ACTIVE, CLIENT_ERRORS_TOTAL};
use crate::protocol::ClientEvent;
use crate::registry::SessionRegistry;
use crate::session::Session;

#[instrument(skip_all, fields(session_id = %session.id(), link_id = link.id()))]
pub(crate) async fn run(
    registry: SessionRegistry,
    session: Arc<Session>,
    link: Arc<BackendLink>,
    mut inbound: InboundFrames,
) {
    let mut interpreter = ResponseInterpreter::new(registry.localizer());

    loop {
        tokio::select! {
            biased;
            () = link.closed() => {
                debug!("link closed locally");
                break;
            }
            frame = inbound.recv() => match frame {
                Some(Ok(text)) => {
                    if let Some(event) = interpreter.on_frame(&text, session.language()) {
                        answer(&link, &session, &event);
                    }
                }
                Some(Err(err @ RelayError::Response { .. })) => {
                    let event = interpreter.fail(&err, session.language());
                    answer(&link, &session, &event);
                }
                Some(Err(err)) => {
                    warn!(error = %err, "backend transport failed");
                    interrupted(&interpreter, &link, &session, &err);
                    let _ = link.fail();
                    break;
                }
                None => {
                    info!("backend closed the connection");
                    interrupted(
                        &interpreter,
                        &link,
                        &session,
                        &RelayError::connection("backend closed the connection"),
                    );
                    let _ = link.close();
                    break;
                }
            }
        }
    }

    let _ = registry.evict_if_current(session.id(), link.id());
    gauge!(BACKEND_LINKS_ACTIVE).decrement(1.0);
}

/// Deliver an interpreted event, settling the query it answers.
fn answer(link: &BackendLink, session: &Session, event: &ClientEvent) {
    if event.ends_query() {
        link.settle();
    }
    deliver(session, event);
}

/// Tell the client once if the link died with a query still unanswered.
fn interrupted(
    interpreter: &ResponseInterpreter,
    link: &BackendLink,
    session: &Session,
    err: &RelayError,
) {
    if link.awaiting_replies() == 0 {
        return;
    }
    let localizer = interpreter.localizer();
    let event = ClientEvent::error(err.localized(localizer.as_ref(), session.language()));
    deliver(session, &event);
}

/// Emit an event to the session's current client.
pub(crate) fn deliver(session: &Session, event: &ClientEvent) {
    if matches!(event, ClientEvent::Error { .. }) {
        counter!(CLIENT_ERRORS_TOTAL).increment(1);
    }
    if !session.emit(event) {
        debug!(event = event.name(), "client sink rejected event");
    }
}
