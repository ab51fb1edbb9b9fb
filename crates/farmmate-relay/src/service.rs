//! The relay facade driven by the gateway.

use std::sync::Arc;

use metrics::counter;
use tracing::{Span, debug, instrument, warn};

use crate::backend::{BackendDialer, WsDialer};
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::i18n::{Catalog, Language, Localizer};
use crate::metrics::{CLIENT_ERRORS_TOTAL, QUERIES_TOTAL};
use crate::protocol::{ClientEvent, InboundQuery, UserQuery};
use crate::registry::{RegistryStats, SessionRegistry};
use crate::session::ClientSink;

/// Owns the session registry and turns client actions into registry calls.
///
/// One instance per process, built from injected configuration and shared
/// by every client connection.
pub struct RelayService {
    config: RelayConfig,
    registry: SessionRegistry,
    localizer: Arc<dyn Localizer>,
}

impl RelayService {
    /// Create a service over an arbitrary dialer.
    pub fn new(
        config: RelayConfig,
        dialer: Arc<dyn BackendDialer>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        let registry =
            SessionRegistry::new(dialer, Arc::clone(&localizer), config.connect_timeout);
        Self {
            config,
            registry,
            localizer,
        }
    }

    /// Create a service that dials the backend over WebSocket with the
    /// built-in catalog.
    pub fn with_websocket_backend(config: RelayConfig) -> Self {
        let dialer = Arc::new(WsDialer::new(&config.backend_url, config.outbound_queue));
        Self::new(config, dialer, Arc::new(Catalog::builtin()))
    }

    /// Forward a client query to its session's backend connection.
    ///
    /// Never fails: any error is reported once on the client's `error`
    /// channel in the query's language.
    #[instrument(skip_all, fields(client_id = %client.client_id(), session_id))]
    pub async fn handle_user_query(&self, client: Arc<dyn ClientSink>, query: UserQuery) {
        let inbound = InboundQuery::resolve(query, client.client_id());
        let _ = Span::current().record("session_id", inbound.session_id.as_str());

        if let Err(err) = self.dispatch(&client, &inbound).await {
            warn!(error = %err, "query failed");
            self.report(client.as_ref(), &err, inbound.language);
        }
    }

    async fn dispatch(&self, client: &Arc<dyn ClientSink>, query: &InboundQuery) -> Result<()> {
        let (_session, link) = self
            .registry
            .get_or_create(&query.session_id, query.language, Arc::clone(client))
            .await?;
        let frame = serde_json::to_string(&query.to_backend())
            .map_err(|e| RelayError::server(format!("encode query: {e}")))?;
        link.send(frame)?;
        counter!(QUERIES_TOTAL).increment(1);
        debug!(link_id = link.id(), language = %query.language, "query forwarded");
        Ok(())
    }

    /// Emit `err` to `client` as a localized `error` event.
    pub fn report(&self, client: &dyn ClientSink, err: &RelayError, language: Language) {
        counter!(CLIENT_ERRORS_TOTAL).increment(1);
        let event = ClientEvent::error(err.localized(self.localizer.as_ref(), language));
        if !client.emit(&event) {
            debug!(client_id = client.client_id(), "client sink rejected error event");
        }
    }

    /// Close and evict every session the departing client owns.
    pub fn handle_disconnect(&self, client_id: &str) -> usize {
        self.registry.disconnect_client(client_id)
    }

    /// Close every backend link.
    pub fn shutdown(&self) -> usize {
        self.registry.close_all()
    }

    /// Connection counts.
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// The session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The localizer.
    pub fn localizer(&self) -> &Arc<dyn Localizer> {
        &self.localizer
    }

    /// The injected configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};

    use super::*;
    use crate::backend::MockBackendDialer;
    use crate::protocol::StatusKind;
    use crate::testing::{Backends, ChannelSink, DialMode, FakeBackend, FakeDialer};

    fn service(mode: DialMode) -> (RelayService, Arc<FakeDialer>, Backends) {
        let (dialer, backends) = FakeDialer::new(mode);
        let service = RelayService::new(
            RelayConfig::default(),
            dialer.clone(),
            Arc::new(Catalog::builtin()),
        );
        (service, dialer, backends)
    }

    fn query(text: &str, user_id: Option<&str>, language: Option<&str>) -> UserQuery {
        UserQuery {
            query: text.to_owned(),
            user_id: user_id.map(str::to_owned),
            language: language.map(str::to_owned),
        }
    }

    async fn reply(backend: &FakeBackend, frame: Value) {
        backend.to_relay.send(Ok(frame.to_string())).await.unwrap();
    }

    async fn next_event(
        events: &mut tokio::sync::mpsc::UnboundedReceiver<ClientEvent>,
    ) -> ClientEvent {
        tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("event within 1s")
            .expect("sink open")
    }

    #[tokio::test]
    async fn query_is_forwarded_to_session_backend() {
        let (service, _dialer, mut backends) = service(DialMode::Ready);
        let (sink, _events) = ChannelSink::new("c1");

        service
            .handle_user_query(sink, query("Best fertilizer?", None, Some("gu")))
            .await;

        let mut backend = backends.recv().await.unwrap();
        assert_eq!(backend.session_id, "c1");
        let sent: Value = serde_json::from_str(&backend.from_relay.recv().await.unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({"raw_query": "Best fertilizer?", "language": "gu", "user_id": "c1"})
        );
    }

    #[tokio::test]
    async fn full_exchange_yields_three_statuses_then_reply() {
        let (service, _dialer, mut backends) = service(DialMode::Ready);
        let (sink, mut events) = ChannelSink::new("c1");
        service
            .handle_user_query(sink, query("Which crop?", Some("farmer-7"), None))
            .await;
        let backend = backends.recv().await.unwrap();

        reply(&backend, json!({"type": "connection_established", "message": "welcome"})).await;
        reply(&backend, json!({"type": "message_received", "message": "ack"})).await;
        reply(
            &backend,
            json!({"type": "status_update", "status": "processing", "details": {"stage": "analyzing_query"}}),
        )
        .await;
        reply(
            &backend,
            json!({"type": "status_update", "status": "processing", "details": {"stage": "generating_response"}}),
        )
        .await;
        reply(
            &backend,
            json!({
                "type": "agricultural_response",
                "success": true,
                "message": "ok",
                "data": {"final_advice": "Grow millet", "location": "Unknown", "detected_intents": []}
            }),
        )
        .await;
        reply(&backend, json!({"type": "status_update", "details": {"stage": "analyzing_query"}}))
            .await;

        let mut statuses = Vec::new();
        for _ in 0..3 {
            match next_event(&mut events).await {
                ClientEvent::AiStatus { status, .. } => statuses.push(status),
                other => panic!("expected status, got {other:?}"),
            }
        }
        assert_eq!(
            statuses,
            vec![StatusKind::Received, StatusKind::Processing, StatusKind::Processing]
        );
        let ClientEvent::AiResponse(response) = next_event(&mut events).await else {
            panic!("expected ai_response");
        };
        assert_eq!(response.message, "Grow millet");

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn hindi_reply_is_localized() {
        let (service, _dialer, mut backends) = service(DialMode::Ready);
        let (sink, mut events) = ChannelSink::new("c1");
        service
            .handle_user_query(sink, query("what crop for soil pH 7.2?", None, Some("hi")))
            .await;
        let backend = backends.recv().await.unwrap();

        reply(
            &backend,
            json!({
                "type": "agricultural_response",
                "success": true,
                "data": {
                    "final_advice": "Plant wheat",
                    "location": "Delhi",
                    "detected_intents": ["crop_selection"]
                }
            }),
        )
        .await;

        let ClientEvent::AiResponse(response) = next_event(&mut events).await else {
            panic!("expected ai_response");
        };
        assert!(response.message.starts_with("Plant wheat"));
        let lines: Vec<&str> = response.message.lines().collect();
        assert!(lines.contains(&"📍 स्थान: Delhi"));
        assert!(lines.contains(&"🎯 विषय: crop_selection"));
        assert_eq!(response.language, Some(Language::Hi));
    }

    #[tokio::test]
    async fn refused_dial_reports_single_connection_error() {
        let mut dialer = MockBackendDialer::new();
        let _ = dialer
            .expect_dial()
            .withf(|id: &str| id == "c1")
            .times(1)
            .returning(|_| Err(RelayError::connection("connection refused")));
        let service = RelayService::new(
            RelayConfig::default(),
            Arc::new(dialer),
            Arc::new(Catalog::builtin()),
        );
        let (sink, mut events) = ChannelSink::new("c1");

        service.handle_user_query(sink, query("hello", None, None)).await;

        assert_eq!(
            events.try_recv().unwrap(),
            ClientEvent::error("Failed to connect to AI server.")
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn error_uses_query_language() {
        let (service, _dialer, _backends) = service(DialMode::Refuse);
        let (sink, mut events) = ChannelSink::new("c1");
        service.handle_user_query(sink, query("q", None, Some("pa"))).await;
        assert_eq!(
            events.try_recv().unwrap(),
            ClientEvent::error("AI ਸਰਵਰ ਨਾਲ ਕਨੈਕਸ਼ਨ ਅਸਫਲ।")
        );
    }

    #[tokio::test]
    async fn language_switch_applies_to_next_query() {
        let (service, dialer, mut backends) = service(DialMode::Ready);
        let (sink, mut events) = ChannelSink::new("c1");

        service
            .handle_user_query(Arc::clone(&sink), query("one", Some("u1"), Some("en")))
            .await;
        let mut backend = backends.recv().await.unwrap();
        let _ = backend.from_relay.recv().await.unwrap();

        service
            .handle_user_query(sink, query("two", Some("u1"), Some("mr")))
            .await;
        let sent: Value = serde_json::from_str(&backend.from_relay.recv().await.unwrap()).unwrap();
        assert_eq!(sent["language"], "mr");
        assert_eq!(dialer.dials(), 1);

        reply(&backend, json!({"type": "message_received"})).await;
        let ClientEvent::AiStatus { message, .. } = next_event(&mut events).await else {
            panic!("expected ai_status");
        };
        assert_eq!(message, "तुमचा प्रश्न प्राप्त झाला आहे. कृपया प्रतीक्षा करा...");
    }

    #[tokio::test]
    async fn backend_drop_during_second_query_reports_connection_error() {
        let (service, dialer, mut backends) = service(DialMode::Ready);
        let (sink, mut events) = ChannelSink::new("c1");

        service
            .handle_user_query(Arc::clone(&sink), query("first", Some("u1"), None))
            .await;
        let mut backend = backends.recv().await.unwrap();
        let _ = backend.from_relay.recv().await.unwrap();
        reply(&backend, json!({"type": "message_received"})).await;
        reply(&backend, json!({"message": "Irrigate at dawn", "success": true})).await;
        assert!(matches!(next_event(&mut events).await, ClientEvent::AiStatus { .. }));
        assert!(matches!(next_event(&mut events).await, ClientEvent::AiResponse(_)));

        service
            .handle_user_query(sink, query("second", Some("u1"), None))
            .await;
        let _ = backend.from_relay.recv().await.unwrap();
        assert_eq!(dialer.dials(), 1);
        drop(backend);

        assert_eq!(
            next_event(&mut events).await,
            ClientEvent::error("Failed to connect to AI server.")
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn queries_before_first_dial_all_reach_backend() {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let (service, dialer, mut backends) = service(DialMode::Gated(Arc::clone(&gate)));
        let service = Arc::new(service);
        let (sink, mut events) = ChannelSink::new("c1");

        let mut pending = Vec::new();
        for text in ["one", "two", "three"] {
            let service = Arc::clone(&service);
            let sink = Arc::clone(&sink);
            pending.push(tokio::spawn(async move {
                service
                    .handle_user_query(sink, query(text, Some("farm-1"), None))
                    .await;
            }));
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.add_permits(1);
        for task in pending {
            task.await.unwrap();
        }

        let mut backend = backends.recv().await.unwrap();
        let mut sent = Vec::new();
        for _ in 0..3 {
            let frame: Value =
                serde_json::from_str(&backend.from_relay.recv().await.unwrap()).unwrap();
            sent.push(frame["raw_query"].as_str().unwrap().to_owned());
        }
        sent.sort();
        assert_eq!(sent, vec!["one", "three", "two"]);
        assert_eq!(dialer.dials(), 1);
        assert!(backends.try_recv().is_err());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_closes_backend() {
        let (service, _dialer, mut backends) = service(DialMode::Ready);
        let (sink, _events) = ChannelSink::new("c1");
        service.handle_user_query(sink, query("q", None, None)).await;
        let backend = backends.recv().await.unwrap();

        assert_eq!(service.handle_disconnect("c1"), 1);
        assert_eq!(service.handle_disconnect("c1"), 0);
        tokio::time::timeout(Duration::from_secs(1), backend.shutdown.cancelled())
            .await
            .unwrap();
        assert_eq!(service.stats(), RegistryStats::default());
    }

    #[tokio::test]
    async fn shutdown_closes_all_links() {
        let (service, _dialer, _backends) = service(DialMode::Ready);
        let (a, _ea) = ChannelSink::new("a");
        let (b, _eb) = ChannelSink::new("b");
        service.handle_user_query(a, query("q", None, None)).await;
        service.handle_user_query(b, query("q", None, None)).await;
        assert_eq!(service.stats().open_links, 2);
        assert_eq!(service.shutdown(), 2);
        assert_eq!(service.stats().sessions, 0);
    }

    #[tokio::test]
    async fn report_emits_localized_error() {
        let (service, _dialer, _backends) = service(DialMode::Ready);
        let (sink, mut events) = ChannelSink::new("c1");
        service.report(sink.as_ref(), &RelayError::server("bad frame"), Language::Hi);
        assert_eq!(events.try_recv().unwrap(), ClientEvent::error("आंतरिक सर्वर त्रुटि।"));
    }
}
