//! `FarmmateServer`: Axum HTTP + WebSocket gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use farmmate_relay::RelayService;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::health::{self, HealthResponse, StatusResponse};
use crate::metrics;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::clients::ClientRegistry;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The relay every client socket drives.
    pub relay: Arc<RelayService>,
    /// Connected client sockets.
    pub clients: Arc<ClientRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Listener and socket settings.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle for `/metrics`.
    pub metrics: PrometheusHandle,
}

/// The gateway server.
pub struct FarmmateServer {
    state: AppState,
}

impl FarmmateServer {
    /// Create a new server around `relay`.
    pub fn new(config: ServerConfig, relay: Arc<RelayService>, metrics: PrometheusHandle) -> Self {
        Self {
            state: AppState {
                shutdown: Arc::new(ShutdownCoordinator::new(Arc::clone(&relay))),
                relay,
                clients: Arc::new(ClientRegistry::new()),
                config: Arc::new(config),
                start_time: Instant::now(),
                metrics,
            },
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .route("/api/status", get(status_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state.clone())
            .layer(cors_layer(&self.state.config.allowed_origins))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve in a background task until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>)> {
        let addr = self.state.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let token = self.state.shutdown.token();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server stopped with error");
            }
        });

        info!(addr = %local_addr, "gateway listening");
        Ok((local_addr, handle))
    }

    /// Stop accepting, end every client session and close every backend
    /// link. Returns the number of links closed.
    pub fn stop(&self) -> usize {
        self.state.shutdown.trigger()
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the relay.
    pub fn relay(&self) -> &Arc<RelayService> {
        &self.state.relay
    }

    /// Get the connected-client registry.
    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.state.clients
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
}

/// GET /ws
async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    if !state.config.origin_allowed(origin) {
        warn!(origin = origin.unwrap_or_default(), "rejecting socket from disallowed origin");
        return StatusCode::FORBIDDEN.into_response();
    }
    if state.shutdown.is_shutting_down() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let client_id = format!("client_{}", Uuid::now_v7().simple());
    let max = state.config.max_message_size;
    ws.max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| run_ws_session(socket, client_id, state))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.clients.count(),
        state.relay.stats(),
    ))
}

/// GET /api/status
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(health::status_report(
        state.start_time,
        &state.relay.config().backend_url,
        state.clients.count(),
        state.clients.total_dropped(),
        state.relay.stats(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    metrics::render(&state.metrics)
}
