//! WebSocket server setup.
//!
//! # Responsibilities
//! - Create the Axum Router for `/{application}/{*path}` upgrades
//! - Resolve the application's registry and locate the handler
//! - Reject unroutable upgrades before the handshake completes
//! - Enforce the connection limit
//! - Hand upgraded sockets to the connection pump

use std::io;
use std::sync::Arc;

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::request::UpgradeRequest;
use crate::http::websocket::serve_connection;
use crate::registry::ApplicationManagers;
use crate::routing::HandlerRequest;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub managers: Arc<ApplicationManagers>,
    pub connection_limit: Arc<Semaphore>,
}

/// Multi-application WebSocket front end.
pub struct WebSocketServer {
    router: Router,
    config: ServerConfig,
}

impl WebSocketServer {
    /// Create a new server routing into the given application registries.
    pub fn new(config: ServerConfig, managers: Arc<ApplicationManagers>) -> Self {
        let state = AppState {
            managers,
            connection_limit: Arc::new(Semaphore::new(config.listener.max_connections)),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{application}", get(upgrade_root))
            .route("/{application}/{*path}", get(upgrade_path))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = self.config.listener.max_connections,
            "WebSocket server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("WebSocket server received shutdown signal");
            })
            .await?;

        tracing::info!("WebSocket server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

async fn upgrade_root(
    State(state): State<AppState>,
    Path(application): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    dispatch(state, UpgradeRequest::new(application, ""), ws)
}

async fn upgrade_path(
    State(state): State<AppState>,
    Path((application, path)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> Response {
    dispatch(state, UpgradeRequest::new(application, &path), ws)
}

/// Route an upgrade to its handler or reject it.
fn dispatch(state: AppState, request: UpgradeRequest, ws: WebSocketUpgrade) -> Response {
    let Some(manager) = state.managers.get(request.application()) else {
        tracing::warn!(application = %request.application(), "Unknown application");
        return (StatusCode::NOT_FOUND, "Unknown application").into_response();
    };

    let handler = match manager.locate(&request) {
        Ok(handler) => handler,
        Err(e) => {
            tracing::warn!(
                application = %request.application(),
                path = %request.handler_path(),
                error = %e,
                "No handler matched"
            );
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let Ok(permit) = state.connection_limit.clone().try_acquire_owned() else {
        tracing::warn!(application = %request.application(), "Connection limit reached");
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    ws.on_upgrade(move |socket| async move {
        serve_connection(socket, handler, request).await;
        drop(permit);
    })
}
