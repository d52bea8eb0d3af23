//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;

use websocket_server::config::loader::descriptor_path;
use websocket_server::error::HandlerInitError;
use websocket_server::handler::{Connection, Handler, HandlerConfig, Message};
use websocket_server::{ApplicationManagers, HandlerTypes, ServerConfig, Shutdown, WebSocketServer};

/// Write `descriptor` as the application's `WEB-INF/handler.toml`.
pub fn write_descriptor(webapp: &Path, descriptor: &str) -> PathBuf {
    let path = descriptor_path(webapp);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, descriptor).unwrap();
    path
}

/// Answers every message with its own handler name.
#[derive(Default)]
pub struct NameHandler {
    name: String,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl Handler for NameHandler {
    fn init(&mut self, config: HandlerConfig) -> Result<(), HandlerInitError> {
        self.name = config.handler_name().to_string();
        if let Some(log) = &self.log {
            log.lock().unwrap().push(self.name.clone());
        }
        Ok(())
    }

    fn on_message(&self, conn: &Connection, _message: Message) {
        conn.send(self.name.clone());
    }
}

/// Handler types for tests: builtins plus `test.Name`, which logs every init.
#[allow(dead_code)]
pub fn test_types(log: Arc<Mutex<Vec<String>>>) -> HandlerTypes {
    let mut types = HandlerTypes::with_builtins();
    types.register("test.Name", move || {
        Box::new(NameHandler {
            name: String::new(),
            log: Some(log.clone()),
        })
    });
    types
}

/// Start a server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(managers: Arc<ApplicationManagers>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = WebSocketServer::new(ServerConfig::default(), managers);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
