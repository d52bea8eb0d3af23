//! Built-in handler types.

use dashmap::DashMap;
use uuid::Uuid;

use super::{Connection, Handler, HandlerConfig, Message};
use crate::error::HandlerInitError;

/// Sends every message back to its sender.
///
/// Init params: `prefix` is prepended to text messages.
#[derive(Debug, Default)]
pub struct EchoHandler {
    name: String,
    prefix: String,
}

impl EchoHandler {
    pub const TYPE: &'static str = "echo";
}

impl Handler for EchoHandler {
    fn init(&mut self, config: HandlerConfig) -> Result<(), HandlerInitError> {
        self.name = config.handler_name().to_string();
        self.prefix = config.init_parameter("prefix").unwrap_or_default().to_string();
        Ok(())
    }

    fn on_message(&self, conn: &Connection, message: Message) {
        let reply = match message {
            Message::Text(text) => Message::Text(format!("{}{}", self.prefix, text)),
            binary => binary,
        };
        conn.send(reply);
    }
}

/// Relays every message to all open connections of this handler.
///
/// Init params: `include-sender` (`true`/`false`, default `true`).
#[derive(Debug)]
pub struct BroadcastHandler {
    name: String,
    include_sender: bool,
    connections: DashMap<Uuid, Connection>,
}

impl BroadcastHandler {
    pub const TYPE: &'static str = "broadcast";

    /// Number of currently open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for BroadcastHandler {
    fn default() -> Self {
        Self {
            name: String::new(),
            include_sender: true,
            connections: DashMap::new(),
        }
    }
}

impl Handler for BroadcastHandler {
    fn init(&mut self, config: HandlerConfig) -> Result<(), HandlerInitError> {
        self.name = config.handler_name().to_string();
        if let Some(value) = config.init_parameter("include-sender") {
            self.include_sender = value.trim().parse().map_err(|_| {
                HandlerInitError::new(format!(
                    "include-sender must be true or false, got '{value}'"
                ))
            })?;
        }
        Ok(())
    }

    fn on_open(&self, conn: &Connection) {
        self.connections.insert(conn.id(), conn.clone());
        tracing::debug!(
            handler = %self.name,
            connection_id = %conn.id(),
            connections = self.connections.len(),
            "Joined broadcast"
        );
    }

    fn on_message(&self, conn: &Connection, message: Message) {
        // Collect first so no map shard lock is held while sending.
        let peers: Vec<Connection> = self
            .connections
            .iter()
            .filter(|entry| self.include_sender || *entry.key() != conn.id())
            .map(|entry| entry.value().clone())
            .collect();

        for peer in peers {
            peer.send(message.clone());
        }
    }

    fn on_close(&self, conn: &Connection) {
        self.connections.remove(&conn.id());
    }
}
