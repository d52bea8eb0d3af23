//! Per-connection handle given to handler callbacks.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

/// A WebSocket data message, independent of the transport crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<Vec<u8>> for Message {
    fn from(data: Vec<u8>) -> Self {
        Message::Binary(data)
    }
}

/// Frames queued for the connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Message(Message),
    Close,
}

#[derive(Debug)]
struct Inner {
    id: Uuid,
    application: String,
    handler_path: String,
    outbound: mpsc::UnboundedSender<Outbound>,
}

/// Cheaply cloneable connection handle.
///
/// Sending never blocks: frames are queued and written by the socket adapter.
/// Once the peer is gone sends are silently dropped.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

impl Connection {
    pub fn new(
        application: impl Into<String>,
        handler_path: impl Into<String>,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                application: application.into(),
                handler_path: handler_path.into(),
                outbound,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn application(&self) -> &str {
        &self.inner.application
    }

    /// Path the connection was routed by.
    pub fn handler_path(&self) -> &str {
        &self.inner.handler_path
    }

    /// Queue a message. Returns false if the connection is already gone.
    pub fn send(&self, message: impl Into<Message>) -> bool {
        self.inner
            .outbound
            .send(Outbound::Message(message.into()))
            .is_ok()
    }

    /// Ask the writer to send a close frame and stop.
    pub fn close(&self) {
        let _ = self.inner.outbound.send(Outbound::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.outbound.is_closed()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("application", &self.inner.application)
            .field("handler_path", &self.inner.handler_path)
            .finish()
    }
}
