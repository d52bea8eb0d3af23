//! WebSocket connection pump.
//!
//! # Responsibilities
//! - Drive one upgraded socket for its whole lifetime
//! - Translate frames into handler callbacks
//! - Write whatever the handler queues on the `Connection`
//!
//! # Data Flow
//! ```text
//! Client ──frames──→ reader loop ──→ handler.on_message
//! Client ←─frames─── writer task ←── Connection::send (mpsc)
//! ```
//!
//! # Design Decisions
//! - Framing, ping/pong and close handshake are left to axum
//! - Handlers never await the socket; outbound frames are queued
//! - `on_close` always runs exactly once, after the reader loop ends

use std::sync::Arc;

use axum::extract::ws::{self, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::handler::connection::Outbound;
use crate::handler::{Connection, Handler, Message};
use crate::http::request::UpgradeRequest;
use crate::routing::HandlerRequest;

fn into_frame(message: Message) -> ws::Message {
    match message {
        Message::Text(text) => ws::Message::Text(text.into()),
        Message::Binary(data) => ws::Message::Binary(data.into()),
    }
}

/// Serve one upgraded connection with its resolved handler.
pub async fn serve_connection(socket: WebSocket, handler: Arc<dyn Handler>, request: UpgradeRequest) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection = Connection::new(request.application(), request.handler_path(), tx);
    let connection_id = connection.id();

    tracing::info!(
        connection_id = %connection_id,
        application = %request.application(),
        path = %request.handler_path(),
        "Connection opened"
    );

    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let frame = match outbound {
                Outbound::Message(message) => into_frame(message),
                Outbound::Close => break,
            };
            if sink.send(frame).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    handler.on_open(&connection);

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(ws::Message::Text(text)) => {
                handler.on_message(&connection, Message::Text(text.as_str().to_owned()))
            }
            Ok(ws::Message::Binary(data)) => {
                handler.on_message(&connection, Message::Binary(data.to_vec()))
            }
            Ok(ws::Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "Socket error");
                handler.on_error(&connection, &e.to_string());
                break;
            }
        }
    }

    handler.on_close(&connection);
    connection.close();
    drop(connection);
    let _ = writer.await;

    tracing::info!(connection_id = %connection_id, "Connection closed");
}
