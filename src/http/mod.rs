//! WebSocket front end (socket engine adapter).
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, upgrade routing)
//!     → request.rs (application name + handler path)
//!     → registry locate (handler or 404)
//!     → websocket.rs (frame pump ↔ handler callbacks)
//! ```

pub mod request;
pub mod server;
pub mod websocket;

pub use request::UpgradeRequest;
pub use server::WebSocketServer;
