//! Handler contract.
//!
//! # Data Flow
//! ```text
//! handler.toml [[handler]]
//!     → types.rs (type identifier → constructor)
//!     → Handler::init(HandlerConfig)        (once, before publish)
//!     → Arc<dyn Handler> in the registry
//!
//! Per connection (socket adapter):
//!     on_open → on_message* → on_error? → on_close
//! ```
//!
//! # Design Decisions
//! - `init` takes `&mut self` and runs before the instance is shared, so a
//!   published handler can never be re-initialized in place
//! - Callbacks are synchronous; outbound traffic goes through `Connection`,
//!   which only enqueues
//! - Handlers must be `Send + Sync`: one instance serves every connection of
//!   its mappings concurrently

pub mod builtin;
pub mod config;
pub mod connection;
pub mod types;

pub use config::{HandlerConfig, HandlerContext};
pub use connection::{Connection, Message};
pub use types::{HandlerConstructor, HandlerTypes};

use crate::error::HandlerInitError;

/// A unit of request-handling logic bound to one or more URL patterns.
pub trait Handler: Send + Sync + 'static {
    /// Initialize with the handler's configuration. Called exactly once.
    fn init(&mut self, config: HandlerConfig) -> Result<(), HandlerInitError>;

    /// A connection routed to this handler was opened.
    fn on_open(&self, _conn: &Connection) {}

    /// A text or binary message arrived on the connection.
    fn on_message(&self, conn: &Connection, message: Message);

    /// The connection closed, cleanly or not.
    fn on_close(&self, _conn: &Connection) {}

    /// The transport reported an error; `on_close` follows.
    fn on_error(&self, conn: &Connection, error: &str) {
        tracing::debug!(connection_id = %conn.id(), error = %error, "Connection error");
    }
}
