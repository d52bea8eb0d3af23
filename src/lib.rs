//! Multi-application WebSocket handler registry and router.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod routing;

pub use config::schema::ServerConfig;
pub use error::{ActivationError, ConfigurationError, HandlerInitError, LocateError};
pub use handler::{Handler, HandlerTypes};
pub use http::WebSocketServer;
pub use lifecycle::Shutdown;
pub use registry::{ApplicationManagers, HandlerManager, HandlerManagerFactory};
