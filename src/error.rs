//! Error taxonomy for handler registration and dispatch.
//!
//! # Design Decisions
//! - Configuration and initialization errors are fatal to one application's
//!   activation and never leave a half-built registry behind
//! - Dispatch errors are scoped to a single connection

use std::path::PathBuf;
use thiserror::Error;

/// A malformed or inconsistent application descriptor.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The descriptor exists but could not be read.
    #[error("failed to read descriptor {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid TOML or does not match the schema.
    #[error("failed to parse descriptor {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A handler declaration without a name.
    #[error("handler declaration #{index} has no handler-name")]
    MissingHandlerName { index: usize },

    /// A handler declaration without a type identifier.
    #[error("no handler class defined for handler {handler}")]
    MissingHandlerClass { handler: String },

    /// The type identifier is not registered with the handler type map.
    #[error("handler {handler} references unknown handler class {class}")]
    UnknownHandlerClass { handler: String, class: String },

    /// A mapping points at a handler name that was never declared.
    #[error("can't find handler {handler} for url-pattern {pattern}")]
    UnknownHandler { pattern: String, handler: String },
}

/// No handler could be resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// No mapping pattern matches the handler path.
    #[error("can't find handler for requested path {path}")]
    NotFound { path: String },

    /// A pattern matched but its handler is no longer registered.
    #[error("url-pattern {pattern} matched but handler {handler} is not registered")]
    Unbound { pattern: String, handler: String },
}

/// Raised by a handler that cannot initialize with its configuration.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerInitError {
    message: String,
}

impl HandlerInitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure to bring an application's handler registry online.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("invalid handler configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("handler {handler} failed to initialize: {source}")]
    HandlerInitialization {
        handler: String,
        #[source]
        source: HandlerInitError,
    },

    /// `initialize()` was already called on this registry.
    #[error("handler registry for {} is already initialized", .webapp_path.display())]
    AlreadyInitialized { webapp_path: PathBuf },

    /// The activation worker panicked or was cancelled before reporting.
    #[error("activation of {application} did not complete: {message}")]
    Aborted { application: String, message: String },

    /// A table swap would leave a mapping pointing at a missing handler.
    #[error("url-pattern {pattern} references handler {handler} which is not in the new handler set")]
    DanglingMapping { pattern: String, handler: String },
}
