//! Handler lookup for a request.
//!
//! # Responsibilities
//! - Extract the handler path from a request
//! - Walk the mapping table in declaration order
//! - Return the handler of the first matching pattern, or an explicit NotFound
//!
//! # Design Decisions
//! - First match wins; no specificity scoring. Declare `/chat/admin/*`
//!   before `/chat/*` or the broader pattern shadows it
//! - Stateless: everything comes from the table and request passed in
//! - Pure in-memory work, never blocks

use std::sync::Arc;

use crate::error::LocateError;
use crate::handler::Handler;
use crate::registry::HandlerTable;

/// Anything that can be routed: exposes the path used for matching.
pub trait HandlerRequest {
    /// Request path with the application prefix already stripped.
    fn handler_path(&self) -> &str;
}

impl HandlerRequest for String {
    fn handler_path(&self) -> &str {
        self
    }
}

impl HandlerRequest for &str {
    fn handler_path(&self) -> &str {
        self
    }
}

/// Strategy that resolves a request to a handler.
pub trait ResourceLocator: Send + Sync + std::fmt::Debug {
    fn locate(
        &self,
        table: &HandlerTable,
        request: &dyn HandlerRequest,
    ) -> Result<Arc<dyn Handler>, LocateError>;
}

/// Glob-matching, first-match-in-declaration-order locator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerLocator;

impl ResourceLocator for HandlerLocator {
    fn locate(
        &self,
        table: &HandlerTable,
        request: &dyn HandlerRequest,
    ) -> Result<Arc<dyn Handler>, LocateError> {
        let handler_path = request.handler_path();

        let entry = table
            .mappings()
            .iter()
            .find(|entry| entry.matches(handler_path))
            .ok_or_else(|| LocateError::NotFound {
                path: handler_path.to_string(),
            })?;

        // Names are re-resolved against the current table. Table construction
        // rejects dangling names, so Unbound means the invariant was broken.
        table
            .handler(entry.handler_name())
            .ok_or_else(|| LocateError::Unbound {
                pattern: entry.url_pattern().to_string(),
                handler: entry.handler_name().to_string(),
            })
    }
}
