//! Routable view of an upgrade request.
//!
//! # Responsibilities
//! - Split the request path into application name and handler path
//! - Expose the handler path to the locator

use crate::routing::HandlerRequest;

/// An upgrade request with the application prefix stripped off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRequest {
    application: String,
    handler_path: String,
}

impl UpgradeRequest {
    /// `rest` is whatever followed `/{application}`; a leading `/` is ensured.
    pub fn new(application: impl Into<String>, rest: &str) -> Self {
        Self {
            application: application.into(),
            handler_path: format!("/{}", rest.trim_start_matches('/')),
        }
    }

    pub fn application(&self) -> &str {
        &self.application
    }
}

impl HandlerRequest for UpgradeRequest {
    fn handler_path(&self) -> &str {
        &self.handler_path
    }
}
