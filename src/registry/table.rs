//! The published, immutable handler table.
//!
//! # Design Decisions
//! - Built completely before publication; never edited in place
//! - Mutations produce a new table that replaces the old one atomically
//! - Construction checks that every mapping names a present handler

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ActivationError;
use crate::handler::{Handler, HandlerContext};
use crate::routing::GlobPattern;

/// One `url-pattern` → `handler-name` routing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pattern: GlobPattern,
    handler_name: String,
}

impl MappingEntry {
    pub fn new(url_pattern: impl Into<String>, handler_name: impl Into<String>) -> Self {
        Self {
            pattern: GlobPattern::new(url_pattern),
            handler_name: handler_name.into(),
        }
    }

    pub fn url_pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn matches(&self, handler_path: &str) -> bool {
        self.pattern.matches(handler_path)
    }
}

/// Handlers by name plus the ordered mapping table.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn Handler>>,
    mappings: Vec<MappingEntry>,
    /// Context the handlers were initialized against; handlers only hold it weakly.
    context: Option<Arc<dyn HandlerContext>>,
}

impl HandlerTable {
    /// An empty table: no handlers, no mappings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table, rejecting mappings that reference missing handlers.
    pub fn new(
        handlers: HashMap<String, Arc<dyn Handler>>,
        mappings: Vec<MappingEntry>,
    ) -> Result<Self, ActivationError> {
        if let Some(dangling) = mappings
            .iter()
            .find(|m| !handlers.contains_key(m.handler_name()))
        {
            return Err(ActivationError::DanglingMapping {
                pattern: dangling.url_pattern().to_string(),
                handler: dangling.handler_name().to_string(),
            });
        }
        Ok(Self {
            handlers,
            mappings,
            context: None,
        })
    }

    /// Keep `context` alive for as long as this table (or a copy) is published.
    pub fn with_context(mut self, context: Arc<dyn HandlerContext>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn handlers(&self) -> &HashMap<String, Arc<dyn Handler>> {
        &self.handlers
    }

    /// Mappings in declaration order.
    pub fn mappings(&self) -> &[MappingEntry] {
        &self.mappings
    }

    /// Copy of this table with `name` inserted or overwritten.
    pub fn with_handler(&self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        let mut next = self.clone();
        next.handlers.insert(name.into(), handler);
        next
    }

    /// Copy of this table with a different handler set and the same mappings.
    pub fn with_handlers(
        &self,
        handlers: HashMap<String, Arc<dyn Handler>>,
    ) -> Result<Self, ActivationError> {
        let mut next = Self::new(handlers, self.mappings.clone())?;
        next.context = self.context.clone();
        Ok(next)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort_unstable();
        f.debug_struct("HandlerTable")
            .field("handlers", &names)
            .field("mappings", &self.mappings)
            .finish()
    }
}
