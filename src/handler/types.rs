//! Handler type registration.
//!
//! Descriptors name a handler's backing type by a string identifier
//! (`handler-class`). The identifiers are resolved through this map, which is
//! populated at startup; an identifier nobody registered fails validation
//! before any handler is constructed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::builtin::{BroadcastHandler, EchoHandler};
use super::Handler;

/// Creates a fresh, uninitialized handler.
pub type HandlerConstructor = Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>;

/// Map from type identifier to constructor.
#[derive(Clone, Default)]
pub struct HandlerTypes {
    constructors: HashMap<String, HandlerConstructor>,
}

impl HandlerTypes {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with the built-in `echo` and `broadcast` types.
    pub fn with_builtins() -> Self {
        let mut types = Self::new();
        types.register(EchoHandler::TYPE, || Box::new(EchoHandler::default()));
        types.register(BroadcastHandler::TYPE, || Box::new(BroadcastHandler::default()));
        types
    }

    /// Register (or replace) the constructor for `identifier`.
    pub fn register<F>(&mut self, identifier: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Handler> + Send + Sync + 'static,
    {
        self.constructors
            .insert(identifier.into(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }

    /// Construct a new instance, or `None` for an unknown identifier.
    pub fn instantiate(&self, identifier: &str) -> Option<Box<dyn Handler>> {
        self.constructors.get(identifier).map(|ctor| ctor())
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl fmt::Debug for HandlerTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.identifiers().collect();
        ids.sort_unstable();
        f.debug_struct("HandlerTypes").field("identifiers", &ids).finish()
    }
}
