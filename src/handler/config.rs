//! Per-handler configuration and the context handlers see.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use super::Handler;
use crate::config::descriptor::InitParameters;

/// The registry as seen from inside a handler.
pub trait HandlerContext: Send + Sync {
    /// Root of the deployed application.
    fn webapp_path(&self) -> &Path;

    /// Application-wide init parameter.
    fn init_parameter(&self, name: &str) -> Option<String>;

    /// Another published handler of the same application.
    fn handler(&self, name: &str) -> Option<Arc<dyn Handler>>;
}

/// Configuration passed to [`Handler::init`].
#[derive(Clone)]
pub struct HandlerConfig {
    context: Weak<dyn HandlerContext>,
    handler_name: String,
    webapp_path: PathBuf,
    init_parameters: InitParameters,
}

impl HandlerConfig {
    pub fn new(
        context: Weak<dyn HandlerContext>,
        handler_name: impl Into<String>,
        webapp_path: impl Into<PathBuf>,
        init_parameters: InitParameters,
    ) -> Self {
        Self {
            context,
            handler_name: handler_name.into(),
            webapp_path: webapp_path.into(),
            init_parameters,
        }
    }

    /// The owning registry, while this handler's table is published.
    ///
    /// Held weakly: the registry owns its handlers, not the other way round.
    pub fn context(&self) -> Option<Arc<dyn HandlerContext>> {
        self.context.upgrade()
    }

    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    pub fn webapp_path(&self) -> &Path {
        &self.webapp_path
    }

    pub fn init_parameter(&self, name: &str) -> Option<&str> {
        self.init_parameters.get(name)
    }

    pub fn init_parameters(&self) -> &InitParameters {
        &self.init_parameters
    }
}

impl std::fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("handler_name", &self.handler_name)
            .field("webapp_path", &self.webapp_path)
            .field("init_parameters", &self.init_parameters)
            .finish_non_exhaustive()
    }
}
