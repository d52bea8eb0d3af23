//! Registry construction per deployed application.
//!
//! # Responsibilities
//! - Build one registry and locator per application
//! - Initialize it and attach it to the application manager set
//!
//! # Design Decisions
//! - One call per activation, returning synchronously; no long-lived worker
//! - A failed activation registers nothing; other applications are untouched

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::ActivationError;
use crate::handler::HandlerTypes;
use crate::registry::manager::HandlerManager;
use crate::routing::{HandlerLocator, ResourceLocator};

/// A deployed application: its name (URL prefix) and root folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub webapp_path: PathBuf,
}

impl Application {
    pub fn new(name: impl Into<String>, webapp_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            webapp_path: webapp_path.into(),
        }
    }
}

/// The set of live registries, one per activated application.
#[derive(Debug, Default)]
pub struct ApplicationManagers {
    managers: DashMap<String, Arc<HandlerManager>>,
}

impl ApplicationManagers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a registry, replacing any previous one for the application.
    pub fn attach(&self, manager: Arc<HandlerManager>) -> Option<Arc<HandlerManager>> {
        self.managers
            .insert(manager.application().to_string(), manager)
    }

    pub fn detach(&self, application: &str) -> Option<Arc<HandlerManager>> {
        self.managers.remove(application).map(|(_, m)| m)
    }

    pub fn get(&self, application: &str) -> Option<Arc<HandlerManager>> {
        self.managers.get(application).map(|m| m.value().clone())
    }

    /// The registry whose webapp root contains `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<Arc<HandlerManager>> {
        self.managers
            .iter()
            .find(|m| path.starts_with(m.webapp_path()))
            .map(|m| m.value().clone())
    }

    /// Application names, sorted.
    pub fn applications(&self) -> Vec<String> {
        let mut names: Vec<String> = self.managers.iter().map(|m| m.key().clone()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

/// Builds and wires handler registries.
#[derive(Debug, Clone)]
pub struct HandlerManagerFactory {
    types: Arc<HandlerTypes>,
    locator: Arc<dyn ResourceLocator>,
}

impl HandlerManagerFactory {
    /// Factory using the glob [`HandlerLocator`].
    pub fn new(types: Arc<HandlerTypes>) -> Self {
        Self::with_locator(types, Arc::new(HandlerLocator))
    }

    pub fn with_locator(types: Arc<HandlerTypes>, locator: Arc<dyn ResourceLocator>) -> Self {
        Self { types, locator }
    }

    /// Build and initialize a registry without attaching it anywhere.
    pub fn create(&self, application: &Application) -> Result<Arc<HandlerManager>, ActivationError> {
        let manager = Arc::new(HandlerManager::new(
            application.name.clone(),
            application.webapp_path.clone(),
            self.types.clone(),
            self.locator.clone(),
        ));
        manager.initialize()?;
        Ok(manager)
    }

    /// Build, initialize and attach the registry for `application`.
    pub fn activate(
        &self,
        application: &Application,
        managers: &ApplicationManagers,
    ) -> Result<Arc<HandlerManager>, ActivationError> {
        let manager = self.create(application).inspect_err(|e| {
            tracing::error!(
                application = %application.name,
                webapp_path = %application.webapp_path.display(),
                error = %e,
                "Application activation failed"
            );
        })?;

        if managers.attach(manager.clone()).is_some() {
            tracing::warn!(application = %application.name, "Replaced previously attached registry");
        }
        Ok(manager)
    }
}
