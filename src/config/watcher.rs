//! Descriptor watcher for hot reload.
//!
//! Watches the webapps directory and reloads an application's registry when
//! its `WEB-INF/handler.toml` changes. A reload is a whole-table swap; a
//! broken descriptor leaves the running handlers in place. A descriptor of an
//! application with no registry (newly deployed, or failed at startup)
//! activates it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::config::loader::{DESCRIPTOR_DIR, DESCRIPTOR_FILE};
use crate::registry::{Application, ApplicationManagers, HandlerManagerFactory};

/// A watcher that reports changed application descriptors.
pub struct DescriptorWatcher {
    webapps_dir: PathBuf,
    change_tx: mpsc::UnboundedSender<PathBuf>,
}

impl DescriptorWatcher {
    /// Create a new DescriptorWatcher.
    ///
    /// Returns the watcher and a receiver of changed descriptor paths.
    pub fn new(webapps_dir: &Path) -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        (
            Self {
                webapps_dir: webapps_dir.to_path_buf(),
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The directory is canonicalized first, so reported paths are absolute
    /// even when the configured directory is relative.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let webapps_dir = fs::canonicalize(&self.webapps_dir).map_err(notify::Error::io)?;
        let tx = self.change_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        for path in event.paths.into_iter().filter(|p| is_descriptor(p)) {
                            tracing::info!(descriptor = %path.display(), "Descriptor change detected");
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&webapps_dir, RecursiveMode::Recursive)?;

        tracing::info!(path = ?webapps_dir, "Descriptor watcher started");
        Ok(watcher)
    }
}

/// True for `<anything>/WEB-INF/handler.toml`.
pub fn is_descriptor(path: &Path) -> bool {
    path.file_name().is_some_and(|f| f == DESCRIPTOR_FILE)
        && path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|d| d == DESCRIPTOR_DIR)
}

/// Applies descriptor changes to the running applications.
pub struct Reloader {
    webapps_dir: PathBuf,
    factory: Arc<HandlerManagerFactory>,
    managers: Arc<ApplicationManagers>,
}

impl Reloader {
    /// `webapps_dir` must exist; it is canonicalized to match event paths.
    pub fn new(
        webapps_dir: &Path,
        factory: Arc<HandlerManagerFactory>,
        managers: Arc<ApplicationManagers>,
    ) -> io::Result<Self> {
        Ok(Self {
            webapps_dir: fs::canonicalize(webapps_dir)?,
            factory,
            managers,
        })
    }

    /// Apply changes as they arrive, until shutdown or the sender is gone.
    pub async fn run(
        self,
        mut changes: mpsc::UnboundedReceiver<PathBuf>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                change = changes.recv() => {
                    let Some(path) = change else { break };
                    self.apply(path).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reload loop received shutdown signal, exiting");
                    break;
                }
            }
        }
    }

    async fn apply(&self, descriptor: PathBuf) {
        if let Some(manager) = self.managers.find_by_path(&descriptor) {
            let result = tokio::task::spawn_blocking(move || manager.reload()).await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Reload task panicked");
            }
            return;
        }

        let Some(application) = self.application_for(&descriptor) else {
            tracing::debug!(descriptor = %descriptor.display(), "Change outside any application");
            return;
        };

        tracing::info!(application = %application.name, "Activating application after descriptor change");
        let factory = self.factory.clone();
        let managers = self.managers.clone();
        let result =
            tokio::task::spawn_blocking(move || factory.activate(&application, &managers).map(|_| ()))
                .await;
        // Activation errors are logged by the factory.
        if let Err(e) = result {
            tracing::error!(error = %e, "Activation task panicked");
        }
    }

    /// The application owning `<webapps_dir>/<name>/WEB-INF/handler.toml`.
    fn application_for(&self, descriptor: &Path) -> Option<Application> {
        let webapp = descriptor.parent()?.parent()?;
        if webapp.parent()? != self.webapps_dir {
            return None;
        }
        let name = webapp.file_name()?.to_str()?;
        Some(Application::new(name, webapp))
    }
}
