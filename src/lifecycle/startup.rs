//! Startup orchestration.
//!
//! # Responsibilities
//! - Discover and activate every deployed application
//! - Start the descriptor watcher when enabled
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - A failing application is logged and skipped; the others still start
//! - Subsystems initialize in order, not concurrently
//! - Listener starts last (traffic only when registries are published)

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::watcher::{DescriptorWatcher, Reloader};
use crate::config::ServerConfig;
use crate::handler::HandlerTypes;
use crate::http::WebSocketServer;
use crate::lifecycle::Shutdown;
use crate::registry::{activate_all, discover_applications, ApplicationManagers, HandlerManagerFactory};

/// Activate every application found under the configured webapps directory.
pub async fn activate_applications(
    config: &ServerConfig,
    factory: Arc<HandlerManagerFactory>,
) -> Result<Arc<ApplicationManagers>, std::io::Error> {
    let managers = Arc::new(ApplicationManagers::new());
    let webapps_dir = &config.applications.webapps_dir;

    if !webapps_dir.is_dir() {
        tracing::warn!(webapps_dir = %webapps_dir.display(), "Webapps directory missing, no applications deployed");
        return Ok(managers);
    }

    let applications = discover_applications(webapps_dir)?;
    let report = activate_all(factory, managers.clone(), applications).await;

    for (application, error) in &report.failed {
        tracing::error!(application = %application, error = %error, "Application not started");
    }

    Ok(managers)
}

/// Run the whole server until `shutdown` fires.
pub async fn run(
    config: ServerConfig,
    types: HandlerTypes,
    shutdown: Shutdown,
) -> Result<(), Box<dyn std::error::Error>> {
    let factory = Arc::new(HandlerManagerFactory::new(Arc::new(types)));
    let managers = activate_applications(&config, factory.clone()).await?;

    // Kept alive for the lifetime of the server.
    let webapps_dir = &config.applications.webapps_dir;
    let _watcher = if config.applications.watch && webapps_dir.is_dir() {
        let reloader = Reloader::new(webapps_dir, factory, managers.clone())?;
        let (watcher, changes) = DescriptorWatcher::new(webapps_dir);
        let watcher = watcher.run()?;
        tokio::spawn(reloader.run(changes, shutdown.subscribe()));
        Some(watcher)
    } else {
        None
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = WebSocketServer::new(config, managers);
    server.run(listener, shutdown.subscribe()).await?;

    Ok(())
}
