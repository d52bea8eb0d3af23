//! Multi-application WebSocket server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                  WEBSOCKET SERVER                    │
//!                        │                                                      │
//!   Upgrade request      │  ┌──────────┐   ┌──────────────┐   ┌─────────────┐  │
//!   GET /chat/admin/x ───┼─▶│   http   │──▶│   registry   │──▶│   routing   │  │
//!                        │  │  server  │   │ (per app)    │   │  locator    │  │
//!                        │  └────┬─────┘   └──────────────┘   └──────┬──────┘  │
//!                        │       │                                   │         │
//!                        │       ▼                                   ▼         │
//!   Frames ◀────────────▶│  ┌──────────┐                     ┌─────────────┐  │
//!                        │  │websocket │◀───── callbacks ───▶│   handler   │  │
//!                        │  │  pump    │                     │  instance   │  │
//!                        │  └──────────┘                     └─────────────┘  │
//!                        │                                                      │
//!                        │  config (server.toml, WEB-INF/handler.toml, watch)   │
//!                        │  lifecycle (startup, signals, shutdown)              │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use websocket_server::config::loader::load_config;
use websocket_server::config::ServerConfig;
use websocket_server::lifecycle::{signals, startup, Shutdown};
use websocket_server::observability::init_logging;
use websocket_server::HandlerTypes;

#[derive(Parser)]
#[command(name = "websocket-server")]
#[command(about = "Routes WebSocket connections to per-application handlers", long_about = None)]
struct Cli {
    /// Server configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the webapps directory.
    #[arg(short, long)]
    webapps: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(webapps) = cli.webapps {
        config.applications.webapps_dir = webapps;
    }

    init_logging(&config.observability)?;

    tracing::info!("websocket-server v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        webapps_dir = %config.applications.webapps_dir.display(),
        watch = config.applications.watch,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    startup::run(config, HandlerTypes::with_builtins(), shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
