//! Configuration schema definitions.
//!
//! Two documents are described here: the server configuration and the
//! per-application handler descriptor (`WEB-INF/handler.toml`).
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the WebSocket server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Where deployed applications live.
    pub applications: ApplicationsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8589").
    pub bind_address: String,

    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8589".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Deployed application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationsConfig {
    /// Directory whose subdirectories are the deployed applications.
    pub webapps_dir: PathBuf,

    /// Reload an application when its descriptor changes on disk.
    pub watch: bool,
}

impl Default for ApplicationsConfig {
    fn default() -> Self {
        Self {
            webapps_dir: PathBuf::from("webapps"),
            watch: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

// --- Application descriptor (WEB-INF/handler.toml) ---

/// Raw application descriptor as written on disk.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct DescriptorFile {
    /// Application-wide parameters.
    pub context_param: Vec<ParamEntry>,

    /// Handler declarations, in file order.
    pub handler: Vec<HandlerEntry>,

    /// URL pattern mappings, in file order.
    pub handler_mapping: Vec<MappingEntryFile>,
}

/// A `param-name` / `param-value` pair.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParamEntry {
    pub param_name: String,
    pub param_value: String,
}

/// A `[[handler]]` table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct HandlerEntry {
    pub handler_name: String,
    /// Type identifier registered with `HandlerTypes`.
    pub handler_class: Option<String>,
    pub init_param: Vec<ParamEntry>,
}

/// A `[[handler-mapping]]` table.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct MappingEntryFile {
    pub url_pattern: String,
    pub handler_name: String,
}
