//! Configuration loading from disk.
//!
//! Reads the server config and the per-application handler descriptor.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::descriptor::ApplicationDescriptor;
use crate::config::schema::{DescriptorFile, ServerConfig};
use crate::config::validation::{validate_config, validate_descriptor, ValidationError};
use crate::error::ConfigurationError;

/// Directory holding the descriptor, relative to the webapp root.
pub const DESCRIPTOR_DIR: &str = "WEB-INF";

/// Descriptor file name inside [`DESCRIPTOR_DIR`].
pub const DESCRIPTOR_FILE: &str = "handler.toml";

/// Error type for server configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate the server configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ServerConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Location of the descriptor for the application rooted at `webapp_path`.
pub fn descriptor_path(webapp_path: &Path) -> PathBuf {
    webapp_path.join(DESCRIPTOR_DIR).join(DESCRIPTOR_FILE)
}

/// Read the handler descriptor of one application.
///
/// A missing application folder or a missing descriptor is not an error: the
/// application simply declares no handlers and `Ok(None)` is returned.
pub fn load_descriptor(webapp_path: &Path) -> Result<Option<ApplicationDescriptor>, ConfigurationError> {
    if !webapp_path.is_dir() {
        tracing::debug!(webapp_path = %webapp_path.display(), "Application folder missing, no handlers registered");
        return Ok(None);
    }

    let path = descriptor_path(webapp_path);
    if !path.is_file() {
        tracing::debug!(descriptor = %path.display(), "No handler descriptor, no handlers registered");
        return Ok(None);
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigurationError::Io {
        path: path.clone(),
        source,
    })?;
    let file: DescriptorFile =
        toml::from_str(&content).map_err(|source| ConfigurationError::Parse {
            path: path.clone(),
            source,
        })?;

    let descriptor = validate_descriptor(file)?;

    tracing::debug!(
        descriptor = %path.display(),
        handlers = descriptor.handlers.len(),
        mappings = descriptor.mappings.len(),
        "Handler descriptor loaded"
    );

    Ok(Some(descriptor))
}
