//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of the server config (serde handles syntactic)
//! - Turn a raw descriptor into typed records
//! - Check referential integrity (mappings reference declared handlers)
//!
//! # Design Decisions
//! - Server config validation returns all errors, not just the first
//! - Descriptor validation stops at the first error: any one of them is
//!   fatal to the application
//! - Both run before anything is instantiated

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use crate::config::descriptor::{
    normalize_url_pattern, ApplicationDescriptor, HandlerDescriptor, InitParameters,
    MappingDeclaration,
};
use crate::config::schema::{DescriptorFile, ServerConfig};
use crate::error::ConfigurationError;

/// A single semantic problem in the server config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate the server config, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("'{}' is not a socket address", config.listener.bind_address),
        });
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError {
            field: "listener.max_connections",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.applications.webapps_dir.as_os_str().is_empty() {
        errors.push(ValidationError {
            field: "applications.webapps_dir",
            message: "must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert a raw descriptor into validated, ordered records.
///
/// Duplicate handler names keep the first declaration. A repeated URL pattern
/// keeps its first position and takes the later handler name.
pub fn validate_descriptor(file: DescriptorFile) -> Result<ApplicationDescriptor, ConfigurationError> {
    let context_parameters: InitParameters = file
        .context_param
        .into_iter()
        .map(|p| (p.param_name, p.param_value))
        .collect();

    let mut seen = HashSet::new();
    let mut handlers = Vec::with_capacity(file.handler.len());
    for (index, entry) in file.handler.into_iter().enumerate() {
        let name = entry.handler_name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigurationError::MissingHandlerName { index });
        }

        if !seen.insert(name.clone()) {
            tracing::debug!(handler = %name, "Duplicate handler declaration ignored");
            continue;
        }

        let class = match entry.handler_class.as_deref().map(str::trim) {
            Some(class) if !class.is_empty() => class.to_string(),
            _ => return Err(ConfigurationError::MissingHandlerClass { handler: name }),
        };

        handlers.push(HandlerDescriptor {
            name,
            class,
            init_parameters: entry
                .init_param
                .into_iter()
                .map(|p| (p.param_name, p.param_value))
                .collect(),
        });
    }

    let mut mappings: Vec<MappingDeclaration> = Vec::with_capacity(file.handler_mapping.len());
    for entry in file.handler_mapping {
        let url_pattern = normalize_url_pattern(entry.url_pattern.trim());
        let handler_name = entry.handler_name.trim().to_string();

        if !seen.contains(&handler_name) {
            return Err(ConfigurationError::UnknownHandler {
                pattern: url_pattern,
                handler: handler_name,
            });
        }

        if let Some(existing) = mappings.iter_mut().find(|m| m.url_pattern == url_pattern) {
            tracing::warn!(
                pattern = %url_pattern,
                previous = %existing.handler_name,
                handler = %handler_name,
                "Duplicate url-pattern, later handler-name replaces earlier one"
            );
            existing.handler_name = handler_name;
            continue;
        }

        mappings.push(MappingDeclaration {
            url_pattern,
            handler_name,
        });
    }

    Ok(ApplicationDescriptor {
        context_parameters,
        handlers,
        mappings,
    })
}
