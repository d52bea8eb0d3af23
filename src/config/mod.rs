//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! <webapp>/WEB-INF/handler.toml
//!     → loader.rs (locate & parse; absent = no handlers)
//!     → validation.rs (class present, mappings reference declared handlers)
//!     → descriptor.rs (ApplicationDescriptor, declaration order kept)
//!
//! On descriptor change:
//!     watcher.rs detects change
//!     → registry reload builds a new table
//!     → atomic swap; the old table stays on failure
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All server fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod descriptor;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use descriptor::{ApplicationDescriptor, HandlerDescriptor, InitParameters, MappingDeclaration};
pub use schema::ServerConfig;
pub use schema::{ApplicationsConfig, ListenerConfig, LogFormat, ObservabilityConfig};
