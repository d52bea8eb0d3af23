//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (application, handler, pattern, path, connection_id)
//!     → logging.rs (filter + fmt layer, stdout)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Connection ID flows through every per-connection event

pub mod logging;

pub use logging::init_logging;
