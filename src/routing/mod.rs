//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming upgrade (application, handler path)
//!     → locator.rs (walk mapping table in declaration order)
//!     → matcher.rs (glob test of handler path against url-pattern)
//!     → Return: handler instance or HandlerNotFound
//!
//! Table compilation (at activation):
//!     [[handler-mapping]] entries
//!     → Normalize leading slash
//!     → Compile globs
//!     → Freeze as immutable HandlerTable
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at activation, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same input always matches same mapping
//! - First match wins (ordered by declaration)

pub mod locator;
pub mod matcher;

pub use locator::{HandlerLocator, HandlerRequest, ResourceLocator};
pub use matcher::GlobPattern;
