//! Handler registry subsystem.
//!
//! # Data Flow
//! ```text
//! Activation (once per application):
//!     deployer.rs (discover webapps)
//!     → factory.rs (registry + locator, initialize)
//!     → manager.rs (descriptor → handlers → HandlerTable, publish)
//!     → ApplicationManagers (attached, reachable per connection)
//!
//! Per connection:
//!     ApplicationManagers::get(application)
//!     → HandlerManager::locate(request)
//!     → ResourceLocator over the current HandlerTable
//! ```
//!
//! # Design Decisions
//! - One independent registry per application; no shared handlers
//! - Tables are immutable once published; changes are whole-table swaps

pub mod deployer;
pub mod factory;
pub mod manager;
pub mod table;

pub use deployer::{activate_all, discover_applications, ActivationReport};
pub use factory::{Application, ApplicationManagers, HandlerManagerFactory};
pub use manager::HandlerManager;
pub use table::{HandlerTable, MappingEntry};
