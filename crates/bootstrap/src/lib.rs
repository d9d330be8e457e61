//! Builds a hierarchical registry from an INI config file.
//!
//! [`Bootstrap`] parses the file with [`ini::parse`], wraps the result in a
//! [`HierarchicalScope`](hive_registry::HierarchicalScope), records the
//! runtime environment under `core/env`, collects the log targets
//! configured under `core/log`, and sets up an [`EventManager`] whose debug
//! mode follows `core/event/debug`.
//!
//! ```
//! use hive_bootstrap::{Bootstrap, BootstrapOptions, Environment};
//! use hive_registry::Registry;
//!
//! let options = BootstrapOptions {
//! 	env: Some(Environment::Cli),
//! 	..BootstrapOptions::default()
//! };
//! let core = Bootstrap::init_by_str("[core]\nevent[debug] = On\n", options).unwrap();
//!
//! assert!(core.event_debug);
//! assert!(core.events.is_debug());
//! assert_eq!(core.registry.get("core/env").unwrap().as_str(), Some("CLI"));
//! ```

mod bootstrap;
pub mod event;
pub mod ini;
pub mod log;

pub use bootstrap::{Bootstrap, BootstrapError, BootstrapOptions, Core, Environment, Runtime, WEB_MARKER_VAR};
pub use event::{EventError, EventManager, Priority};
pub use ini::IniError;
pub use log::{DEFAULT_FORMAT, Level, LevelMask, LogConfigError, LogMethod, LogSink, LogTarget};
