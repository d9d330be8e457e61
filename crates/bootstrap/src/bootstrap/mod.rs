use std::fmt;
use std::path::{Path, PathBuf};

use hive_registry::{DEFAULT_DELIMITER, FlatScope, GlobalRegistry, HierarchicalScope, Mapping, Permissions, Registry, RegistryError, Value};

use crate::event::{EventError, EventManager};
use crate::ini::{self, IniError};
use crate::log::{self, Level, LogConfigError, LogTarget};


/// Environment variable whose presence marks a web request.
pub const WEB_MARKER_VAR: &str = "DOCUMENT_URI";

/// Where the process runs, stored under `core/env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
	Cli,
	Web,
}

impl Environment {
	/// `Web` when [`WEB_MARKER_VAR`] is set, `Cli` otherwise.
	pub fn detect() -> Self {
		if std::env::var_os(WEB_MARKER_VAR).is_some() { Self::Web } else { Self::Cli }
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Cli => "CLI",
			Self::Web => "web",
		}
	}
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Bootstrap errors.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
	#[error("Cannot open config file \"{}\"", path.display())]
	CannotOpen {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("Cannot parse config file \"{}\"", path.display())]
	CannotParse {
		path: PathBuf,
		#[source]
		source: IniError,
	},
	#[error("cannot parse config: {0}")]
	Parse(#[from] IniError),
	#[error(transparent)]
	Registry(#[from] RegistryError),
	#[error(transparent)]
	LogConfig(#[from] LogConfigError),
}

impl BootstrapError {
	pub const CANNOT_OPEN: u16 = 0x01;
	pub const CANNOT_PARSE: u16 = 0x02;

	/// Numeric error code; registry errors keep their own code.
	pub fn code(&self) -> u16 {
		match self {
			Self::CannotOpen { .. } => Self::CANNOT_OPEN,
			Self::CannotParse { .. } | Self::Parse(_) => Self::CANNOT_PARSE,
			Self::Registry(err) | Self::LogConfig(LogConfigError::Registry(err)) => err.code(),
			Self::LogConfig(_) => 0,
		}
	}
}

/// Options for building the core registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapOptions {
	pub permissions: Permissions,
	pub delimiter: char,
	/// Fixed environment; detected from the process when `None`.
	pub env: Option<Environment>,
}

impl Default for BootstrapOptions {
	fn default() -> Self {
		Self {
			permissions: Permissions::ALL_INCLUSIVE,
			delimiter: DEFAULT_DELIMITER,
			env: None,
		}
	}
}

/// The initialized core: the registry plus what was read out of it.
#[derive(Debug)]
pub struct Core {
	pub registry: HierarchicalScope,
	pub env: Environment,
	/// Value of `core/event/debug`.
	pub event_debug: bool,
	/// Event manager, in debug mode when `event_debug` is set.
	pub events: EventManager,
	pub log_targets: Vec<LogTarget>,
}

/// What stays with the caller once the registry is installed globally.
#[derive(Debug)]
pub struct Runtime {
	pub env: Environment,
	pub events: EventManager,
	pub log_targets: Vec<LogTarget>,
}

impl Core {
	/// Subscribes the log targets to [`Core::events`]; see [`log::route`].
	pub fn route_logs<S>(&self, sink: S) -> Result<(), EventError>
	where
		S: Fn(&LogTarget, Level, &FlatScope) + 'static,
	{
		log::route(&self.events, &self.log_targets, sink)
	}

	/// Moves the registry into the global hierarchical slot.
	pub fn install_global(self) -> Runtime {
		if HierarchicalScope::install(self.registry).is_some() {
			tracing::debug!(domain = "bootstrap", "replaced previously installed registry");
		}
		Runtime {
			env: self.env,
			events: self.events,
			log_targets: self.log_targets,
		}
	}
}

/// Entry points building a [`Core`] from config.
pub struct Bootstrap;

impl Bootstrap {
	/// Reads and parses the INI file at `path`.
	pub fn init_by_path(path: impl AsRef<Path>, options: BootstrapOptions) -> Result<Core, BootstrapError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| BootstrapError::CannotOpen {
			path: path.to_path_buf(),
			source,
		})?;
		let config = ini::parse(&text).map_err(|source| BootstrapError::CannotParse {
			path: path.to_path_buf(),
			source,
		})?;
		tracing::debug!(domain = "bootstrap", path = %path.display(), "config loaded");
		Self::init_by_mapping(config, options)
	}

	pub fn init_by_str(text: &str, options: BootstrapOptions) -> Result<Core, BootstrapError> {
		Self::init_by_mapping(ini::parse(text)?, options)
	}

	/// Builds the registry from an already parsed config.
	pub fn init_by_mapping(config: Mapping, options: BootstrapOptions) -> Result<Core, BootstrapError> {
		let mut registry = HierarchicalScope::with_delimiter(config, options.permissions, options.delimiter);
		let env = options.env.unwrap_or_else(Environment::detect);
		let env_key = registry.path(&["core", "env"]);
		registry.set(&env_key, env.as_str())?;

		let event_debug = registry.try_get(&registry.path(&["core", "event", "debug"]))?.is_some_and(is_truthy);
		let events = EventManager::new();
		events.set_debug(event_debug);
		let log_targets = log::collect(&registry, env)?;

		tracing::debug!(domain = "bootstrap", %env, event_debug, targets = log_targets.len(), "core initialized");
		Ok(Core {
			registry,
			env,
			event_debug,
			events,
			log_targets,
		})
	}
}

/// Loose truthiness of config values: empty text, `"0"`, zero and empty
/// mappings are false.
pub(crate) fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Int(i) => *i != 0,
		Value::Float(f) => *f != 0.0,
		Value::String(s) => !s.is_empty() && s != "0",
		Value::Reference(_) => true,
		Value::Map(map) => !map.is_empty(),
	}
}
