//! Log target configuration.
//!
//! Every entry `core/log/<METHOD>/<LEVEL>` of the registry describes one log
//! target. The entry is sliced out of the registry with references resolved,
//! stamped with `name`, `level` and `env`, and turned into a [`LogTarget`].
//! [`route`] subscribes targets to the log and debug events of an
//! [`EventManager`]; writing log lines is left to the sink it is given.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use hive_registry::{FlatScope, HierarchicalScope, Registry, RegistryError, Value};
use indexmap::IndexMap;

use crate::bootstrap::Environment;
use crate::event::{EventError, EventManager, Priority};


/// Format used for levels without a configured one.
pub const DEFAULT_FORMAT: &str = "[ %DATE% %TIME% ] [ %LEVEL% ] [ %SOURCE% ] ~ %MESSAGE%";

/// Source filter entry accepting every source.
pub const ANY_SOURCE: &str = "*";

bitflags! {
	/// Set of message levels a target accepts.
	///
	/// Flag names match the level keys used in config sections.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct LevelMask: u16 {
		const E_ERROR = 1;
		const E_WARNING = 1 << 1;
		const E_NOTICE = 1 << 3;
		const E_ERROR_WARNING = Self::E_ERROR.bits() | Self::E_WARNING.bits();
		const E_ERROR_NOTICE = Self::E_ERROR.bits() | Self::E_NOTICE.bits();
		const E_WARNING_NOTICE = Self::E_WARNING.bits() | Self::E_NOTICE.bits();
		const E_ALL = Self::E_ERROR.bits() | Self::E_WARNING.bits() | Self::E_NOTICE.bits();
	}
}

impl LevelMask {
	/// Mask of a config level key such as `E_ERROR_WARNING`.
	pub fn parse(name: &str) -> Option<Self> {
		Self::from_name(name)
	}
}

/// Severity of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
	Error,
	Warning,
	Notice,
}

impl Level {
	pub const ALL: [Self; 3] = [Self::Error, Self::Warning, Self::Notice];

	pub fn mask(self) -> LevelMask {
		match self {
			Self::Error => LevelMask::E_ERROR,
			Self::Warning => LevelMask::E_WARNING,
			Self::Notice => LevelMask::E_NOTICE,
		}
	}

	/// Config key of the level, e.g. `E_WARNING`.
	pub fn name(self) -> &'static str {
		match self {
			Self::Error => "E_ERROR",
			Self::Warning => "E_WARNING",
			Self::Notice => "E_NOTICE",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|level| level.name() == name)
	}

	/// Fixed-width label for sinks that render `%LEVEL%`.
	pub fn label(self) -> &'static str {
		match self {
			Self::Error => "ERR ",
			Self::Warning => "WARN",
			Self::Notice => "note",
		}
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Backend a target writes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMethod {
	/// Writes to the stream named by the `stream` key.
	Stream,
	/// Writes to the file named by the `path` key.
	File,
	/// Application-provided backend named by the `class` key.
	Custom(String),
}

impl LogMethod {
	fn parse(method: &str, class: Option<&str>) -> Option<Self> {
		if let Some(class) = class.filter(|c| !c.is_empty()) {
			return Some(Self::Custom(class.to_owned()));
		}
		match method {
			"Stream" => Some(Self::Stream),
			"File" => Some(Self::File),
			_ => None,
		}
	}
}

impl fmt::Display for LogMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Stream => f.write_str("Stream"),
			Self::File => f.write_str("File"),
			Self::Custom(class) => f.write_str(class),
		}
	}
}

/// Errors raised while collecting log targets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogConfigError {
	#[error("unknown log level '{level}' for method '{method}'")]
	UnknownLevel { method: String, level: String },
	#[error("unknown log method '{method}' (expected Stream, File, or a 'class' key)")]
	UnknownMethod { method: String },
	#[error(transparent)]
	Registry(#[from] RegistryError),
}

/// A configured log target.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTarget {
	pub method: LogMethod,
	/// Level key the target was configured under.
	pub level_name: String,
	pub levels: LevelMask,
	/// Accepted message sources. Empty accepts nothing.
	pub sources: Vec<String>,
	/// Message format per level for the current environment.
	pub formats: IndexMap<Level, String>,
	/// The target's own registry slice, including backend keys such as
	/// `stream`, `path`, `maxSize`, `rotation` and `rights`.
	pub registry: HierarchicalScope,
}

impl LogTarget {
	/// Builds a target from its registry slice.
	///
	/// `name`, `level` and `env` are written into the slice first.
	pub fn from_slice(method: &str, level: &str, env: Environment, mut registry: HierarchicalScope) -> Result<Self, LogConfigError> {
		let levels = LevelMask::parse(level).ok_or_else(|| LogConfigError::UnknownLevel {
			method: method.to_owned(),
			level: level.to_owned(),
		})?;

		registry.set("name", method)?;
		registry.set("level", level)?;
		registry.set("env", env.as_str())?;

		let class = registry.try_get("class")?.and_then(Value::as_str);
		let kind = LogMethod::parse(method, class).ok_or_else(|| LogConfigError::UnknownMethod { method: method.to_owned() })?;

		let sources = match registry.try_get("source")? {
			Some(Value::Map(list)) => list.values().filter_map(Value::as_str).map(str::to_owned).collect(),
			Some(Value::String(single)) if !single.is_empty() => vec![single.clone()],
			_ => Vec::new(),
		};

		let mut formats = IndexMap::with_capacity(Level::ALL.len());
		for severity in Level::ALL {
			let key = registry.path(&["format", env.as_str(), severity.name()]);
			let format = registry.try_get(&key)?.and_then(Value::as_str).unwrap_or(DEFAULT_FORMAT);
			formats.insert(severity, format.to_owned());
		}

		Ok(Self {
			method: kind,
			level_name: level.to_owned(),
			levels,
			sources,
			formats,
			registry,
		})
	}

	pub fn accepts_level(&self, level: Level) -> bool {
		self.levels.contains(level.mask())
	}

	pub fn accepts_source(&self, source: &str) -> bool {
		self.sources.iter().any(|s| s == source || s == ANY_SOURCE)
	}

	/// Whether a message at `level` from `source` should reach this target.
	pub fn accepts(&self, level: Level, source: &str) -> bool {
		self.accepts_level(level) && self.accepts_source(source)
	}

	pub fn format(&self, level: Level) -> &str {
		self.formats.get(&level).map_or(DEFAULT_FORMAT, String::as_str)
	}

	/// Handler id of the target, e.g. `Stream:E_ERROR`.
	pub fn id(&self) -> String {
		format!("{}:{}", self.method, self.level_name)
	}

	/// Level of the message carried by event `args`, when this target
	/// accepts its `level` and `source`.
	pub fn accepted_level(&self, args: &FlatScope) -> Option<Level> {
		let text = |key: &str| args.try_get(key).ok().flatten().and_then(Value::as_str);
		let level = text("level").and_then(Level::from_name)?;
		self.accepts(level, text("source")?).then_some(level)
	}
}

/// Receives the messages a [`LogTarget`] accepts.
pub type LogSink = dyn Fn(&LogTarget, Level, &FlatScope);

/// Subscribes every target to the log event and the debug events of
/// `events`.
///
/// `sink` is called with each message whose level and source the target
/// accepts. Debug events only fire while `events` is in debug mode.
pub fn route<S>(events: &EventManager, targets: &[LogTarget], sink: S) -> Result<(), EventError>
where
	S: Fn(&LogTarget, Level, &FlatScope) + 'static,
{
	let sink: Rc<LogSink> = Rc::new(sink);
	for target in targets {
		for name in events.debug_events() {
			let target = target.clone();
			let sink = Rc::clone(&sink);
			events.add_handler(name, target.id(), Priority::DEFAULT, move |_, _, args| {
				if let Some(level) = target.accepted_level(args) {
					sink(&target, level, args);
				}
				Ok(())
			})?;
		}
		tracing::debug!(domain = "bootstrap", target = target.id().as_str(), "log target routed");
	}
	Ok(())
}

/// Collects every target configured under `core/log`.
///
/// Targets come out in config order, methods first, then levels.
pub fn collect(registry: &HierarchicalScope, env: Environment) -> Result<Vec<LogTarget>, LogConfigError> {
	let root = registry.path(&["core", "log"]);
	let Some(Value::Map(methods)) = registry.try_get(&root)? else {
		return Ok(Vec::new());
	};

	let mut targets = Vec::new();
	for method in methods.keys() {
		let method_key = registry.path(&[root.as_str(), method.as_str()]);
		let Some(Value::Map(levels)) = registry.try_get(&method_key)? else {
			continue;
		};
		for level in levels.keys() {
			let slice = registry.new_from_key(&registry.path(&[method_key.as_str(), level.as_str()]))?;
			let target = LogTarget::from_slice(method, level, env, slice)?;
			tracing::debug!(domain = "bootstrap", method = method.as_str(), level = level.as_str(), sources = target.sources.len(), "log target configured");
			targets.push(target);
		}
	}
	Ok(targets)
}
