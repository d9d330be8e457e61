//! Named events with prioritized handlers.
//!
//! Handlers subscribe to an event name under a handler id and run in
//! ascending [`Priority`] order, ties in subscription order. Arguments travel
//! in a [`FlatScope`] that handlers may modify; setting a non-empty
//! [`BREAK_KEY`] stops the chain.
//!
//! In debug mode every operation on a regular event is mirrored to one of
//! the [`DEBUG_EVENTS`], so log targets can trace dispatch.
//!
//! ```
//! use hive_bootstrap::event::{EventManager, Priority};
//! use hive_registry::{Registry, mapping};
//!
//! let events = EventManager::new();
//! events
//! 	.add_handler("saved", "count", Priority::DEFAULT, |_, _, args| {
//! 		args.set("count", 1)?;
//! 		Ok(())
//! 	})
//! 	.unwrap();
//!
//! let mut args = EventManager::args(mapping! {});
//! events.fire("saved", &mut args).unwrap();
//! assert!(args.exists("count"));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use hive_registry::{FlatScope, Mapping, Permissions, Registry, RegistryError, Value, mapping};
use indexmap::IndexMap;

use crate::log::Level;

#[cfg(test)]
mod tests;

/// Argument that stops the handler chain once non-empty.
pub const BREAK_KEY: &str = ":break:";

/// `source` argument of debug events.
pub const DEBUG_SOURCE: &str = "core:event:debug";

/// Events carrying log messages and dispatch traces.
pub const DEBUG_EVENTS: [&str; 8] = [
	":log:",
	":onAddHandler:",
	":onEventStart:",
	":onHandlerFound:",
	":onEventEnd:",
	":onDisableHandler:",
	":onEnableHandler:",
	":onDropHandlers:",
];

/// Event carrying a log message in its `level`, `source` and `message` args.
pub const LOG_EVENT: &str = DEBUG_EVENTS[0];

pub fn is_debug_event(name: &str) -> bool {
	DEBUG_EVENTS.contains(&name)
}

/// Handler position in a chain. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
	pub const MAX: Self = Self(0);
	pub const HIGH: Self = Self(25);
	pub const DEFAULT: Self = Self(50);
	pub const LOW: Self = Self(75);
	/// Exclusive upper bound; not a valid priority itself.
	pub const MIN: u8 = 99;

	pub fn new(value: u8) -> Result<Self, EventError> {
		if value < Self::MIN { Ok(Self(value)) } else { Err(EventError::InvalidPriority(value)) }
	}

	pub fn get(self) -> u8 {
		self.0
	}
}

impl Default for Priority {
	fn default() -> Self {
		Self::DEFAULT
	}
}

/// Event errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
	#[error("Invalid event priority")]
	InvalidPriority(u8),
	#[error("Event '{0}' is fired already")]
	FiredAlready(String),
	#[error("Cannot drop debug event")]
	CannotDropDebugEvent(String),
	#[error("Cannot disable debug event")]
	CannotDisableDebugEvent(String),
	/// Failure reported by a handler.
	#[error("handler '{handler}' failed: {message}")]
	Handler { handler: String, message: String },
	#[error(transparent)]
	Registry(#[from] RegistryError),
}

/// Event handler: receives the manager, the event name and the arguments.
pub type Handler = dyn Fn(&EventManager, &str, &mut FlatScope) -> Result<(), EventError>;

struct Subscription {
	priority: Priority,
	handler: Rc<Handler>,
}

/// Registry of event handlers.
///
/// Methods take `&self` so handlers can subscribe, drop or fire other
/// events while a chain runs.
#[derive(Default)]
pub struct EventManager {
	handlers: RefCell<IndexMap<String, IndexMap<String, Subscription>>>,
	disabled: RefCell<HashSet<String>>,
	firing: RefCell<HashSet<String>>,
	debug: Cell<bool>,
	next_uid: Cell<i64>,
}

impl EventManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Argument bag for [`fire`](Self::fire): keys are taken verbatim and
	/// references are not resolved.
	pub fn args(scope: Mapping) -> FlatScope {
		FlatScope::with_permissions(scope, Permissions::ALL)
	}

	pub fn set_debug(&self, debug: bool) {
		self.debug.set(debug);
	}

	pub fn is_debug(&self) -> bool {
		self.debug.get()
	}

	pub fn debug_events(&self) -> &'static [&'static str] {
		&DEBUG_EVENTS
	}

	/// Subscribes `handler` to `name` under `id`.
	///
	/// Returns `false` without replacing anything when `id` is already
	/// subscribed to `name`.
	pub fn add_handler<F>(&self, name: &str, id: impl Into<String>, priority: Priority, handler: F) -> Result<bool, EventError>
	where
		F: Fn(&EventManager, &str, &mut FlatScope) -> Result<(), EventError> + 'static,
	{
		let id = id.into();
		let added = {
			let mut handlers = self.handlers.borrow_mut();
			let chain = handlers.entry(name.to_owned()).or_default();
			if chain.contains_key(&id) {
				false
			} else {
				chain.insert(
					id.clone(),
					Subscription {
						priority,
						handler: Rc::new(handler),
					},
				);
				true
			}
		};
		tracing::trace!(domain = "event", event = name, handler = id.as_str(), priority = priority.get(), added, "handler subscribed");

		if self.traces(name) {
			let level = if added { Level::Notice } else { Level::Warning };
			self.fire_debug(
				":onAddHandler:",
				mapping! {
					"name" => name,
					"handler" => id.as_str(),
					"added" => added,
				},
				level,
			)?;
		}
		Ok(added)
	}

	/// Whether `name` has handlers, or the handler `id` when given.
	pub fn has_handlers(&self, name: &str, id: Option<&str>) -> bool {
		self.handlers
			.borrow()
			.get(name)
			.is_some_and(|chain| match id {
				Some(id) => chain.contains_key(id),
				None => !chain.is_empty(),
			})
	}

	/// Handler ids of `name` in subscription order.
	pub fn handler_ids(&self, name: &str) -> Vec<String> {
		self.handlers
			.borrow()
			.get(name)
			.map(|chain| chain.keys().cloned().collect())
			.unwrap_or_default()
	}

	/// Unsubscribes handler `id` from `name`, or every handler when `id` is `None`.
	pub fn drop_handlers(&self, name: &str, id: Option<&str>) -> Result<(), EventError> {
		if is_debug_event(name) {
			return Err(EventError::CannotDropDebugEvent(name.to_owned()));
		}
		if self.is_debug() {
			self.fire_debug(
				":onDropHandlers:",
				mapping! {
					"name" => name,
					"handler" => id,
				},
				Level::Notice,
			)?;
		}

		let mut handlers = self.handlers.borrow_mut();
		match id {
			Some(id) => {
				if let Some(chain) = handlers.get_mut(name) {
					chain.shift_remove(id);
					if chain.is_empty() {
						handlers.shift_remove(name);
					}
				}
			}
			None => {
				handlers.shift_remove(name);
			}
		}
		tracing::trace!(domain = "event", event = name, handler = ?id, "handlers dropped");
		Ok(())
	}

	/// Makes [`fire`](Self::fire) skip `name` until it is enabled again.
	pub fn disable_handler(&self, name: &str) -> Result<(), EventError> {
		if is_debug_event(name) {
			return Err(EventError::CannotDisableDebugEvent(name.to_owned()));
		}
		if self.is_debug() {
			self.fire_debug(":onDisableHandler:", mapping! { "name" => name }, Level::Notice)?;
		}
		self.disabled.borrow_mut().insert(name.to_owned());
		Ok(())
	}

	pub fn enable_handler(&self, name: &str) -> Result<(), EventError> {
		if self.is_debug() {
			self.fire_debug(":onEnableHandler:", mapping! { "name" => name }, Level::Notice)?;
		}
		self.disabled.borrow_mut().remove(name);
		Ok(())
	}

	pub fn is_disabled(&self, name: &str) -> bool {
		self.disabled.borrow().contains(name)
	}

	/// Runs the handlers of `name`.
	///
	/// Events without handlers and disabled events are skipped. Firing an
	/// event from inside its own chain fails with
	/// [`EventError::FiredAlready`]; see [`fire_again`](Self::fire_again).
	pub fn fire(&self, name: &str, args: &mut FlatScope) -> Result<(), EventError> {
		self.dispatch(name, args, false)
	}

	/// Like [`fire`](Self::fire), but allowed while `name` is already running.
	pub fn fire_again(&self, name: &str, args: &mut FlatScope) -> Result<(), EventError> {
		self.dispatch(name, args, true)
	}

	fn dispatch(&self, name: &str, args: &mut FlatScope, again: bool) -> Result<(), EventError> {
		let traced = self.traces(name);
		let uid = self.next_uid.get();
		self.next_uid.set(uid + 1);

		if traced {
			self.fire_debug(
				":onEventStart:",
				mapping! {
					"uid" => uid,
					"name" => name,
					"args" => Value::Map(args.scope().clone()),
				},
				Level::Notice,
			)?;
		}

		if let Some(chain) = self.chain(name) {
			if !again && self.firing.borrow().contains(name) {
				return Err(EventError::FiredAlready(name.to_owned()));
			}
			let outermost = self.firing.borrow_mut().insert(name.to_owned());
			let result = self.run_chain(name, uid, &chain, args, traced);
			if outermost {
				self.firing.borrow_mut().remove(name);
			}
			result?;
		}

		if traced {
			let broken = !args.is_empty(BREAK_KEY);
			self.fire_debug(
				":onEventEnd:",
				mapping! {
					"uid" => uid,
					"name" => name,
					"args" => Value::Map(args.scope().clone()),
				},
				if broken { Level::Warning } else { Level::Notice },
			)?;
		}
		Ok(())
	}

	fn run_chain(&self, name: &str, uid: i64, chain: &[(String, Rc<Handler>)], args: &mut FlatScope, traced: bool) -> Result<(), EventError> {
		for (id, handler) in chain {
			if traced {
				self.fire_debug(
					":onHandlerFound:",
					mapping! {
						"uid" => uid,
						"name" => name,
						"handler" => id.as_str(),
						"args" => Value::Map(args.scope().clone()),
					},
					Level::Notice,
				)?;
			}
			handler(self, name, args)?;
			if !args.is_empty(BREAK_KEY) {
				tracing::trace!(domain = "event", event = name, handler = id.as_str(), "chain broken");
				break;
			}
		}
		Ok(())
	}

	/// Snapshot of the chain of `name` in run order, `None` when there is
	/// nothing to run.
	fn chain(&self, name: &str) -> Option<Vec<(String, Rc<Handler>)>> {
		if self.is_disabled(name) {
			return None;
		}
		let handlers = self.handlers.borrow();
		let chain = handlers.get(name).filter(|chain| !chain.is_empty())?;
		let mut ordered: Vec<_> = chain.iter().collect();
		ordered.sort_by_key(|(_, sub)| sub.priority);
		Some(ordered.into_iter().map(|(id, sub)| (id.clone(), Rc::clone(&sub.handler))).collect())
	}

	fn traces(&self, name: &str) -> bool {
		self.is_debug() && !is_debug_event(name)
	}

	fn fire_debug(&self, event: &str, mut scope: Mapping, level: Level) -> Result<(), EventError> {
		scope.insert("source".into(), DEBUG_SOURCE.into());
		scope.insert("level".into(), level.name().into());
		self.fire(event, &mut Self::args(scope))
	}
}

impl fmt::Debug for EventManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let handlers = self.handlers.borrow();
		let events: IndexMap<&str, Vec<&str>> = handlers
			.iter()
			.map(|(name, chain)| (name.as_str(), chain.keys().map(String::as_str).collect()))
			.collect();
		f.debug_struct("EventManager")
			.field("handlers", &events)
			.field("disabled", &self.disabled.borrow())
			.field("debug", &self.is_debug())
			.finish_non_exhaustive()
	}
}
