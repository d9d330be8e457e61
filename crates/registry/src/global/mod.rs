//! Process-wide registry slots.
//!
//! Each registry kind has one slot per thread. Nothing is created
//! implicitly: the application installs an instance at its composition
//! root and tears it down when done. Shorthands fail with
//! [`RegistryError::NotInstalled`] on an empty slot.
//!
//! Slots are not reentrant; calling a shorthand from inside
//! [`GlobalRegistry::with_global`] panics.

use std::cell::RefCell;

use crate::error::{RegistryError, Result};
use crate::flat::FlatScope;
use crate::hierarchical::HierarchicalScope;
use crate::permissions::Permissions;
use crate::registry::Registry;
use crate::value::{Mapping, Value};


thread_local! {
	static FLAT: RefCell<Option<FlatScope>> = const { RefCell::new(None) };
	static HIERARCHICAL: RefCell<Option<HierarchicalScope>> = const { RefCell::new(None) };
}

/// A registry kind with a global slot.
pub trait GlobalRegistry: Registry + 'static {
	/// Runs `f` with this kind's slot.
	fn with_slot<R>(f: impl FnOnce(&RefCell<Option<Self>>) -> R) -> R;

	/// Builds an instance for [`GlobalRegistry::get_or_install`].
	fn create(scope: Mapping, permissions: Permissions) -> Self;

	/// Installs `instance`, returning the one it replaced.
	fn install(instance: Self) -> Option<Self> {
		tracing::debug!(domain = "registry", kind = Self::KIND, "global registry installed");
		Self::with_slot(|slot| slot.replace(Some(instance)))
	}

	/// Installs a registry built from `scope` unless one is already installed.
	///
	/// Returns `true` if a new instance was installed.
	fn get_or_install(scope: Mapping, permissions: Permissions) -> bool {
		let installed = Self::with_slot(|slot| {
			let mut slot = slot.borrow_mut();
			if slot.is_some() {
				return false;
			}
			*slot = Some(Self::create(scope, permissions));
			true
		});
		if installed {
			tracing::debug!(domain = "registry", kind = Self::KIND, "global registry installed");
		}
		installed
	}

	/// Removes and returns the installed instance.
	fn teardown() -> Option<Self> {
		Self::with_slot(|slot| slot.take())
	}

	fn is_installed() -> bool {
		Self::with_slot(|slot| slot.borrow().is_some())
	}

	/// Runs `f` against the installed instance.
	fn with_global<R>(f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
		Self::with_slot(|slot| {
			let mut slot = slot.borrow_mut();
			let instance = slot.as_mut().ok_or(RegistryError::NotInstalled(Self::KIND))?;
			f(instance)
		})
	}

	fn global_set(key: &str, value: impl Into<Value>) -> Result<()> {
		Self::with_global(|r| r.set(key, value))
	}

	fn global_exists(key: &str) -> Result<bool> {
		Self::with_global(|r| Ok(r.exists(key)))
	}

	fn global_is_empty(key: &str) -> Result<bool> {
		Self::with_global(|r| Ok(r.is_empty(key)))
	}

	/// Strict read through the global instance; the value is cloned out of the slot.
	fn global_get(key: &str) -> Result<Value> {
		Self::with_global(|r| r.get(key).cloned())
	}

	fn global_get_or(key: &str, default: Value) -> Result<Value> {
		Self::with_global(|r| Ok(r.try_get(key)?.cloned().unwrap_or(default)))
	}

	/// Clones the whole global scope.
	fn global_scope() -> Result<Mapping> {
		Self::with_global(|r| Ok(r.scope().clone()))
	}

	fn global_delete(key: &str) -> Result<()> {
		Self::with_global(|r| r.delete(key))
	}

	fn global_override(scope: Mapping) -> Result<()> {
		Self::with_global(|r| r.override_scope(scope))
	}
}

impl GlobalRegistry for FlatScope {
	fn with_slot<R>(f: impl FnOnce(&RefCell<Option<Self>>) -> R) -> R {
		FLAT.with(f)
	}

	fn create(scope: Mapping, permissions: Permissions) -> Self {
		Self::with_permissions(scope, permissions)
	}
}

impl GlobalRegistry for HierarchicalScope {
	fn with_slot<R>(f: impl FnOnce(&RefCell<Option<Self>>) -> R) -> R {
		HIERARCHICAL.with(f)
	}

	fn create(scope: Mapping, permissions: Permissions) -> Self {
		Self::with_permissions(scope, permissions)
	}
}
