//! Single-level registry.
//!
//! Keys are plain strings; a key containing `/` is just a key. References
//! use the flat marker syntax (`~~> name` without delimiters).
//!
//! ```
//! use hive_registry::{FlatScope, Permissions, Registry, mapping};
//!
//! let mut registry = FlatScope::with_permissions(
//! 	mapping! {
//! 		"key_1" => "value_1",
//! 		"ref_1" => "~~> ref_value",
//! 		"ref_value" => "final reference value",
//! 	},
//! 	Permissions::ALL_INCLUSIVE & !Permissions::MODIFY,
//! );
//!
//! assert!(registry.exists("key_1"));
//! assert_eq!(registry.get("ref_1").unwrap().as_str(), Some("final reference value"));
//! assert!(registry.set("key_2", "value_2").is_ok());
//! assert!(registry.set("key_1", "value_11").is_err());
//! ```

use crate::error::Result;
use crate::leaf;
use crate::permissions::{Action, Permissions};
use crate::registry::Registry;
use crate::resolver::{Lookup, resolve};
use crate::value::{Mapping, Value, tag_mapping};


/// A permission-gated mapping with single-level reference resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatScope {
	scope: Mapping,
	permissions: Permissions,
}

impl FlatScope {
	/// Creates a registry with [`Permissions::ALL_INCLUSIVE`].
	pub fn new(scope: Mapping) -> Self {
		Self::with_permissions(scope, Permissions::ALL_INCLUSIVE)
	}

	pub fn with_permissions(scope: Mapping, permissions: Permissions) -> Self {
		let mut registry = Self {
			scope: Mapping::new(),
			permissions,
		};
		registry.scope = registry.admit_mapping(scope);
		registry
	}

	fn admit(&self, value: Value) -> Value {
		if self.permissions.resolves_references() {
			value.tag_references(None)
		} else {
			value
		}
	}

	fn admit_mapping(&self, scope: Mapping) -> Mapping {
		if self.permissions.resolves_references() {
			tag_mapping(scope, None)
		} else {
			scope
		}
	}
}

impl Default for FlatScope {
	fn default() -> Self {
		Self::new(Mapping::new())
	}
}

impl Lookup for FlatScope {
	fn lookup(&self, key: &str) -> Result<Option<&Value>> {
		Ok(self.scope.get(key))
	}
}

impl Registry for FlatScope {
	const KIND: &'static str = "flat";

	fn permissions(&self) -> Permissions {
		self.permissions
	}

	fn scope(&self) -> &Mapping {
		&self.scope
	}

	fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
		leaf::check_write(self.permissions, Some(&self.scope), key, key)?;
		let value = self.admit(value.into());
		leaf::insert(&mut self.scope, key, key, value);
		Ok(())
	}

	fn exists(&self, key: &str) -> bool {
		self.scope.contains_key(key)
	}

	fn is_empty(&self, key: &str) -> bool {
		leaf::is_empty(Some(&self.scope), key)
	}

	fn try_get(&self, key: &str) -> Result<Option<&Value>> {
		let Some(value) = self.scope.get(key) else {
			return Ok(None);
		};
		if !self.permissions.resolves_references() {
			return Ok(Some(value));
		}
		Ok(Some(resolve(self, key, value)?.value))
	}

	fn delete(&mut self, key: &str) -> Result<()> {
		self.permissions.check(Action::Delete, Some(key))?;
		leaf::remove(Some(&mut self.scope), key, key);
		Ok(())
	}

	fn override_scope(&mut self, scope: Mapping) -> Result<()> {
		self.permissions.check(Action::Override, None)?;
		self.scope = self.admit_mapping(scope);
		tracing::trace!(domain = "registry", kind = Self::KIND, keys = self.scope.len(), "scope overridden");
		Ok(())
	}

	/// Slices the resolved value at `key` into a new registry.
	///
	/// Only the top-level reference is resolved; references nested inside a
	/// sliced mapping are copied as they are.
	fn new_from_key(&self, key: &str) -> Result<Self> {
		let value = self.get(key)?.clone();
		tracing::debug!(domain = "registry", kind = Self::KIND, key, "slicing registry");
		Ok(Self::new(value.into_mapping()))
	}
}
