use crate::error::{RegistryError, Result};
use crate::permissions::Permissions;
use crate::value::{Mapping, Value};

/// Operations shared by every registry kind.
///
/// This is the surface collaborators (bootstrap, log configuration) consume;
/// `key` syntax depends on the implementation.
pub trait Registry: Sized {
	/// Short kind name used in diagnostics.
	const KIND: &'static str;

	/// Permissions the registry was constructed with.
	fn permissions(&self) -> Permissions;

	/// The whole scope, references left unresolved.
	fn scope(&self) -> &Mapping;

	/// Stores `value` at `key`.
	///
	/// Requires [`Permissions::CREATE`] for absent keys and
	/// [`Permissions::MODIFY`] for present ones. References are stored, not resolved.
	fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()>;

	/// Returns `true` if `key` is present, whatever its value.
	fn exists(&self, key: &str) -> bool;

	/// Returns `true` if `key` is absent or its stored value is loosely empty.
	fn is_empty(&self, key: &str) -> bool;

	/// Reads `key` with references resolved, `None` when absent.
	fn try_get(&self, key: &str) -> Result<Option<&Value>>;

	/// Reads `key` with references resolved, failing with
	/// [`RegistryError::MissingKey`] when absent.
	fn get(&self, key: &str) -> Result<&Value> {
		self.try_get(key)?.ok_or_else(|| RegistryError::MissingKey(key.to_owned()))
	}

	/// Reads `key` with references resolved, falling back to `default` when absent.
	fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> Result<&'a Value> {
		Ok(self.try_get(key)?.unwrap_or(default))
	}

	/// Removes `key`; absent keys are not an error. Requires [`Permissions::DELETE`].
	fn delete(&mut self, key: &str) -> Result<()>;

	/// Replaces the whole scope. Requires [`Permissions::OVERRIDE`].
	fn override_scope(&mut self, scope: Mapping) -> Result<()>;

	/// Creates an independent registry from the resolved value at `key`.
	fn new_from_key(&self, key: &str) -> Result<Self>;
}
