//! Leaf operations on a single mapping level.
//!
//! `key` is the leaf inside `map`; `full_key` is what the caller asked for
//! and is what errors report.

use crate::error::Result;
use crate::permissions::{Action, Permissions};
use crate::value::{Mapping, Value};

/// Checks the permission a write to `key` needs: modify if present, create otherwise.
///
/// `map` is `None` when the mapping the key would land in does not exist yet.
pub(crate) fn check_write(permissions: Permissions, map: Option<&Mapping>, key: &str, full_key: &str) -> Result<()> {
	let action = if map.is_some_and(|m| m.contains_key(key)) {
		Action::Modify
	} else {
		Action::Create
	};
	permissions.check(action, Some(full_key))
}

pub(crate) fn insert(map: &mut Mapping, key: &str, full_key: &str, value: Value) {
	tracing::trace!(domain = "registry", key = full_key, kind = value.type_name(), "set");
	map.insert(key.to_owned(), value);
}

pub(crate) fn is_empty(map: Option<&Mapping>, key: &str) -> bool {
	map.and_then(|m| m.get(key)).is_none_or(Value::is_empty_like)
}

pub(crate) fn remove(map: Option<&mut Mapping>, key: &str, full_key: &str) {
	if map.and_then(|m| m.shift_remove(key)).is_some() {
		tracing::trace!(domain = "registry", key = full_key, "deleted");
	}
}
