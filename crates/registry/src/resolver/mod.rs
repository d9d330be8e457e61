//! Reference resolution.
//!
//! Both scope kinds follow `~~> path` aliases through the same loop. The
//! dereference chain is local to each call, so resolution never touches
//! scope state and cannot leave it half-resolved.

use crate::error::{RegistryError, Result};
use crate::value::Value;


/// Raw key lookup used while following a chain.
///
/// Implementations return the stored value without resolving it.
pub trait Lookup {
	fn lookup(&self, key: &str) -> Result<Option<&Value>>;
}

/// A value reached by following references.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<'a> {
	/// Key of the last hop, `None` when the value was not a reference.
	pub target: Option<&'a str>,
	pub value: &'a Value,
}

/// Follows references starting from `value`, which was read at `key`.
///
/// Returns the first non-reference value. A key that reappears in the chain
/// raises [`RegistryError::CyclicReference`]; a hop to an absent key raises
/// [`RegistryError::InvalidReference`], wherever it occurs in the chain.
pub fn resolve<'a, L: Lookup + ?Sized>(scope: &'a L, key: &str, value: &'a Value) -> Result<Resolved<'a>> {
	let mut resolved = Resolved { target: None, value };
	let Value::Reference(_) = value else {
		return Ok(resolved);
	};

	let mut chain = vec![key.to_owned()];
	while let Value::Reference(target) = resolved.value {
		let target = target.as_str();
		if chain.iter().any(|seen| seen == target) {
			chain.push(target.to_owned());
			return Err(RegistryError::CyclicReference { chain });
		}
		chain.push(target.to_owned());

		let Some(next) = scope.lookup(target)? else {
			return Err(RegistryError::InvalidReference { chain });
		};
		resolved = Resolved { target: Some(target), value: next };
	}

	tracing::trace!(domain = "registry", key, hops = chain.len() - 1, "reference resolved");
	Ok(resolved)
}
