use crate::error::{RegistryError, Result};

bitflags::bitflags! {
	/// Actions a scope allows, plus the orthogonal reference switch.
	///
	/// Bit values are stable; configured bitmasks are read with
	/// [`Permissions::from_bits_truncate`].
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct Permissions: u16 {
		/// New keys may be added.
		const CREATE = 0x0001;
		/// Existing keys may be overwritten.
		const MODIFY = 0x0002;
		/// Keys may be removed.
		const DELETE = 0x0004;
		/// The whole scope may be replaced.
		const OVERRIDE = 0x0008;
		/// Every action bit.
		const ALL = 0x000F;
		/// `~~> path` values are followed on read.
		const REFERENCES = 0x0100;
		/// Every action bit and references.
		const ALL_INCLUSIVE = 0x010F;
	}
}

impl Permissions {
	/// No action allowed, references disabled.
	pub const NONE: Self = Self::empty();

	/// Returns `true` if values are reference-resolved.
	pub const fn resolves_references(self) -> bool {
		self.contains(Self::REFERENCES)
	}

	/// Fails with [`RegistryError::PermissionDenied`] when `action` is not granted.
	pub fn check(self, action: Action, key: Option<&str>) -> Result<()> {
		if self.contains(action.as_set()) {
			return Ok(());
		}
		Err(RegistryError::PermissionDenied {
			action,
			key: key.map(str::to_owned),
		})
	}
}

impl Default for Permissions {
	fn default() -> Self {
		Self::ALL_INCLUSIVE
	}
}

/// A single permission-gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
	Create,
	Modify,
	Delete,
	Override,
}

impl Action {
	/// Returns the bitflag for this action.
	pub const fn as_set(self) -> Permissions {
		match self {
			Self::Create => Permissions::CREATE,
			Self::Modify => Permissions::MODIFY,
			Self::Delete => Permissions::DELETE,
			Self::Override => Permissions::OVERRIDE,
		}
	}

	/// Stable name used in error messages.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Create => "ACTION_CREATE",
			Self::Modify => "ACTION_MODIFY",
			Self::Delete => "ACTION_DELETE",
			Self::Override => "ACTION_OVERRIDE",
		}
	}

	/// Numeric bit value of the action.
	pub const fn code(self) -> u16 {
		self.as_set().bits()
	}
}

impl std::fmt::Display for Action {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

impl From<Action> for Permissions {
	fn from(action: Action) -> Self {
		action.as_set()
	}
}
