use crate::permissions::Action;

/// Separator used when rendering a dereference chain.
pub const CHAIN_SEPARATOR: &str = " ~~> ";

/// Registry operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// The scope's permissions lack the bit required by `action`.
	///
	/// `key` is `None` for whole-scope operations.
	#[error("{action}: no permissions{}", key.as_ref().map(|k| format!(" for key '{k}'")).unwrap_or_default())]
	PermissionDenied { action: Action, key: Option<String> },

	/// Strict read of an absent key.
	#[error("Missing key '{0}'")]
	MissingKey(String),

	/// A key reappeared in its own dereference chain.
	///
	/// The chain ends with the repeated key.
	#[error("Cyclic reference detected: {}", chain.join(CHAIN_SEPARATOR))]
	CyclicReference { chain: Vec<String> },

	/// A dereference chain ended at a key that does not exist.
	///
	/// The last element of the chain is the missing key.
	#[error("Invalid reference detected: {} (missing key)", chain.join(CHAIN_SEPARATOR))]
	InvalidReference { chain: Vec<String> },

	/// A global shorthand was used before a registry was installed.
	#[error("no global {0} registry installed")]
	NotInstalled(&'static str),
}

impl RegistryError {
	/// Numeric code of the error: the action bit for permission errors, 0 otherwise.
	pub fn code(&self) -> u16 {
		match self {
			Self::PermissionDenied { action, .. } => action.code(),
			_ => 0,
		}
	}

	/// Returns the dereference chain for reference errors.
	pub fn chain(&self) -> Option<&[String]> {
		match self {
			Self::CyclicReference { chain } | Self::InvalidReference { chain } => Some(chain),
			_ => None,
		}
	}
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
