//! Registry over nested mappings addressed by delimited paths.
//!
//! A key like `a/b/c` walks mapping `a`, then `b`, and names leaf `c`. Any
//! intermediate segment may hold a reference to another path, in which case
//! the walk continues from wherever that path lands.
//!
//! ```
//! use hive_registry::{HierarchicalScope, Registry, mapping};
//!
//! let registry = HierarchicalScope::new(mapping! {
//! 	"key_1" => "value_1",
//! 	"key_2" => mapping! {
//! 		"key_2_1" => "value_2_1",
//! 		"key_2_2" => "value_2_2",
//! 	},
//! 	"key_3" => "~~> key_2/key_2_2",
//! });
//!
//! assert!(registry.exists("key_1"));
//! assert!(!registry.exists("key_2/key_2_3"));
//! assert_eq!(registry.get("key_3").unwrap().as_str(), Some("value_2_2"));
//! ```
//!
//! # Navigation
//!
//! Paths are resolved in two passes. [`HierarchicalScope::canonical_path`]
//! expands intermediate references into the physical segment path without
//! touching the tree; reads then walk that path immutably, and writes walk it
//! mutably, creating missing mappings on the way. Reads never create
//! structure: a missing or non-mapping intermediate segment means the key is
//! absent.

use crate::error::{RegistryError, Result};
use crate::leaf;
use crate::permissions::{Action, Permissions};
use crate::registry::Registry;
use crate::resolver::{Lookup, Resolved, resolve};
use crate::value::{Mapping, Value, tag_mapping};


/// Default path delimiter.
pub const DEFAULT_DELIMITER: char = '/';

/// A permission-gated tree of mappings with path keys and reference aliasing.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalScope {
	root: Mapping,
	permissions: Permissions,
	delimiter: char,
}

impl HierarchicalScope {
	/// Creates a registry with [`Permissions::ALL_INCLUSIVE`] and `/` as delimiter.
	pub fn new(scope: Mapping) -> Self {
		Self::with_delimiter(scope, Permissions::ALL_INCLUSIVE, DEFAULT_DELIMITER)
	}

	pub fn with_permissions(scope: Mapping, permissions: Permissions) -> Self {
		Self::with_delimiter(scope, permissions, DEFAULT_DELIMITER)
	}

	pub fn with_delimiter(scope: Mapping, permissions: Permissions, delimiter: char) -> Self {
		let mut registry = Self {
			root: Mapping::new(),
			permissions,
			delimiter,
		};
		registry.root = registry.admit_mapping(scope);
		registry
	}

	pub fn delimiter(&self) -> char {
		self.delimiter
	}

	/// Joins `segments` into a key using this registry's delimiter.
	pub fn path(&self, segments: &[&str]) -> String {
		segments.join(&self.delimiter.to_string())
	}

	fn admit(&self, value: Value) -> Value {
		if self.permissions.resolves_references() {
			value.tag_references(Some(self.delimiter))
		} else {
			value
		}
	}

	fn admit_mapping(&self, scope: Mapping) -> Mapping {
		if self.permissions.resolves_references() {
			tag_mapping(scope, Some(self.delimiter))
		} else {
			scope
		}
	}

	/// Expands `key` into its physical segment path, leaf included.
	///
	/// Intermediate segments holding references are replaced by the path
	/// they point at. The returned path may not exist.
	pub fn canonical_path(&self, key: &str) -> Result<Vec<String>> {
		let mut aliases = vec![key.to_owned()];
		self.expand_path(key, &mut aliases)
	}

	/// `aliases` is the stack of references currently being expanded; it is
	/// restored before returning.
	fn expand_path(&self, key: &str, aliases: &mut Vec<String>) -> Result<Vec<String>> {
		let Some((parents, leaf)) = key.rsplit_once(self.delimiter) else {
			return Ok(vec![key.to_owned()]);
		};

		let mut path = Vec::new();
		for segment in parents.split(self.delimiter) {
			path.push(segment.to_owned());
			if !self.permissions.resolves_references() {
				continue;
			}

			let depth = aliases.len();
			while let Some(Value::Reference(target)) = self.value_at(&path) {
				if aliases.iter().any(|seen| seen == target) {
					let mut chain = std::mem::take(aliases);
					chain.push(target.clone());
					return Err(RegistryError::CyclicReference { chain });
				}
				aliases.push(target.clone());
				path = self.expand_path(target, aliases)?;
			}
			aliases.truncate(depth);
		}

		path.push(leaf.to_owned());
		Ok(path)
	}

	fn value_at(&self, path: &[String]) -> Option<&Value> {
		let (first, rest) = path.split_first()?;
		let mut value = self.root.get(first)?;
		for segment in rest {
			value = value.as_map()?.get(segment)?;
		}
		Some(value)
	}

	fn mapping_at(&self, path: &[String]) -> Option<&Mapping> {
		if path.is_empty() {
			return Some(&self.root);
		}
		self.value_at(path)?.as_map()
	}

	fn mapping_at_mut(&mut self, path: &[String]) -> Option<&mut Mapping> {
		let mut map = &mut self.root;
		for segment in path {
			map = map.get_mut(segment)?.as_map_mut()?;
		}
		Some(map)
	}

	/// Walks `path`, replacing absent or non-mapping segments with empty mappings.
	fn vivify(&mut self, path: &[String]) -> &mut Mapping {
		let mut map = &mut self.root;
		for segment in path {
			let slot = map.entry(segment.clone()).or_insert_with(Value::map);
			if !slot.is_map() {
				*slot = Value::map();
			}
			let Value::Map(next) = slot else {
				unreachable!("slot was just made a mapping");
			};
			map = next;
		}
		map
	}

	fn stored(&self, key: &str) -> Option<&Value> {
		let path = self.canonical_path(key).ok()?;
		self.value_at(&path)
	}

	fn read(&self, key: &str) -> Result<Option<Resolved<'_>>> {
		let path = self.canonical_path(key)?;
		let Some(value) = self.value_at(&path) else {
			return Ok(None);
		};
		if !self.permissions.resolves_references() {
			return Ok(Some(Resolved { target: None, value }));
		}
		resolve(self, key, value).map(Some)
	}

	fn join(&self, base: &str, segment: &str) -> String {
		format!("{base}{}{segment}", self.delimiter)
	}

	/// Resolves every reference inside `map`, a copy of the mapping stored at
	/// `physical` and addressed as `logical`.
	///
	/// `expanding` holds the physical paths of the mappings being expanded;
	/// reaching one of them again would copy a mapping into itself.
	fn replace_references(&self, logical: &str, physical: String, map: &mut Mapping, expanding: &mut Vec<String>) -> Result<()> {
		if expanding.contains(&physical) {
			let mut chain = std::mem::take(expanding);
			chain.push(physical);
			return Err(RegistryError::CyclicReference { chain });
		}
		expanding.push(physical);

		for (segment, value) in map.iter_mut() {
			let logical_path = self.join(logical, segment);
			let mut physical_path = self.join(expanding.last().map_or("", String::as_str), segment);

			if let Value::Reference(_) = value {
				let resolved = resolve(self, &logical_path, value)?;
				let target = resolved.target.map(str::to_owned);
				let replacement = resolved.value.clone();
				*value = replacement;
				if let Some(target) = target {
					physical_path = self.canonical_path(&target)?.join(&self.delimiter.to_string());
				}
			}

			if let Value::Map(inner) = value {
				self.replace_references(&logical_path, physical_path, inner, expanding)?;
			}
		}

		expanding.pop();
		Ok(())
	}
}

impl Default for HierarchicalScope {
	fn default() -> Self {
		Self::new(Mapping::new())
	}
}

impl Lookup for HierarchicalScope {
	fn lookup(&self, key: &str) -> Result<Option<&Value>> {
		let path = self.canonical_path(key)?;
		Ok(self.value_at(&path))
	}
}

impl Registry for HierarchicalScope {
	const KIND: &'static str = "hierarchical";

	fn permissions(&self) -> Permissions {
		self.permissions
	}

	fn scope(&self) -> &Mapping {
		&self.root
	}

	/// Stores `value` at the path `key`, creating intermediate mappings.
	///
	/// The permission check runs before any structure is created, so a denied
	/// write leaves the tree untouched.
	fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
		let path = self.canonical_path(key)?;
		let Some((leaf_key, parents)) = path.split_last() else {
			unreachable!("canonical paths always end with the leaf");
		};
		leaf::check_write(self.permissions, self.mapping_at(parents), leaf_key, key)?;

		let value = self.admit(value.into());
		let map = self.vivify(parents);
		leaf::insert(map, leaf_key, key, value);
		Ok(())
	}

	/// Intermediate reference cycles count as absent.
	fn exists(&self, key: &str) -> bool {
		self.stored(key).is_some()
	}

	fn is_empty(&self, key: &str) -> bool {
		self.stored(key).is_none_or(Value::is_empty_like)
	}

	fn try_get(&self, key: &str) -> Result<Option<&Value>> {
		Ok(self.read(key)?.map(|resolved| resolved.value))
	}

	fn delete(&mut self, key: &str) -> Result<()> {
		self.permissions.check(Action::Delete, Some(key))?;
		let path = self.canonical_path(key)?;
		if let Some((leaf_key, parents)) = path.split_last() {
			leaf::remove(self.mapping_at_mut(parents), leaf_key, key);
		}
		Ok(())
	}

	fn override_scope(&mut self, scope: Mapping) -> Result<()> {
		self.permissions.check(Action::Override, None)?;
		self.root = self.admit_mapping(scope);
		tracing::trace!(domain = "registry", kind = Self::KIND, keys = self.root.len(), "scope overridden");
		Ok(())
	}

	/// Slices the resolved value at `key` into a new registry.
	///
	/// References anywhere inside a sliced mapping are replaced by their
	/// values, so the slice never points into the parent's namespace. The
	/// slice gets [`Permissions::ALL_INCLUSIVE`] and keeps this registry's
	/// delimiter rather than [`DEFAULT_DELIMITER`], since log target setup
	/// addresses slice keys with the delimiter the config was loaded with.
	fn new_from_key(&self, key: &str) -> Result<Self> {
		let resolved = self.read(key)?.ok_or_else(|| RegistryError::MissingKey(key.to_owned()))?;
		let physical = self.canonical_path(resolved.target.unwrap_or(key))?.join(&self.delimiter.to_string());
		let mut value = resolved.value.clone();

		if self.permissions.resolves_references()
			&& let Value::Map(map) = &mut value
		{
			self.replace_references(key, physical, map, &mut Vec::new())?;
		}

		tracing::debug!(domain = "registry", kind = Self::KIND, key, "slicing registry");
		Ok(Self::with_delimiter(value.into_mapping(), Permissions::ALL_INCLUSIVE, self.delimiter))
	}
}
