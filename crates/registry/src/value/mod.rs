//! Scope values.
//!
//! A [`Value`] is decided once, when it enters a scope: strings carrying the
//! reference marker are stored as [`Value::Reference`] so reads never have to
//! re-match text.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};


/// Prefix that marks a string value as an alias of another key.
pub const REFERENCE_MARKER: &str = "~~> ";

/// Insertion-ordered mapping from key to value.
pub type Mapping = IndexMap<String, Value>;

/// A value stored in a scope.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
	#[default]
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	/// Alias of the value stored at the contained path.
	Reference(String),
	Map(Mapping),
}

impl Value {
	/// Creates a reference to `path`.
	pub fn reference(path: impl Into<String>) -> Self {
		Self::Reference(path.into())
	}

	/// Creates an empty mapping value.
	pub fn map() -> Self {
		Self::Map(Mapping::new())
	}

	/// Returns the type name for diagnostics.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::Float(_) => "float",
			Self::String(_) => "string",
			Self::Reference(_) => "reference",
			Self::Map(_) => "map",
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn is_map(&self) -> bool {
		matches!(self, Self::Map(_))
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(f) => Some(*f),
			Self::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	/// Returns the target path if this value is a reference.
	pub fn as_reference(&self) -> Option<&str> {
		match self {
			Self::Reference(path) => Some(path),
			_ => None,
		}
	}

	pub fn as_map(&self) -> Option<&Mapping> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}

	pub fn as_map_mut(&mut self) -> Option<&mut Mapping> {
		match self {
			Self::Map(map) => Some(map),
			_ => None,
		}
	}

	/// Converts the value into a mapping the way an array cast does:
	/// `Null` becomes empty, a mapping is kept, anything else is wrapped under `"0"`.
	pub fn into_mapping(self) -> Mapping {
		match self {
			Self::Null => Mapping::new(),
			Self::Map(map) => map,
			other => Mapping::from([("0".to_owned(), other)]),
		}
	}

	/// Loose emptiness: `null`, `false`, `0`, `"0"`, `""` and empty mappings.
	///
	/// A reference is never empty; emptiness is judged on the stored value.
	pub fn is_empty_like(&self) -> bool {
		match self {
			Self::Null => true,
			Self::Bool(b) => !b,
			Self::Int(i) => *i == 0,
			Self::Float(f) => *f == 0.0,
			Self::String(s) => s.is_empty() || s == "0",
			Self::Reference(_) => false,
			Self::Map(map) => map.is_empty(),
		}
	}

	/// Tags marker strings as references, recursing into mappings.
	///
	/// `delimiter` is the path delimiter allowed in reference targets, `None`
	/// for flat scopes.
	pub fn tag_references(self, delimiter: Option<char>) -> Self {
		match self {
			Self::String(text) => match parse_reference(&text, delimiter) {
				Some(path) => Self::Reference(path.to_owned()),
				None => Self::String(text),
			},
			Self::Map(map) => Self::Map(tag_mapping(map, delimiter)),
			other => other,
		}
	}
}

/// Tags every marker string in `map`, see [`Value::tag_references`].
pub fn tag_mapping(map: Mapping, delimiter: Option<char>) -> Mapping {
	map.into_iter().map(|(k, v)| (k, v.tag_references(delimiter))).collect()
}

/// Returns the target path if `text` is a reference marker.
///
/// A marker is `~~> ` followed by one or more ASCII letters, digits, `_`, `.`
/// or the delimiter.
pub fn parse_reference(text: &str, delimiter: Option<char>) -> Option<&str> {
	let path = text.strip_prefix(REFERENCE_MARKER)?;
	let valid = !path.is_empty()
		&& path
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || Some(c) == delimiter);
	valid.then_some(path)
}

impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Null => serializer.serialize_unit(),
			Self::Bool(b) => serializer.serialize_bool(*b),
			Self::Int(i) => serializer.serialize_i64(*i),
			Self::Float(f) => serializer.serialize_f64(*f),
			Self::String(s) => serializer.serialize_str(s),
			Self::Reference(path) => serializer.collect_str(&format_args!("{REFERENCE_MARKER}{path}")),
			Self::Map(map) => {
				let mut out = serializer.serialize_map(Some(map.len()))?;
				for (k, v) in map {
					out.serialize_entry(k, v)?;
				}
				out.end()
			}
		}
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::String(s.to_owned())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::String(s)
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Self::Int(i.into())
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Self::Float(f)
	}
}

impl From<Mapping> for Value {
	fn from(map: Mapping) -> Self {
		Self::Map(map)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Self::Null, Into::into)
	}
}

/// Builds a [`Mapping`] from `key => value` pairs.
///
/// Values go through [`Into<Value>`], so nested `mapping!` calls, strings and
/// numbers mix freely.
#[macro_export]
macro_rules! mapping {
	() => {
		$crate::Mapping::new()
	};
	($($key:expr => $value:expr),+ $(,)?) => {{
		let mut map = $crate::Mapping::new();
		$(map.insert(::std::string::String::from($key), $crate::Value::from($value));)+
		map
	}};
}
