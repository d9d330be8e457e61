//! INI config parsing.
//!
//! Produces a nested [`Mapping`] of strings:
//!
//! - `[a.b.c]` opens section `a` / `b` / `c`; keys below it land there
//! - `format.CLI = x` nests further inside the current section
//! - `source[] = x` appends `"0"`, `"1"`, ... entries; `event[debug] = x` sets a named one
//! - `;` and `#` start comment lines
//!
//! Values are kept as text. Bare `On`/`Yes`/`True` become `"1"` and
//! `Off`/`No`/`False`/`None`/`Null` become `""`, so they can be read back
//! with loose truthiness. Double-quoted values keep their text verbatim
//! apart from the `\"` and `\\` escapes.

use hive_registry::{Mapping, Value};

#[cfg(test)]
mod tests;

/// INI syntax errors. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IniError {
	#[error("line {line}: malformed section header")]
	MalformedSection { line: usize },
	#[error("line {line}: expected 'key = value'")]
	MissingEquals { line: usize },
	#[error("line {line}: empty key")]
	EmptyKey { line: usize },
	#[error("line {line}: unterminated quoted string")]
	UnterminatedString { line: usize },
}

impl IniError {
	pub fn line(&self) -> usize {
		match self {
			Self::MalformedSection { line } | Self::MissingEquals { line } | Self::EmptyKey { line } | Self::UnterminatedString { line } => {
				*line
			}
		}
	}
}

/// How a key stores its value.
enum Slot<'a> {
	Plain,
	Append,
	Named(&'a str),
}

/// Parses INI `text` into a nested mapping.
pub fn parse(text: &str) -> Result<Mapping, IniError> {
	let mut root = Mapping::new();
	let mut section: Vec<String> = Vec::new();

	for (index, raw) in text.lines().enumerate() {
		let line = index + 1;
		let trimmed = raw.trim();
		if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
			continue;
		}

		if let Some(header) = trimmed.strip_prefix('[') {
			section = parse_section(header).ok_or(IniError::MalformedSection { line })?;
			descend(&mut root, &section);
			continue;
		}

		let (key, value) = trimmed.split_once('=').ok_or(IniError::MissingEquals { line })?;
		let (segments, slot) = parse_key(key.trim()).ok_or(IniError::EmptyKey { line })?;
		let value = parse_value(value.trim()).ok_or(IniError::UnterminatedString { line })?;

		let Some((leaf, parents)) = segments.split_last() else {
			return Err(IniError::EmptyKey { line });
		};
		let map = descend(descend(&mut root, &section), parents);
		store(map, leaf, slot, value);
	}

	Ok(root)
}

fn parse_section(header: &str) -> Option<Vec<String>> {
	let name = header.strip_suffix(']')?.trim();
	split_dotted(name)
}

fn split_dotted(name: &str) -> Option<Vec<String>> {
	let segments: Vec<String> = name.split('.').map(|s| s.trim().to_owned()).collect();
	if segments.iter().any(String::is_empty) {
		return None;
	}
	Some(segments)
}

fn parse_key(key: &str) -> Option<(Vec<String>, Slot<'_>)> {
	let (base, slot) = match key.strip_suffix(']').and_then(|k| k.split_once('[')) {
		Some((base, "")) => (base, Slot::Append),
		Some((base, name)) => (base, Slot::Named(name.trim())),
		None => (key, Slot::Plain),
	};
	if let Slot::Named("") = slot {
		return None;
	}
	Some((split_dotted(base.trim())?, slot))
}

/// Returns `None` for an unterminated quoted value.
fn parse_value(text: &str) -> Option<String> {
	let Some(quoted) = text.strip_prefix('"') else {
		let bare = text.split_once(';').map_or(text, |(value, _)| value).trim();
		return Some(keyword(bare).unwrap_or(bare).to_owned());
	};

	let mut out = String::with_capacity(quoted.len());
	let mut chars = quoted.chars();
	while let Some(c) = chars.next() {
		match c {
			'"' => {
				let rest = chars.as_str().trim_start();
				return (rest.is_empty() || rest.starts_with(';') || rest.starts_with('#')).then_some(out);
			}
			'\\' => match chars.next() {
				Some(escaped @ ('"' | '\\')) => out.push(escaped),
				Some(other) => {
					out.push('\\');
					out.push(other);
				}
				None => return None,
			},
			_ => out.push(c),
		}
	}
	None
}

fn keyword(bare: &str) -> Option<&'static str> {
	match bare.to_ascii_lowercase().as_str() {
		"on" | "yes" | "true" => Some("1"),
		"off" | "no" | "false" | "none" | "null" => Some(""),
		_ => None,
	}
}

/// Walks `path` from `map`, replacing absent or scalar entries with mappings.
fn descend<'a>(map: &'a mut Mapping, path: &[String]) -> &'a mut Mapping {
	let mut map = map;
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

fn store(map: &mut Mapping, leaf: &str, slot: Slot<'_>, value: String) {
	match slot {
		Slot::Plain => {
			map.insert(leaf.to_owned(), Value::String(value));
		}
		Slot::Append => {
			let list = descend(map, &[leaf.to_owned()]);
			list.insert(list.len().to_string(), Value::String(value));
		}
		Slot::Named(name) => {
			descend(map, &[leaf.to_owned()]).insert(name.to_owned(), Value::String(value));
		}
	}
}
