//! Hierarchical, permission-gated key-value registry.
//!
//! Two registry kinds share one contract, [`Registry`]:
//!
//! - [`FlatScope`] - a single mapping with plain keys
//! - [`HierarchicalScope`] - nested mappings addressed by delimited paths (`a/b/c`)
//!
//! Values may alias other keys with the marker `~~> path`; reads follow
//! aliases transparently and report cycles and dangling targets as errors.
//! Every mutation is gated by a [`Permissions`] bitmask.
//!
//! Registries are plain owned values. [`GlobalRegistry`] adds an explicit
//! per-kind global slot for applications that want one.

mod error;
mod flat;
mod global;
mod hierarchical;
mod leaf;
mod permissions;
mod registry;
mod resolver;
mod value;

pub use error::{CHAIN_SEPARATOR, RegistryError, Result};
pub use flat::FlatScope;
pub use global::GlobalRegistry;
pub use hierarchical::{DEFAULT_DELIMITER, HierarchicalScope};
pub use permissions::{Action, Permissions};
pub use registry::Registry;
pub use resolver::{Lookup, Resolved, resolve};
pub use value::{Mapping, REFERENCE_MARKER, Value, parse_reference, tag_mapping};
