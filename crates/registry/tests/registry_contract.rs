//! Contract tests run against both registry kinds through the [`Registry`] trait.

use hive_registry::{FlatScope, HierarchicalScope, Mapping, Permissions, Registry, RegistryError, Value, mapping};
use rstest::rstest;

fn build<R: Registry>(ctor: fn(Mapping, Permissions) -> R, scope: Mapping, permissions: Permissions) -> R {
	ctor(scope, permissions)
}

fn flat(scope: Mapping, permissions: Permissions) -> FlatScope {
	FlatScope::with_permissions(scope, permissions)
}

fn tree(scope: Mapping, permissions: Permissions) -> HierarchicalScope {
	HierarchicalScope::with_permissions(scope, permissions)
}

fn absent_keys_behave_absent<R: Registry>(registry: R) {
	let default = Value::from("D");
	for key in ["k", "other", "a_b.c"] {
		assert!(!registry.exists(key));
		assert_eq!(registry.get_or(key, &default).unwrap(), &default);
		assert!(registry.is_empty(key));
		assert_eq!(registry.get(key).unwrap_err(), RegistryError::MissingKey(key.into()));
	}
}

#[test]
fn fresh_scopes_have_no_keys() {
	absent_keys_behave_absent(build(flat, Mapping::new(), Permissions::ALL_INCLUSIVE));
	absent_keys_behave_absent(build(tree, Mapping::new(), Permissions::ALL_INCLUSIVE));
}

fn set_then_get<R: Registry>(mut registry: R) {
	let values = [Value::from("text"), Value::Int(42), Value::Bool(false), Value::Null, Value::Float(1.5)];
	for (i, value) in values.into_iter().enumerate() {
		let key = format!("key_{i}");
		registry.set(&key, value.clone()).unwrap();
		assert_eq!(registry.get(&key).unwrap(), &value);
		assert!(registry.exists(&key));
	}
}

#[test]
fn set_then_get_round_trips() {
	set_then_get(build(flat, Mapping::new(), Permissions::ALL_INCLUSIVE));
	set_then_get(build(tree, Mapping::new(), Permissions::ALL_INCLUSIVE));
}

fn scenario<R: Registry>(mut registry: R) {
	assert_eq!(registry.get("x").unwrap(), &Value::from("final"));

	registry.delete("z").unwrap();
	let err = registry.get("x").unwrap_err();
	assert!(matches!(err, RegistryError::InvalidReference { .. }));
	assert_eq!(err.chain().unwrap(), ["x", "y", "z"]);
	assert!(err.to_string().ends_with("z (missing key)"));
}

#[test]
fn reference_chain_then_dangling() {
	let scope = mapping! { "x" => "~~> y", "y" => "~~> z", "z" => "final" };
	scenario(build(flat, scope.clone(), Permissions::ALL_INCLUSIVE));
	scenario(build(tree, scope, Permissions::ALL_INCLUSIVE));
}

fn self_reference<R: Registry>(mut registry: R) {
	registry.set("a", "~~> a").unwrap();
	assert_eq!(
		registry.get("a").unwrap_err(),
		RegistryError::CyclicReference { chain: vec!["a".into(), "a".into()] }
	);
}

#[test]
fn self_reference_is_cyclic() {
	self_reference(build(flat, Mapping::new(), Permissions::ALL_INCLUSIVE));
	self_reference(build(tree, Mapping::new(), Permissions::ALL_INCLUSIVE));
}

fn denies_everything<R: Registry>(mut registry: R) {
	let before = registry.scope().clone();
	let tag = |err: RegistryError| match err {
		RegistryError::PermissionDenied { action, .. } => action.name(),
		other => panic!("unexpected error: {other}"),
	};

	assert_eq!(tag(registry.set("new", 1).unwrap_err()), "ACTION_CREATE");
	assert_eq!(tag(registry.set("key", 1).unwrap_err()), "ACTION_MODIFY");
	assert_eq!(tag(registry.delete("key").unwrap_err()), "ACTION_DELETE");
	assert_eq!(tag(registry.override_scope(Mapping::new()).unwrap_err()), "ACTION_OVERRIDE");
	assert_eq!(registry.scope(), &before);
}

#[test]
fn action_none_denies_all_mutations() {
	denies_everything(build(flat, mapping! { "key" => "value" }, Permissions::NONE));
	denies_everything(build(tree, mapping! { "key" => "value" }, Permissions::NONE));
}

#[rstest]
#[case(Permissions::CREATE, "new", true)]
#[case(Permissions::CREATE, "key", false)]
#[case(Permissions::MODIFY, "new", false)]
#[case(Permissions::MODIFY, "key", true)]
fn set_needs_create_or_modify(#[case] permissions: Permissions, #[case] key: &str, #[case] allowed: bool) {
	let mut registry = HierarchicalScope::with_permissions(mapping! { "key" => "value" }, permissions);
	assert_eq!(registry.set(key, "v").is_ok(), allowed);
}

#[test]
fn hierarchical_slice_is_independent() {
	let mut parent = HierarchicalScope::new(mapping! {
		"shared" => mapping! { "name" => "base" },
		"section" => mapping! {
			"alias" => "~~> shared/name",
			"nested" => mapping! { "deep" => "~~> shared" },
		},
	});

	let mut slice = parent.new_from_key("section").unwrap();
	assert_eq!(
		slice.scope(),
		&mapping! {
			"alias" => "base",
			"nested" => mapping! { "deep" => mapping! { "name" => "base" } },
		}
	);

	slice.set("alias", "changed").unwrap();
	slice.set("nested/deep/name", "changed").unwrap();
	assert_eq!(parent.get("shared/name").unwrap(), &Value::from("base"));

	parent.set("shared/name", "parent change").unwrap();
	assert_eq!(slice.get("alias").unwrap(), &Value::from("changed"));
}
