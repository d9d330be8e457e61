use std::cell::RefCell;
use std::rc::Rc;

use hive_registry::{Value, mapping};
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

/// Handler appending `label` to the `order` list argument.
fn record(label: &'static str) -> impl Fn(&EventManager, &str, &mut FlatScope) -> Result<(), EventError> {
	move |_, _, args| {
		let mut order = args.try_get("order")?.and_then(Value::as_str).unwrap_or_default().to_owned();
		if !order.is_empty() {
			order.push(',');
		}
		order.push_str(label);
		args.set("order", order)?;
		Ok(())
	}
}

fn order(args: &FlatScope) -> String {
	args.get("order").ok().and_then(Value::as_str).unwrap_or_default().to_owned()
}

#[test]
fn handlers_run_by_priority_then_subscription_order() {
	let events = EventManager::new();
	events.add_handler("first", "low_a", Priority::LOW, record("LowA")).unwrap();
	events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap();
	events.add_handler("first", "low_b", Priority::LOW, record("LowB")).unwrap();
	events.add_handler("first", "b", Priority::DEFAULT, record("B")).unwrap();
	events.add_handler("first", "high", Priority::HIGH, record("High")).unwrap();

	let mut args = EventManager::args(mapping! {});
	events.fire("first", &mut args).unwrap();
	assert_eq!(order(&args), "High,A,B,LowA,LowB");
	assert_eq!(events.handler_ids("first"), ["low_a", "a", "low_b", "b", "high"]);
}

#[test]
fn break_key_stops_the_chain() {
	let events = EventManager::new();
	events.add_handler("first", "a", Priority::HIGH, record("A")).unwrap();
	events
		.add_handler("first", "stop", Priority::DEFAULT, |_, _, args| {
			args.set(BREAK_KEY, true)?;
			Ok(())
		})
		.unwrap();
	events.add_handler("first", "b", Priority::LOW, record("B")).unwrap();

	let mut args = EventManager::args(mapping! {});
	events.fire("first", &mut args).unwrap();
	assert_eq!(order(&args), "A");
}

#[test]
fn duplicate_handler_is_not_added() {
	let events = EventManager::new();
	assert!(events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap());
	assert!(!events.add_handler("first", "a", Priority::HIGH, record("other")).unwrap());

	let mut args = EventManager::args(mapping! {});
	events.fire("first", &mut args).unwrap();
	assert_eq!(order(&args), "A");
}

#[rstest]
#[case(0, true)]
#[case(98, true)]
#[case(99, false)]
#[case(200, false)]
fn priority_bounds(#[case] value: u8, #[case] valid: bool) {
	let priority = Priority::new(value);
	assert_eq!(priority.is_ok(), valid);
	if let Err(err) = priority {
		assert_eq!(err, EventError::InvalidPriority(value));
		assert_eq!(err.to_string(), "Invalid event priority");
	}
}

#[test]
fn event_without_handlers_is_skipped() {
	let events = EventManager::new();
	let mut args = EventManager::args(mapping! { "k" => "v" });
	events.fire("nobody", &mut args).unwrap();
	assert_eq!(args.scope(), &mapping! { "k" => "v" });
}

#[test]
fn firing_from_own_chain_fails() {
	let events = EventManager::new();
	events
		.add_handler("first", "nested", Priority::DEFAULT, |events, name, args| events.fire(name, args))
		.unwrap();

	let mut args = EventManager::args(mapping! {});
	let err = events.fire("first", &mut args).unwrap_err();
	assert_eq!(err, EventError::FiredAlready("first".into()));
	assert_eq!(err.to_string(), "Event 'first' is fired already");

	// The guard is released after a failed chain.
	events.drop_handlers("first", None).unwrap();
	events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap();
	events.fire("first", &mut args).unwrap();
	assert_eq!(order(&args), "A");
}

#[test]
fn fire_again_allows_nested_run() {
	let events = EventManager::new();
	events
		.add_handler("count", "nested", Priority::DEFAULT, |events, name, args| {
			let depth = args.try_get("depth")?.and_then(Value::as_int).unwrap_or(0);
			if depth < 2 {
				args.set("depth", depth + 1)?;
				events.fire_again(name, args)?;
			}
			Ok(())
		})
		.unwrap();

	let mut args = EventManager::args(mapping! {});
	events.fire("count", &mut args).unwrap();
	assert_eq!(args.get("depth").unwrap(), &Value::Int(2));
}

#[test]
fn disabled_event_is_skipped_until_enabled() {
	let events = EventManager::new();
	events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap();
	events.disable_handler("first").unwrap();
	assert!(events.is_disabled("first"));

	let mut args = EventManager::args(mapping! {});
	events.fire("first", &mut args).unwrap();
	assert_eq!(order(&args), "");

	events.enable_handler("first").unwrap();
	events.fire("first", &mut args).unwrap();
	assert_eq!(order(&args), "A");
}

#[test]
fn drop_single_handler_or_all() {
	let events = EventManager::new();
	events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap();
	events.add_handler("first", "b", Priority::DEFAULT, record("B")).unwrap();

	events.drop_handlers("first", Some("a")).unwrap();
	assert!(!events.has_handlers("first", Some("a")));
	assert!(events.has_handlers("first", Some("b")));

	events.drop_handlers("first", None).unwrap();
	assert!(!events.has_handlers("first", None));
	assert!(events.handler_ids("first").is_empty());
}

#[rstest]
#[case(":log:")]
#[case(":onEventEnd:")]
fn debug_events_cannot_be_dropped_or_disabled(#[case] name: &str) {
	let events = EventManager::new();
	assert_eq!(events.drop_handlers(name, None).unwrap_err().to_string(), "Cannot drop debug event");
	assert_eq!(events.disable_handler(name).unwrap_err().to_string(), "Cannot disable debug event");
}

/// Subscribes to every debug event and collects `(event, level, name)`.
fn trace(events: &EventManager) -> Rc<RefCell<Vec<(String, String, String)>>> {
	let seen = Rc::new(RefCell::new(Vec::new()));
	for debug_event in events.debug_events() {
		let seen = Rc::clone(&seen);
		events
			.add_handler(debug_event, "trace", Priority::DEFAULT, move |_, event, args| {
				assert_eq!(args.get("source")?.as_str(), Some(DEBUG_SOURCE));
				let text = |key: &str| args.try_get(key).ok().flatten().and_then(Value::as_str).unwrap_or_default().to_owned();
				seen.borrow_mut().push((event.to_owned(), text("level"), text("name")));
				Ok(())
			})
			.unwrap();
	}
	seen
}

#[test]
fn debug_mode_traces_dispatch() {
	let events = EventManager::new();
	events.set_debug(true);
	let seen = trace(&events);

	events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap();
	events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap();
	events.fire("first", &mut EventManager::args(mapping! {})).unwrap();
	events.disable_handler("first").unwrap();
	events.enable_handler("first").unwrap();
	events.drop_handlers("first", Some("a")).unwrap();

	let seen = seen.borrow().clone();
	let expected: Vec<_> = [
		(":onAddHandler:", "E_NOTICE"),
		(":onAddHandler:", "E_WARNING"),
		(":onEventStart:", "E_NOTICE"),
		(":onHandlerFound:", "E_NOTICE"),
		(":onEventEnd:", "E_NOTICE"),
		(":onDisableHandler:", "E_NOTICE"),
		(":onEnableHandler:", "E_NOTICE"),
		(":onDropHandlers:", "E_NOTICE"),
	]
	.into_iter()
	.map(|(e, l)| (e.to_owned(), l.to_owned(), "first".to_owned()))
	.collect();
	assert_eq!(seen, expected);
}

#[test]
fn broken_chain_ends_with_warning() {
	let events = EventManager::new();
	events
		.add_handler("first", "stop", Priority::DEFAULT, |_, _, args| {
			args.set(BREAK_KEY, "stop")?;
			Ok(())
		})
		.unwrap();
	events.set_debug(true);
	let seen = trace(&events);

	events.fire("first", &mut EventManager::args(mapping! {})).unwrap();
	let last = seen.borrow().last().cloned().unwrap();
	assert_eq!(last, (":onEventEnd:".to_owned(), "E_WARNING".to_owned(), "first".to_owned()));
}

#[test]
fn debug_off_fires_no_traces() {
	let events = EventManager::new();
	let seen = trace(&events);
	events.add_handler("first", "a", Priority::DEFAULT, record("A")).unwrap();
	events.fire("first", &mut EventManager::args(mapping! {})).unwrap();
	assert!(seen.borrow().is_empty());
}

#[test]
fn args_keep_references_verbatim() {
	let args = EventManager::args(mapping! { "path" => "~~> a/b" });
	assert_eq!(args.get("path").unwrap(), &Value::from("~~> a/b"));
}

#[test]
fn handler_failure_stops_dispatch() {
	let events = EventManager::new();
	events
		.add_handler("first", "fail", Priority::HIGH, |_, _, _| {
			Err(EventError::Handler {
				handler: "fail".into(),
				message: "disk full".into(),
			})
		})
		.unwrap();
	events.add_handler("first", "a", Priority::LOW, record("A")).unwrap();

	let mut args = EventManager::args(mapping! {});
	let err = events.fire("first", &mut args).unwrap_err();
	assert_eq!(err.to_string(), "handler 'fail' failed: disk full");
	assert_eq!(order(&args), "");
}

#[test]
fn guard_outlives_nested_fire_again() {
	let events = EventManager::new();
	events
		.add_handler("first", "nested", Priority::DEFAULT, |events, name, args| {
			if args.exists("inner") {
				return Ok(());
			}
			args.set("inner", true)?;
			events.fire_again(name, args)?;
			events.fire(name, args)
		})
		.unwrap();

	let err = events.fire("first", &mut EventManager::args(mapping! {})).unwrap_err();
	assert_eq!(err, EventError::FiredAlready("first".into()));
}
