use hive_registry::mapping;
use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

#[test]
fn sections_and_dotted_keys_nest() {
	let text = r#"
; hive config

[defaults.log.format]
E_ERROR   = "[ %LEVEL% ] [ %SOURCE% ] ~ %MESSAGE%"

[core.log.Stream.E_ERROR]
format.CLI = "~~> defaults/log/format"
stream = "stdout"
source[] = "*"
"#;

	assert_eq!(
		parse(text).unwrap(),
		mapping! {
			"defaults" => mapping! {
				"log" => mapping! {
					"format" => mapping! { "E_ERROR" => "[ %LEVEL% ] [ %SOURCE% ] ~ %MESSAGE%" },
				},
			},
			"core" => mapping! {
				"log" => mapping! {
					"Stream" => mapping! {
						"E_ERROR" => mapping! {
							"format" => mapping! { "CLI" => "~~> defaults/log/format" },
							"stream" => "stdout",
							"source" => mapping! { "0" => "*" },
						},
					},
				},
			},
		}
	);
}

#[test]
fn list_and_named_entries() {
	let text = "[core]\nevent[debug] = On\nsource[] = a\nsource[] = b\nsource[extra] = c\n";
	assert_eq!(
		parse(text).unwrap(),
		mapping! {
			"core" => mapping! {
				"event" => mapping! { "debug" => "1" },
				"source" => mapping! { "0" => "a", "1" => "b", "extra" => "c" },
			},
		}
	);
}

#[test]
fn keys_before_any_section_are_top_level() {
	assert_eq!(parse("name = top\n# comment\n").unwrap(), mapping! { "name" => "top" });
}

#[test]
fn empty_section_still_creates_mapping() {
	assert_eq!(parse("[core.log]\n").unwrap(), mapping! { "core" => mapping! { "log" => Mapping::new() } });
}

#[rstest]
#[case("On", "1")]
#[case("yes", "1")]
#[case("TRUE", "1")]
#[case("Off", "")]
#[case("no", "")]
#[case("false", "")]
#[case("None", "")]
#[case("null", "")]
#[case("0666", "0666")]
#[case("plain text ; trailing comment", "plain text")]
#[case(r#""quoted ; kept""#, "quoted ; kept")]
#[case(r#""On""#, "On")]
#[case(r#""say \"hi\" \\o/""#, r#"say "hi" \o/"#)]
#[case(r#""a" ; comment"#, "a")]
#[case("", "")]
fn values(#[case] raw: &str, #[case] expected: &str) {
	let parsed = parse(&format!("key = {raw}")).unwrap();
	assert_eq!(parsed["key"], Value::from(expected));
}

#[rstest]
#[case("[core\n", IniError::MalformedSection { line: 1 })]
#[case("[]\n", IniError::MalformedSection { line: 1 })]
#[case("[a..b]\n", IniError::MalformedSection { line: 1 })]
#[case("[core]\njust words\n", IniError::MissingEquals { line: 2 })]
#[case("\n\n = value\n", IniError::EmptyKey { line: 3 })]
#[case("a..b = value\n", IniError::EmptyKey { line: 1 })]
#[case("list[ ] = value\n", IniError::EmptyKey { line: 1 })]
#[case("key = \"open\n", IniError::UnterminatedString { line: 1 })]
#[case("key = \"closed\" trailing\n", IniError::UnterminatedString { line: 1 })]
fn syntax_errors(#[case] text: &str, #[case] expected: IniError) {
	let err = parse(text).unwrap_err();
	assert_eq!(err, expected);
	assert_eq!(err.line(), expected.line());
}

#[test]
fn error_message_names_line() {
	assert_eq!(parse("ok = 1\noops\n").unwrap_err().to_string(), "line 2: expected 'key = value'");
}

#[test]
fn later_section_value_replaces_scalar() {
	let text = "[a]\nb = scalar\n[a.b]\nc = 1\n";
	assert_eq!(parse(text).unwrap(), mapping! { "a" => mapping! { "b" => mapping! { "c" => "1" } } });
}
