// ABOUTME: Full-pipeline tests for string operations (spec.md §4.4), complementing
// the unit tests inside src/builtins/strings.rs

use ptc_lisp::driver::{self, Outcome};
use ptc_lisp::error::RuntimeError;
use ptc_lisp::value::Value;

fn run(source: &str) -> Value {
    let outcome = driver::run(source, Value::map(vec![]), Value::map(vec![]), no_tools);
    match outcome {
        Outcome::Completed { value, .. } => value,
        other => panic!("expected Completed for {source:?}, got {other:?}"),
    }
}

fn no_tools(name: &str, _args: Value, _memory: &mut Value) -> Result<Value, RuntimeError> {
    Err(RuntimeError::ToolError { name: name.to_string(), reason: "no tools configured".to_string() })
}

#[test]
fn str_concatenates_display_forms() {
    assert_eq!(run(r#"(str "count: " 3 " " :ok)"#), Value::string("count: 3 :ok"));
}

#[test]
fn subs_and_join_compose() {
    assert_eq!(run(r#"(join "-" (split (subs "a,b,c,d" 2) ","))"#), Value::string("b-c-d"));
}

#[test]
fn trim_and_replace() {
    assert_eq!(run(r#"(replace (trim "  foo bar  ") "bar" "baz")"#), Value::string("foo baz"));
}

#[test]
fn parse_long_and_double_round_trip_in_arithmetic() {
    assert_eq!(run(r#"(+ (parse-long "3") (parse-double "1.5"))"#), Value::Float(4.5));
}

#[test]
fn parse_long_failure_is_nil_not_an_error() {
    assert_eq!(run(r#"(nil? (parse-long "not a number"))"#), Value::Bool(true));
}

#[test]
fn split_on_empty_delimiter_yields_characters() {
    assert_eq!(run(r#"(count (split "abc" ""))"#), Value::Int(3));
}
