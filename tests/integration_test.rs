// ABOUTME: End-to-end tests driving the full reader -> analyzer -> evaluator pipeline (spec.md §8)

use ptc_lisp::driver::{self, Outcome};
use ptc_lisp::error::RuntimeError;
use ptc_lisp::value::Value;

fn no_tools(name: &str, _args: Value, _memory: &mut Value) -> Result<Value, RuntimeError> {
    Err(RuntimeError::ToolError { name: name.to_string(), reason: "no tools configured".to_string() })
}

fn run(source: &str) -> Outcome {
    driver::run(source, Value::map(vec![]), Value::map(vec![]), no_tools)
}

fn run_with_ctx(source: &str, ctx: Value) -> Outcome {
    driver::run(source, ctx, Value::map(vec![]), no_tools)
}

#[test]
fn arithmetic_and_collections_compose() {
    let outcome = run("(reduce + 0 (map inc (filter even? (range 10))))");
    // evens in 0..10: 0 2 4 6 8 -> inc: 1 3 5 7 9 -> sum: 25
    assert_eq!(outcome, Outcome::Completed { value: Value::Int(25), memory: Value::map(vec![]) });
}

#[test]
fn let_shadows_def_and_ctx_is_visible() {
    let ctx = Value::map(vec![(Value::keyword("y"), Value::Int(1))]);
    let outcome = run_with_ctx("(do (def x 10) (let [x 5] (+ x ctx/y)))", ctx);
    assert_eq!(outcome, Outcome::Completed { value: Value::Int(6), memory: Value::map(vec![]) });
}

#[test]
fn closure_over_let_binding() {
    let outcome = run("(let [add5 (fn [x] (+ x 5))] (add5 10))");
    assert_eq!(outcome, Outcome::Completed { value: Value::Int(15), memory: Value::map(vec![]) });
}

#[test]
fn threading_macro_desugars_left_to_right() {
    let outcome = run("(-> {:a 1} (assoc :b 2) (get :b))");
    assert_eq!(outcome, Outcome::Completed { value: Value::Int(2), memory: Value::map(vec![]) });
}

#[test]
fn keyword_as_function_looks_up_map() {
    let outcome = run("(map :name [{:name \"a\"} {:name \"b\"}])");
    match outcome {
        Outcome::Completed { value, .. } => {
            assert_eq!(value, Value::vector(vec![Value::string("a"), Value::string("b")]));
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[test]
fn return_form_short_circuits_with_payload() {
    let outcome = run("(do (def x 1) (return {:value (+ x 1)}) (return {:value 999}))");
    match outcome {
        Outcome::Returned { value, .. } => {
            assert_eq!(value, Value::map(vec![(Value::keyword("value"), Value::Int(2))]));
        }
        other => panic!("expected Returned, got {other:?}"),
    }
}

#[test]
fn fail_form_carries_an_arbitrary_reason() {
    let outcome = run("(fail \"missing required field\")");
    match outcome {
        Outcome::Failed { reason, .. } => assert_eq!(reason, Value::string("missing required field")),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn call_tool_reaches_the_host_executor() {
    let outcome = driver::run(
        "(call \"echo\" {:msg \"hi\"})",
        Value::map(vec![]),
        Value::map(vec![]),
        |name, args, _memory| match name {
            "echo" => Ok(args),
            other => Err(RuntimeError::ToolError { name: other.to_string(), reason: "unexpected".to_string() }),
        },
    );
    match outcome {
        Outcome::Completed { value, .. } => {
            assert_eq!(value, Value::map(vec![(Value::keyword("msg"), Value::string("hi"))]));
        }
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[test]
fn empty_program_reads_as_nil() {
    assert_eq!(run(""), Outcome::Completed { value: Value::Nil, memory: Value::map(vec![]) });
}

#[test]
fn unbound_var_is_a_runtime_error_not_a_panic() {
    let outcome = run("undefined-name");
    assert!(matches!(outcome, Outcome::Error(_)));
}

#[test]
fn analysis_error_surfaces_for_malformed_special_form() {
    // `if` requires exactly 3 arguments.
    let outcome = run("(if true)");
    assert!(matches!(outcome, Outcome::Error(_)));
}

#[test]
fn where_predicate_compares_a_record_field() {
    let outcome = run("((where [:score] > 10) {:score 42})");
    assert_eq!(outcome, Outcome::Completed { value: Value::Bool(true), memory: Value::map(vec![]) });
}

#[test]
fn all_of_combinator_requires_every_predicate() {
    let outcome = run("((all-of (where [:score] > 10) (where [:active] truthy)) {:score 42 :active true})");
    assert_eq!(outcome, Outcome::Completed { value: Value::Bool(true), memory: Value::map(vec![]) });
}
