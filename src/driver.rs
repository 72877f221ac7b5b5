// ABOUTME: Program entry point: source -> Reader -> Analyzer -> Evaluator (spec.md §6)

use crate::analyzer;
use crate::builtins;
use crate::error::{Failure, RuntimeError};
use crate::eval::{self, Interp, ToolExec};
use crate::reader;
use crate::value::Value;

/// The two reserved tool names that carry a program's outcome (spec.md §6).
/// The analyzer compiles both the dedicated `(return value)` / `(fail reason)`
/// forms and the generic `(call "return"/"fail" args)` form down to the same
/// `CoreNode::CallTool` shape, and the evaluator itself does not special-case
/// either name — this wrapper does, so that `run` can distinguish a `return`
/// from a `fail` from an ordinary in-program runtime error.
const RETURN_TOOL: &str = "return";
const FAIL_TOOL: &str = "fail";

/// Host-visible outcome of a program run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The program called `(return value)` (or `(call "return" value)`).
    Returned { value: Value, memory: Value },
    /// The program called `(fail reason)` (or `(call "fail" reason)`).
    Failed { reason: Value, memory: Value },
    /// The program ran to completion without calling either reserved tool;
    /// its last expression's value is the result.
    Completed { value: Value, memory: Value },
    /// Read, analysis, or runtime error.
    Error(Failure),
}

/// Wraps a host tool callback, intercepting `"return"`/`"fail"` to record
/// the program's outcome without altering the evaluator's control flow —
/// per spec.md, the evaluator just calls them like any other tool.
struct DriverTools<'a> {
    user: &'a mut dyn FnMut(&str, Value, &mut Value) -> Result<Value, RuntimeError>,
    outcome: Option<Outcome>,
}

impl<'a> ToolExec for DriverTools<'a> {
    fn call(&mut self, name: &str, args: Value, memory: &mut Value) -> Result<Value, RuntimeError> {
        match name {
            RETURN_TOOL => {
                self.outcome = Some(Outcome::Returned { value: args.clone(), memory: memory.clone() });
                Ok(args)
            }
            FAIL_TOOL => {
                self.outcome = Some(Outcome::Failed { reason: args.clone(), memory: memory.clone() });
                Ok(args)
            }
            other => (self.user)(other, args, memory),
        }
    }
}

/// Runs one program to completion. `tool_exec` is called for every
/// `call_tool`/`ctx_call` site except the reserved `"return"`/`"fail"` names,
/// which this function intercepts itself.
pub fn run(
    source: &str,
    ctx: Value,
    memory: Value,
    mut tool_exec: impl FnMut(&str, Value, &mut Value) -> Result<Value, RuntimeError>,
) -> Outcome {
    let raw = match reader::read(source) {
        Ok(raw) => raw,
        Err(e) => return Outcome::Error(Failure::Read(e)),
    };
    let core = match analyzer::analyze_program(&raw) {
        Ok(core) => core,
        Err(e) => return Outcome::Error(Failure::Analysis(e)),
    };

    let mut tools = DriverTools { user: &mut tool_exec, outcome: None };
    let (result, final_memory) = {
        let mut interp = Interp::new(&ctx, memory, &mut tools);
        builtins::register_all(&interp.top_level);
        // `def` writes into `interp.top_level`; evaluating against that
        // same Rc (rather than a separate fresh frame) is what makes later
        // `Var` lookups see it.
        let top_env = interp.top_level.clone();
        let result = eval::eval(&core, &top_env, &mut interp);
        (result, interp.memory.clone())
    };

    match result {
        Ok(value) => tools.outcome.take().unwrap_or(Outcome::Completed { value, memory: final_memory }),
        Err(e) => Outcome::Error(Failure::Runtime(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_tools(_: &str, _: Value, _: &mut Value) -> Result<Value, RuntimeError> {
        Err(RuntimeError::Custom("no tools configured".to_string()))
    }

    #[test]
    fn arithmetic_completes_with_value() {
        let outcome = run("(+ 1 2 3)", Value::map(vec![]), Value::map(vec![]), no_tools);
        assert_eq!(outcome, Outcome::Completed { value: Value::Int(6), memory: Value::map(vec![]) });
    }

    #[test]
    fn return_form_is_intercepted() {
        let outcome = run("(return {:value 7})", Value::map(vec![]), Value::map(vec![]), no_tools);
        match outcome {
            Outcome::Returned { value, .. } => {
                assert_eq!(value, Value::map(vec![(Value::keyword("value"), Value::Int(7))]));
            }
            other => panic!("expected Returned, got {other:?}"),
        }
    }

    #[test]
    fn fail_form_is_intercepted() {
        let outcome = run("(fail \"bad input\")", Value::map(vec![]), Value::map(vec![]), no_tools);
        match outcome {
            Outcome::Failed { reason, .. } => assert_eq!(reason, Value::string("bad input")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn def_is_visible_to_later_top_level_forms() {
        let outcome = run(
            "(do (def double (fn [x] (* 2 x))) (double 21))",
            Value::map(vec![]),
            Value::map(vec![]),
            no_tools,
        );
        assert_eq!(outcome, Outcome::Completed { value: Value::Int(42), memory: Value::map(vec![]) });
    }

    #[test]
    fn ctx_ref_reads_host_context() {
        let ctx = Value::map(vec![(Value::keyword("y"), Value::Int(1))]);
        let outcome = run("(+ (def x 5) ctx/y)", ctx, Value::map(vec![]), no_tools);
        match outcome {
            Outcome::Completed { value, .. } => assert_eq!(value, Value::Int(6)),
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn read_error_surfaces_as_failure() {
        let outcome = run("(+ 1", Value::map(vec![]), Value::map(vec![]), no_tools);
        assert!(matches!(outcome, Outcome::Error(Failure::Read(_))));
    }
}
