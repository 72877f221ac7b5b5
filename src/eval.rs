// ABOUTME: Tree-walking evaluator: lexical closures, callable dispatch, tool invocation (spec.md §4.3)

use crate::core::{Binding, CoreNode, FieldPathSegment, Pattern, PredCombinatorKind, WhereOp};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::flex;
use crate::value::{Closure, Native, Value};
use std::rc::Rc;

/// Host-supplied synchronous tool callback (spec.md §6). `call_tool` passes
/// a map argument; `ctx_call` passes positional args wrapped in a vector —
/// the adapter decides how to marshal those for the named tool.
pub trait ToolExec {
    fn call(&mut self, name: &str, args: Value, memory: &mut Value) -> Result<Value, RuntimeError>;
}

/// The dynamic state reachable from every recursive `eval` call and from
/// higher-order/native builtins that need to invoke a closure argument or
/// issue a tool call. Passed explicitly rather than through a thread-local
/// (see DESIGN.md).
pub struct Interp<'a> {
    pub ctx: &'a Value,
    pub memory: Value,
    pub tools: &'a mut dyn ToolExec,
    pub top_level: Rc<Environment>,
}

impl<'a> Interp<'a> {
    pub fn new(ctx: &'a Value, memory: Value, tools: &'a mut dyn ToolExec) -> Self {
        Interp {
            ctx,
            memory,
            tools,
            top_level: Environment::new(),
        }
    }
}

/// Evaluates a Core AST node. Memory threading happens via `interp.memory`,
/// mutated in place as tool calls run; the final value of `interp.memory`
/// after the top-level call is the memory' the driver returns.
pub fn eval(node: &CoreNode, env: &Rc<Environment>, interp: &mut Interp) -> Result<Value, RuntimeError> {
    match node {
        CoreNode::Literal(v) => Ok(v.clone()),

        CoreNode::Vector(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval(item, env, interp)?);
            }
            Ok(Value::vector(out))
        }

        CoreNode::Map(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = eval(k, env, interp)?;
                let value = eval(v, env, interp)?;
                out = flex::assoc(&out, key, value);
            }
            Ok(Value::map(out))
        }

        CoreNode::Set(items) => {
            let mut out: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                let v = eval(item, env, interp)?;
                if !out.contains(&v) {
                    out.push(v);
                }
            }
            Ok(Value::set(out))
        }

        CoreNode::Var(name) => env
            .get(name)
            .ok_or_else(|| RuntimeError::UnboundVar(name.clone())),

        CoreNode::Ctx(key) => Ok(flex::get(interp.ctx, &Value::keyword(key.as_str())).unwrap_or(Value::Nil)),

        CoreNode::Memory(key) => {
            Ok(flex::get(&interp.memory, &Value::keyword(key.as_str())).unwrap_or(Value::Nil))
        }

        CoreNode::TurnHistory(n) => {
            let key = format!("*{n}");
            Ok(flex::get(interp.ctx, &Value::keyword(key)).unwrap_or(Value::Nil))
        }

        CoreNode::Let { bindings, body } => {
            let frame = Environment::with_parent(env.clone());
            for Binding { pattern, value } in bindings {
                let v = eval(value, &frame, interp)?;
                bind_pattern(pattern, v, &frame, interp)?;
            }
            eval(body, &frame, interp)
        }

        CoreNode::If { cond, then, els } => {
            if eval(cond, env, interp)?.is_truthy() {
                eval(then, env, interp)
            } else {
                eval(els, env, interp)
            }
        }

        CoreNode::Fn { params, body } => Ok(Value::Closure(Rc::new(Closure {
            params: Rc::new(Pattern::DestructureSeq {
                items: params.clone(),
                rest: None,
            }),
            body: Rc::new((**body).clone()),
            env: env.clone(),
        }))),

        CoreNode::Do(items) => {
            let mut result = Value::Nil;
            for item in items {
                result = eval(item, env, interp)?;
            }
            Ok(result)
        }

        CoreNode::And(items) => {
            let mut result = Value::Bool(true);
            for item in items {
                result = eval(item, env, interp)?;
                if !result.is_truthy() {
                    return Ok(result);
                }
            }
            Ok(result)
        }

        CoreNode::Or(items) => {
            for item in items {
                let v = eval(item, env, interp)?;
                if v.is_truthy() {
                    return Ok(v);
                }
            }
            Ok(Value::Nil)
        }

        CoreNode::Call { callee, args } => {
            let f = eval(callee, env, interp)?;
            let mut arg_values = Vec::with_capacity(args.len());
            for a in args {
                arg_values.push(eval(a, env, interp)?);
            }
            call_value(&f, &arg_values, interp)
        }

        CoreNode::CallTool { name, args } => {
            let args_value = eval(args, env, interp)?;
            let mut memory = std::mem::replace(&mut interp.memory, Value::Nil);
            let result = interp.tools.call(name, args_value, &mut memory);
            interp.memory = memory;
            result
        }

        CoreNode::CtxCall { tool_name, args } => {
            let mut arg_values = Vec::with_capacity(args.len());
            for a in args {
                arg_values.push(eval(a, env, interp)?);
            }
            let mut memory = std::mem::replace(&mut interp.memory, Value::Nil);
            let result = interp
                .tools
                .call(tool_name, Value::vector(arg_values), &mut memory);
            interp.memory = memory;
            result
        }

        CoreNode::Where { path, op, value } => {
            let value_core = match value {
                Some(v) => Some(eval(v, env, interp)?),
                None => None,
            };
            Ok(make_where_predicate(path.clone(), op.clone(), value_core))
        }

        CoreNode::PredCombinator { kind, preds } => {
            let mut compiled = Vec::with_capacity(preds.len());
            for p in preds {
                compiled.push(eval(p, env, interp)?);
            }
            Ok(make_pred_combinator(kind.clone(), compiled))
        }

        CoreNode::Juxt(fns) => {
            let mut compiled = Vec::with_capacity(fns.len());
            for f in fns {
                compiled.push(eval(f, env, interp)?);
            }
            Ok(make_juxt(compiled))
        }

        CoreNode::Def { name, value } => {
            let v = eval(value, env, interp)?;
            interp.top_level.define(name.clone(), v.clone());
            Ok(v)
        }
    }
}

// ============================================================================
// Pattern binding
// ============================================================================

fn bind_pattern(
    pattern: &Pattern,
    value: Value,
    frame: &Rc<Environment>,
    interp: &mut Interp,
) -> Result<(), RuntimeError> {
    match pattern {
        Pattern::Var(name) => {
            frame.define(name.clone(), value);
            Ok(())
        }
        Pattern::DestructureKeys { names, defaults } => {
            for name in names {
                let key = Value::keyword(name.as_str());
                let v = match flex::get(&value, &key) {
                    Some(v) => v,
                    None => default_for(name, defaults, frame, interp)?,
                };
                frame.define(name.clone(), v);
            }
            Ok(())
        }
        Pattern::DestructureMap {
            renames,
            defaults,
            as_name,
        } => {
            for (binding_name, key_name) in renames {
                let key = Value::keyword(key_name.as_str());
                let v = match flex::get(&value, &key) {
                    Some(v) => v,
                    None => default_for(binding_name, defaults, frame, interp)?,
                };
                frame.define(binding_name.clone(), v);
            }
            if let Some(alias) = as_name {
                frame.define(alias.clone(), value.clone());
            }
            Ok(())
        }
        Pattern::DestructureAs { alias, inner } => {
            frame.define(alias.clone(), value.clone());
            bind_pattern(inner, value, frame, interp)
        }
        Pattern::DestructureSeq { items, rest } => {
            let elems: Vec<Value> = match &value {
                Value::Vector(v) => v.as_ref().clone(),
                other => return Err(RuntimeError::type_error("destructure", "vector", other)),
            };
            for (i, item_pattern) in items.iter().enumerate() {
                let v = elems.get(i).cloned().unwrap_or(Value::Nil);
                bind_pattern(item_pattern, v, frame, interp)?;
            }
            if let Some(rest_pattern) = rest {
                let rest_items: Vec<Value> = elems.iter().skip(items.len()).cloned().collect();
                bind_pattern(rest_pattern, Value::vector(rest_items), frame, interp)?;
            }
            Ok(())
        }
    }
}

/// `:or` defaults trigger only on true key-absence (spec.md §8); the
/// default expression is evaluated fresh at the binding site.
fn default_for(
    name: &str,
    defaults: &[(String, CoreNode)],
    frame: &Rc<Environment>,
    interp: &mut Interp,
) -> Result<Value, RuntimeError> {
    match defaults.iter().find(|(n, _)| n == name) {
        Some((_, default_core)) => eval(default_core, frame, interp),
        None => Ok(Value::Nil),
    }
}

// ============================================================================
// Callable dispatch (spec.md §4.3 table)
// ============================================================================

pub fn call_value(f: &Value, args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    match f {
        Value::Closure(closure) => call_closure(closure, args, interp),
        Value::BuiltIn(func) => func(args),
        Value::Native(native) => (native.f)(args, interp),
        Value::Keyword(_) => call_keyword_as_fn(f, args),
        Value::Map(pairs) => {
            if args.is_empty() || args.len() > 2 {
                return Err(RuntimeError::arity_error("map-as-fn", "1-2", args.len()));
            }
            let found = flex::map_get(pairs, &args[0]).cloned();
            Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::Nil)))
        }
        Value::Set(items) => {
            if args.len() != 1 {
                return Err(RuntimeError::arity_error("set-as-fn", "1", args.len()));
            }
            Ok(if items.contains(&args[0]) {
                args[0].clone()
            } else {
                Value::Nil
            })
        }
        other => Err(RuntimeError::NotCallable(other.type_name().to_string())),
    }
}

fn call_keyword_as_fn(keyword: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() || args.len() > 2 {
        return Err(RuntimeError::arity_error("keyword-as-fn", "1-2", args.len()));
    }
    match &args[0] {
        Value::Map(pairs) => {
            let found = flex::map_get(pairs, keyword).cloned();
            Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::Nil)))
        }
        other => Err(RuntimeError::InvalidKeywordCall(format!(
            "cannot call keyword on {}",
            other.type_name()
        ))),
    }
}

fn call_closure(closure: &Rc<Closure>, args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    let params = match closure.params.as_ref() {
        Pattern::DestructureSeq { items, .. } => items,
        _ => unreachable!("closures always wrap params in DestructureSeq"),
    };
    if args.len() != params.len() {
        return Err(RuntimeError::arity_error(
            "closure",
            params.len().to_string(),
            args.len(),
        ));
    }
    let frame = Environment::with_parent(closure.env.clone());
    for (pattern, arg) in params.iter().zip(args.iter()) {
        bind_pattern(pattern, arg.clone(), &frame, interp)?;
    }
    eval(&closure.body, &frame, interp)
}

// ============================================================================
// where / predicate combinators / juxt runtime values
// ============================================================================

fn field_path_key(segment: &FieldPathSegment) -> Value {
    match segment {
        FieldPathSegment::Keyword(k) => Value::Keyword(k.clone()),
        FieldPathSegment::String(s) => Value::String(s.clone()),
    }
}

fn resolve_field_path(row: &Value, path: &[FieldPathSegment]) -> Value {
    let keys: Vec<Value> = path.iter().map(field_path_key).collect();
    flex::get_in(row, &keys).unwrap_or(Value::Nil)
}

fn where_compare(op: &WhereOp, field: &Value, target: Option<&Value>) -> bool {
    match op {
        WhereOp::Truthy => field.is_truthy(),
        WhereOp::Eq => match target {
            Some(t) => field == t,
            None => false,
        },
        WhereOp::NotEq => !where_compare(&WhereOp::Eq, field, target),
        WhereOp::Gt | WhereOp::Lt | WhereOp::Gte | WhereOp::Lte => match (field, target) {
            (Value::Nil, _) | (_, None) => false,
            (a, Some(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => match op {
                    WhereOp::Gt => x > y,
                    WhereOp::Lt => x < y,
                    WhereOp::Gte => x >= y,
                    WhereOp::Lte => x <= y,
                    _ => unreachable!(),
                },
                _ => match (a, b) {
                    (Value::String(sa), Value::String(sb)) => match op {
                        WhereOp::Gt => sa > sb,
                        WhereOp::Lt => sa < sb,
                        WhereOp::Gte => sa >= sb,
                        WhereOp::Lte => sa <= sb,
                        _ => unreachable!(),
                    },
                    _ => false,
                },
            },
        },
        WhereOp::Includes => match (field, target) {
            (Value::Nil, _) | (_, None) => false,
            (Value::String(s), Some(Value::String(needle))) => s.contains(needle.as_ref()),
            (Value::Vector(v), Some(needle)) => v.contains(needle),
            _ => false,
        },
        WhereOp::In => match target {
            None | Some(Value::Nil) => false,
            Some(Value::Vector(v)) => v.contains(field),
            Some(Value::Set(s)) => s.contains(field),
            _ => false,
        },
    }
}

fn make_where_predicate(path: Vec<FieldPathSegment>, op: WhereOp, value: Option<Value>) -> Value {
    let f = move |args: &[Value], _interp: &mut Interp| -> Result<Value, RuntimeError> {
        if args.len() != 1 {
            return Err(RuntimeError::arity_error("where-predicate", "1", args.len()));
        }
        let field = resolve_field_path(&args[0], &path);
        Ok(Value::Bool(where_compare(&op, &field, value.as_ref())))
    };
    Value::Native(Native {
        name: "where",
        f: Rc::new(f),
    })
}

fn make_pred_combinator(kind: PredCombinatorKind, preds: Vec<Value>) -> Value {
    let f = move |args: &[Value], interp: &mut Interp| -> Result<Value, RuntimeError> {
        if args.len() != 1 {
            return Err(RuntimeError::arity_error("pred-combinator", "1", args.len()));
        }
        match kind {
            PredCombinatorKind::All => {
                for p in &preds {
                    if !call_value(p, args, interp)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            PredCombinatorKind::Any => {
                for p in &preds {
                    if call_value(p, args, interp)?.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            PredCombinatorKind::None => {
                for p in &preds {
                    if call_value(p, args, interp)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
        }
    };
    Value::Native(Native {
        name: "pred-combinator",
        f: Rc::new(f),
    })
}

fn make_juxt(fns: Vec<Value>) -> Value {
    let f = move |args: &[Value], interp: &mut Interp| -> Result<Value, RuntimeError> {
        let mut out = Vec::with_capacity(fns.len());
        for f in &fns {
            out.push(call_value(f, args, interp)?);
        }
        Ok(Value::vector(out))
    };
    Value::Native(Native {
        name: "juxt",
        f: Rc::new(f),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_program;
    use crate::reader::read;

    struct StubTools;
    impl ToolExec for StubTools {
        fn call(&mut self, name: &str, args: Value, _memory: &mut Value) -> Result<Value, RuntimeError> {
            Ok(Value::vector(vec![Value::string(name), args]))
        }
    }

    fn run_with_builtins(src: &str) -> Value {
        let raw = read(src).unwrap();
        let core = analyze_program(&raw).unwrap();
        let env = Environment::new();
        crate::builtins::register_all(&env);
        let mut tools = StubTools;
        let mut interp = Interp::new(&Value::map(vec![]), Value::map(vec![]), &mut tools);
        eval(&core, &env, &mut interp).unwrap()
    }

    #[test]
    fn arithmetic() {
        assert_eq!(run_with_builtins("(+ 1 2 3)"), Value::Int(6));
    }

    #[test]
    fn let_and_fn() {
        assert_eq!(
            run_with_builtins("(let [f (fn [x] (+ x 1))] (f 41))"),
            Value::Int(42)
        );
    }

    #[test]
    fn short_fn_mapv() {
        assert_eq!(
            run_with_builtins("(let [f #(+ % 1)] (mapv f [1 2 3]))"),
            Value::vector(vec![Value::Int(2), Value::Int(3), Value::Int(4)])
        );
    }

    #[test]
    fn destructure_with_or_default() {
        assert_eq!(
            run_with_builtins("(let [{:keys [a b] :or {b 99}} {:a 1}] [a b])"),
            Value::vector(vec![Value::Int(1), Value::Int(99)])
        );
    }

    #[test]
    fn and_or_short_circuit_value_not_bool() {
        assert_eq!(run_with_builtins("(or false 5)"), Value::Int(5));
        assert_eq!(run_with_builtins("(and 1 2 3)"), Value::Int(3));
    }

    #[test]
    fn mutual_def_visibility() {
        assert_eq!(
            run_with_builtins("(do (def double (fn [x] (* 2 x))) (double 21))"),
            Value::Int(42)
        );
    }

    #[test]
    fn unbound_var_errors() {
        let raw = read("nope").unwrap();
        let core = analyze_program(&raw).unwrap();
        let env = Environment::new();
        let mut tools = StubTools;
        let mut interp = Interp::new(&Value::map(vec![]), Value::map(vec![]), &mut tools);
        assert!(eval(&core, &env, &mut interp).is_err());
    }
}
