//! Type predicates and the `set` constructor
//!
//! `nil? some? boolean? number? string? keyword? vector? set? map? coll?`
//! plus the numeric predicates `zero? pos? neg? even? odd?`.

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;
use std::rc::Rc;

fn unary(args: &[Value], name: &str) -> Result<&Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error(name, crate::error::ARITY_ONE, args.len()));
    }
    Ok(&args[0])
}

pub fn builtin_nil_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "nil?")?, Value::Nil)))
}

/// `(some? v)` is `(not (nil? v))`.
pub fn builtin_some_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(!matches!(unary(args, "some?")?, Value::Nil)))
}

pub fn builtin_boolean_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "boolean?")?, Value::Bool(_))))
}

pub fn builtin_number_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "number?")?, Value::Int(_) | Value::Float(_))))
}

pub fn builtin_string_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "string?")?, Value::String(_))))
}

pub fn builtin_keyword_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "keyword?")?, Value::Keyword(_))))
}

pub fn builtin_vector_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "vector?")?, Value::Vector(_))))
}

pub fn builtin_set_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "set?")?, Value::Set(_))))
}

pub fn builtin_map_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(unary(args, "map?")?, Value::Map(_))))
}

pub fn builtin_coll_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(
        unary(args, "coll?")?,
        Value::Vector(_) | Value::Map(_) | Value::Set(_)
    )))
}

fn numeric(args: &[Value], name: &str) -> Result<f64, RuntimeError> {
    unary(args, name)?
        .as_f64()
        .ok_or_else(|| RuntimeError::type_error(name, "number", &args[0]))
}

pub fn builtin_zero_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(numeric(args, "zero?")? == 0.0))
}

pub fn builtin_pos_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(numeric(args, "pos?")? > 0.0))
}

pub fn builtin_neg_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(numeric(args, "neg?")? < 0.0))
}

fn as_int(v: &Value, name: &str) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(i) => Ok(*i),
        _ => Err(RuntimeError::type_error(name, "int", v)),
    }
}

pub fn builtin_even_p(args: &[Value]) -> Result<Value, RuntimeError> {
    let v = unary(args, "even?")?;
    Ok(Value::Bool(as_int(v, "even?")? % 2 == 0))
}

pub fn builtin_odd_p(args: &[Value]) -> Result<Value, RuntimeError> {
    let v = unary(args, "odd?")?;
    Ok(Value::Bool(as_int(v, "odd?")? % 2 != 0))
}

/// `(set coll)`: builds a deduplicated set from a vector (or the members of
/// an existing set, a no-op).
pub fn builtin_set(args: &[Value]) -> Result<Value, RuntimeError> {
    let v = unary(args, "set")?;
    let items: Vec<Value> = match v {
        Value::Vector(items) => items.as_ref().clone(),
        Value::Set(items) => items.as_ref().clone(),
        other => return Err(RuntimeError::type_error("set", "vector or set", other)),
    };
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    Ok(Value::set(out))
}

pub fn register(env: &Rc<Environment>) {
    env.define("nil?".to_string(), Value::BuiltIn(builtin_nil_p));
    env.define("some?".to_string(), Value::BuiltIn(builtin_some_p));
    env.define("boolean?".to_string(), Value::BuiltIn(builtin_boolean_p));
    env.define("number?".to_string(), Value::BuiltIn(builtin_number_p));
    env.define("string?".to_string(), Value::BuiltIn(builtin_string_p));
    env.define("keyword?".to_string(), Value::BuiltIn(builtin_keyword_p));
    env.define("vector?".to_string(), Value::BuiltIn(builtin_vector_p));
    env.define("set?".to_string(), Value::BuiltIn(builtin_set_p));
    env.define("map?".to_string(), Value::BuiltIn(builtin_map_p));
    env.define("coll?".to_string(), Value::BuiltIn(builtin_coll_p));
    env.define("zero?".to_string(), Value::BuiltIn(builtin_zero_p));
    env.define("pos?".to_string(), Value::BuiltIn(builtin_pos_p));
    env.define("neg?".to_string(), Value::BuiltIn(builtin_neg_p));
    env.define("even?".to_string(), Value::BuiltIn(builtin_even_p));
    env.define("odd?".to_string(), Value::BuiltIn(builtin_odd_p));
    env.define("set".to_string(), Value::BuiltIn(builtin_set));

    for name in [
        "nil?", "some?", "boolean?", "number?", "string?", "keyword?", "vector?", "set?", "map?",
        "coll?", "zero?", "pos?", "neg?", "even?", "odd?", "set",
    ] {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: format!("({name} v)"),
            description: format!("Type predicate/constructor: {name}."),
            examples: vec![],
            related: vec![],
            category: "Type predicates".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_and_some() {
        assert_eq!(builtin_nil_p(&[Value::Nil]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_some_p(&[Value::Int(1)]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_some_p(&[Value::Nil]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn set_dedups() {
        let v = Value::vector(vec![Value::Int(1), Value::Int(1), Value::Int(2)]);
        let result = builtin_set(&[v]).unwrap();
        assert_eq!(result, Value::set(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn even_odd_require_int() {
        assert!(builtin_even_p(&[Value::Float(2.0)]).is_err());
        assert_eq!(builtin_even_p(&[Value::Int(4)]).unwrap(), Value::Bool(true));
    }
}
