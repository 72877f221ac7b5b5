//! Comparison and logic: =, not=, <, >, <=, >=, not, identity
//!
//! Ordering falls back to string comparison when neither side is numeric,
//! matching `where`'s comparator in eval.rs.

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

fn order(a: &Value, b: &Value) -> Result<Ordering, RuntimeError> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(|| RuntimeError::Custom("NaN is unordered".to_string())),
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
            _ => Err(RuntimeError::type_error("comparison", "comparable values", a)),
        },
    }
}

fn chained(args: &[Value], ok: impl Fn(Ordering) -> bool) -> Result<Value, RuntimeError> {
    if args.len() < 2 {
        return Err(RuntimeError::arity_error("comparison", crate::error::ARITY_TWO_OR_MORE, args.len()));
    }
    for pair in args.windows(2) {
        if !ok(order(&pair[0], &pair[1])?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub fn builtin_eq(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() < 2 {
        return Err(RuntimeError::arity_error("=", crate::error::ARITY_TWO_OR_MORE, args.len()));
    }
    Ok(Value::Bool(args.windows(2).all(|pair| pair[0] == pair[1])))
}

pub fn builtin_not_eq(args: &[Value]) -> Result<Value, RuntimeError> {
    match builtin_eq(args)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => unreachable!(),
    }
}

pub fn builtin_lt(args: &[Value]) -> Result<Value, RuntimeError> {
    chained(args, |o| o == Ordering::Less)
}

pub fn builtin_gt(args: &[Value]) -> Result<Value, RuntimeError> {
    chained(args, |o| o == Ordering::Greater)
}

pub fn builtin_le(args: &[Value]) -> Result<Value, RuntimeError> {
    chained(args, |o| o != Ordering::Greater)
}

pub fn builtin_ge(args: &[Value]) -> Result<Value, RuntimeError> {
    chained(args, |o| o != Ordering::Less)
}

/// Logical NOT: `nil`/`false` are falsy, everything else truthy.
pub fn builtin_not(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("not", crate::error::ARITY_ONE, args.len()));
    }
    Ok(Value::Bool(!args[0].is_truthy()))
}

pub fn builtin_identity(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("identity", crate::error::ARITY_ONE, args.len()));
    }
    Ok(args[0].clone())
}

pub fn register(env: &Rc<Environment>) {
    env.define("=".to_string(), Value::BuiltIn(builtin_eq));
    env.define("not=".to_string(), Value::BuiltIn(builtin_not_eq));
    env.define("<".to_string(), Value::BuiltIn(builtin_lt));
    env.define(">".to_string(), Value::BuiltIn(builtin_gt));
    env.define("<=".to_string(), Value::BuiltIn(builtin_le));
    env.define(">=".to_string(), Value::BuiltIn(builtin_ge));
    env.define("not".to_string(), Value::BuiltIn(builtin_not));
    env.define("identity".to_string(), Value::BuiltIn(builtin_identity));

    for (name, sig, desc, related) in [
        ("=", "(= v1 v2 ...)", "Tests if all arguments are equal.", vec!["not="]),
        ("not=", "(not= v1 v2 ...)", "Tests if any two arguments differ.", vec!["="]),
        ("<", "(< n1 n2 ...)", "Tests if arguments are strictly increasing.", vec![">", "<=", ">="]),
        (">", "(> n1 n2 ...)", "Tests if arguments are strictly decreasing.", vec!["<", "<=", ">="]),
        ("<=", "(<= n1 n2 ...)", "Tests if arguments are non-decreasing.", vec!["<", ">", ">="]),
        (">=", "(>= n1 n2 ...)", "Tests if arguments are non-increasing.", vec!["<", ">", "<="]),
        ("not", "(not v)", "Logical negation.", vec![]),
        ("identity", "(identity v)", "Returns its argument unchanged.", vec![]),
    ] {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: sig.to_string(),
            description: desc.to_string(),
            examples: vec![],
            related: related.into_iter().map(String::from).collect(),
            category: "Comparison".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_across_int_float() {
        assert_eq!(builtin_eq(&[Value::Int(1), Value::Float(1.0)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn chained_lt() {
        let args = [Value::Int(1), Value::Int(2), Value::Int(3)];
        assert_eq!(builtin_lt(&args).unwrap(), Value::Bool(true));
        let bad = [Value::Int(1), Value::Int(3), Value::Int(2)];
        assert_eq!(builtin_lt(&bad).unwrap(), Value::Bool(false));
    }

    #[test]
    fn string_ordering_falls_back() {
        let args = [Value::string("a"), Value::string("b")];
        assert_eq!(builtin_lt(&args).unwrap(), Value::Bool(true));
    }
}
