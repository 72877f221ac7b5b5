//! Arithmetic operations: +, -, *, /, mod, inc, dec, abs, max, min
//!
//! `+` and `*` are variadic with identity 0/1; `-` is variadic-nonempty but
//! unary negates; `/` is binary. Int stays Int unless a Float operand forces
//! promotion (spec.md §4.4).

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::value::Value;
use std::rc::Rc;

fn numeric(v: &Value) -> Result<f64, RuntimeError> {
    v.as_f64()
        .ok_or_else(|| RuntimeError::type_error("arithmetic", "number", v))
}

fn is_float(args: &[Value]) -> bool {
    args.iter().any(|v| matches!(v, Value::Float(_)))
}

fn numeric_result(n: f64, float: bool) -> Value {
    if float {
        Value::Float(n)
    } else {
        Value::Int(n as i64)
    }
}

/// `(+ 1 2 3)` => `6`; `(+)` => `0`.
pub fn builtin_add(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut sum = 0.0;
    for arg in args {
        sum += numeric(arg)?;
    }
    Ok(numeric_result(sum, is_float(args)))
}

/// `(- 10 3 2)` => `5`; `(- 5)` => `-5`.
pub fn builtin_sub(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity_error("-", crate::error::ARITY_AT_LEAST_ONE, 0));
    }
    let first = numeric(&args[0])?;
    if args.len() == 1 {
        return Ok(numeric_result(-first, is_float(args)));
    }
    let mut result = first;
    for arg in &args[1..] {
        result -= numeric(arg)?;
    }
    Ok(numeric_result(result, is_float(args)))
}

/// `(* 2 3 4)` => `24`; `(*)` => `1`.
pub fn builtin_mul(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut product = 1.0;
    for arg in args {
        product *= numeric(arg)?;
    }
    Ok(numeric_result(product, is_float(args)))
}

/// Binary division; `(/ 1 0)` is a runtime error, not a panic.
pub fn builtin_div(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("/", crate::error::ARITY_TWO, args.len()));
    }
    let a = numeric(&args[0])?;
    let b = numeric(&args[1])?;
    if b == 0.0 {
        return Err(RuntimeError::Custom("division by zero".to_string()));
    }
    Ok(numeric_result(a / b, is_float(args) || a / b != (a / b).trunc()))
}

/// `(mod 17 5)` => `2`. Errors on a zero divisor.
pub fn builtin_mod(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("mod", crate::error::ARITY_TWO, args.len()));
    }
    let a = numeric(&args[0])?;
    let b = numeric(&args[1])?;
    if b == 0.0 {
        return Err(RuntimeError::Custom("division by zero".to_string()));
    }
    Ok(numeric_result(a.rem_euclid(b), is_float(args)))
}

pub fn builtin_inc(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("inc", crate::error::ARITY_ONE, args.len()));
    }
    Ok(numeric_result(numeric(&args[0])? + 1.0, matches!(args[0], Value::Float(_))))
}

pub fn builtin_dec(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("dec", crate::error::ARITY_ONE, args.len()));
    }
    Ok(numeric_result(numeric(&args[0])? - 1.0, matches!(args[0], Value::Float(_))))
}

pub fn builtin_abs(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("abs", crate::error::ARITY_ONE, args.len()));
    }
    Ok(numeric_result(numeric(&args[0])?.abs(), matches!(args[0], Value::Float(_))))
}

/// Variadic-nonempty; falls back to float comparison for mixed Int/Float.
pub fn builtin_max(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity_error("max", crate::error::ARITY_AT_LEAST_ONE, 0));
    }
    let mut best = &args[0];
    let mut best_n = numeric(best)?;
    for arg in &args[1..] {
        let n = numeric(arg)?;
        if n > best_n {
            best = arg;
            best_n = n;
        }
    }
    Ok(best.clone())
}

pub fn builtin_min(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity_error("min", crate::error::ARITY_AT_LEAST_ONE, 0));
    }
    let mut best = &args[0];
    let mut best_n = numeric(best)?;
    for arg in &args[1..] {
        let n = numeric(arg)?;
        if n < best_n {
            best = arg;
            best_n = n;
        }
    }
    Ok(best.clone())
}

pub fn register(env: &Rc<Environment>) {
    env.define("+".to_string(), Value::BuiltIn(builtin_add));
    env.define("-".to_string(), Value::BuiltIn(builtin_sub));
    env.define("*".to_string(), Value::BuiltIn(builtin_mul));
    env.define("/".to_string(), Value::BuiltIn(builtin_div));
    env.define("mod".to_string(), Value::BuiltIn(builtin_mod));
    env.define("inc".to_string(), Value::BuiltIn(builtin_inc));
    env.define("dec".to_string(), Value::BuiltIn(builtin_dec));
    env.define("abs".to_string(), Value::BuiltIn(builtin_abs));
    env.define("max".to_string(), Value::BuiltIn(builtin_max));
    env.define("min".to_string(), Value::BuiltIn(builtin_min));

    for (name, sig, desc, related) in [
        ("+", "(+ num1 num2 ...)", "Returns the sum of all arguments.", vec!["-", "*", "/"]),
        ("-", "(- num1 num2 ...)", "Subtracts subsequent arguments from the first; negates a single argument.", vec!["+", "*", "/"]),
        ("*", "(* num1 num2 ...)", "Returns the product of all arguments.", vec!["+", "-", "/"]),
        ("/", "(/ num1 num2)", "Divides the first argument by the second.", vec!["+", "-", "*", "mod"]),
        ("mod", "(mod num1 num2)", "Returns num1 modulo num2.", vec!["/"]),
        ("inc", "(inc n)", "Returns n + 1.", vec!["dec"]),
        ("dec", "(dec n)", "Returns n - 1.", vec!["inc"]),
        ("abs", "(abs n)", "Returns the absolute value of n.", vec!["max", "min"]),
        ("max", "(max n1 n2 ...)", "Returns the largest argument.", vec!["min"]),
        ("min", "(min n1 n2 ...)", "Returns the smallest argument.", vec!["max"]),
    ] {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: sig.to_string(),
            description: desc.to_string(),
            examples: vec![],
            related: related.into_iter().map(String::from).collect(),
            category: "Arithmetic".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_stays_int_unless_float_present() {
        assert_eq!(builtin_add(&[Value::Int(1), Value::Int(2)]).unwrap(), Value::Int(3));
        assert_eq!(
            builtin_add(&[Value::Int(1), Value::Float(2.5)]).unwrap(),
            Value::Float(3.5)
        );
    }

    #[test]
    fn sub_unary_negates() {
        assert_eq!(builtin_sub(&[Value::Int(5)]).unwrap(), Value::Int(-5));
    }

    #[test]
    fn div_by_zero_is_runtime_error() {
        assert!(builtin_div(&[Value::Int(1), Value::Int(0)]).is_err());
    }

    #[test]
    fn max_min_variadic() {
        let args = [Value::Int(3), Value::Int(9), Value::Int(1)];
        assert_eq!(builtin_max(&args).unwrap(), Value::Int(9));
        assert_eq!(builtin_min(&args).unwrap(), Value::Int(1));
    }
}
