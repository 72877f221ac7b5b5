//! String operations: str, subs, join, split, trim, replace, parse-long, parse-double

use crate::error::RuntimeError;
use crate::value::Value;
use lisp_macros::builtin;

fn display_one(v: &Value) -> String {
    match v {
        Value::Nil => String::new(),
        Value::String(s) => s.to_string(),
        Value::Keyword(k) => format!(":{k}"),
        other => other.to_string(),
    }
}

#[builtin(name = "str", category = "Strings", related(join))]
/// Concatenate the display form of every argument. `nil` contributes `""`,
/// keywords contribute `:name`.
///
/// # Examples
///
/// ```lisp
/// (str "a" 1 :b) => "a1:b"
/// (str) => ""
/// ```
pub fn builtin_str(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::string(args.iter().map(display_one).collect::<String>()))
}

fn as_str(v: &Value, name: &str) -> Result<&str, RuntimeError> {
    match v {
        Value::String(s) => Ok(s.as_ref()),
        _ => Err(RuntimeError::type_error(name, "string", v)),
    }
}

#[builtin(name = "subs", category = "Strings", related(str))]
/// Substring from `start` to `end` (exclusive), negative indices clamped to 0.
///
/// # Examples
///
/// ```lisp
/// (subs "hello" 1 3) => "el"
/// (subs "hello" 2) => "llo"
/// ```
pub fn builtin_subs(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 && args.len() != 3 {
        return Err(RuntimeError::arity_error("subs", crate::error::ARITY_TWO_OR_THREE, args.len()));
    }
    let s = as_str(&args[0], "subs")?;
    let chars: Vec<char> = s.chars().collect();
    let clamp = |v: &Value| -> Result<usize, RuntimeError> {
        let n = v.as_f64().ok_or_else(|| RuntimeError::type_error("subs", "int", v))? as i64;
        Ok(n.max(0) as usize)
    };
    let start = clamp(&args[1])?.min(chars.len());
    let end = if args.len() == 3 {
        clamp(&args[2])?.min(chars.len())
    } else {
        chars.len()
    };
    if start > end {
        return Err(RuntimeError::Custom(format!("subs: start {start} after end {end}")));
    }
    Ok(Value::string(chars[start..end].iter().collect::<String>()))
}

#[builtin(name = "join", category = "Strings", related(str, split))]
/// `(join coll)` joins with `""`; `(join sep coll)` joins with a separator.
///
/// # Examples
///
/// ```lisp
/// (join ["a" "b" "c"]) => "abc"
/// (join ", " ["a" "b"]) => "a, b"
/// ```
pub fn builtin_join(args: &[Value]) -> Result<Value, RuntimeError> {
    let (sep, coll) = match args.len() {
        1 => ("".to_string(), &args[0]),
        2 => (display_one(&args[0]), &args[1]),
        _ => return Err(RuntimeError::arity_error("join", crate::error::ARITY_ONE_OR_TWO, args.len())),
    };
    let items = match coll {
        Value::Vector(items) => items.as_ref().clone(),
        other => return Err(RuntimeError::type_error("join", "vector", other)),
    };
    let parts: Vec<String> = items.iter().map(display_one).collect();
    Ok(Value::string(parts.join(&sep)))
}

#[builtin(name = "split", category = "Strings", related(join))]
/// Literal-delimiter split (not a regex split).
///
/// # Examples
///
/// ```lisp
/// (split "a,b,c" ",") => ["a" "b" "c"]
/// ```
pub fn builtin_split(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("split", crate::error::ARITY_TWO, args.len()));
    }
    let s = as_str(&args[0], "split")?;
    let delim = as_str(&args[1], "split")?;
    let parts: Vec<Value> = if delim.is_empty() {
        s.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        s.split(delim).map(Value::string).collect()
    };
    Ok(Value::vector(parts))
}

#[builtin(name = "trim", category = "Strings", related(subs))]
/// Trim leading and trailing whitespace.
pub fn builtin_trim(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("trim", crate::error::ARITY_ONE, args.len()));
    }
    Ok(Value::string(as_str(&args[0], "trim")?.trim().to_string()))
}

#[builtin(name = "replace", category = "Strings", related(split))]
/// Replace every literal occurrence of `pattern` with `replacement`.
pub fn builtin_replace(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 3 {
        return Err(RuntimeError::arity_error("replace", crate::error::ARITY_THREE, args.len()));
    }
    let s = as_str(&args[0], "replace")?;
    let pattern = as_str(&args[1], "replace")?;
    let replacement = as_str(&args[2], "replace")?;
    Ok(Value::string(s.replace(pattern, replacement)))
}

#[builtin(name = "parse-long", category = "Strings", related(parse-double))]
/// Parses a string as an `i64`. Returns `nil` on failure, never an error.
pub fn builtin_parse_long(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("parse-long", crate::error::ARITY_ONE, args.len()));
    }
    let s = as_str(&args[0], "parse-long")?;
    Ok(s.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Nil))
}

#[builtin(name = "parse-double", category = "Strings", related(parse-long))]
/// Parses a string as an `f64`. Returns `nil` on failure, never an error.
pub fn builtin_parse_double(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("parse-double", crate::error::ARITY_ONE, args.len()));
    }
    let s = as_str(&args[0], "parse-double")?;
    Ok(s.trim().parse::<f64>().map(Value::Float).unwrap_or(Value::Nil))
}

pub fn register(env: &std::rc::Rc<crate::env::Environment>) {
    register_str(env.clone());
    register_subs(env.clone());
    register_join(env.clone());
    register_split(env.clone());
    register_trim(env.clone());
    register_replace(env.clone());
    register_parse_long(env.clone());
    register_parse_double(env.clone());

    register_help_str();
    register_help_subs();
    register_help_join();
    register_help_split();
    register_help_trim();
    register_help_replace();
    register_help_parse_long();
    register_help_parse_double();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_formats_mixed_args() {
        assert_eq!(
            builtin_str(&[Value::string("a"), Value::Int(1), Value::keyword("b")]).unwrap(),
            Value::string("a1:b")
        );
    }

    #[test]
    fn subs_negative_clamped() {
        assert_eq!(
            builtin_subs(&[Value::string("hello"), Value::Int(-3), Value::Int(3)]).unwrap(),
            Value::string("hel")
        );
    }

    #[test]
    fn parse_failures_return_nil_not_error() {
        assert_eq!(builtin_parse_long(&[Value::string("nope")]).unwrap(), Value::Nil);
        assert_eq!(builtin_parse_double(&[Value::string("3.5")]).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn join_with_and_without_separator() {
        let coll = Value::vector(vec![Value::string("a"), Value::string("b")]);
        assert_eq!(builtin_join(&[coll.clone()]).unwrap(), Value::string("ab"));
        assert_eq!(
            builtin_join(&[Value::string(", "), coll]).unwrap(),
            Value::string("a, b")
        );
    }
}
