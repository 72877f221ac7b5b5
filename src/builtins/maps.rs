//! Map operations: get, get-in, assoc, assoc-in, update, update-in, dissoc,
//! merge, select-keys, keys, vals, entries, update-vals
//!
//! `get`/`get-in`/`assoc`/`assoc-in`/`select-keys` all go through the
//! flexible key-access contract in flex.rs. `update`/`update-in`/`update-vals`
//! call a user function and so need evaluator access — they're `Native`
//! rather than plain `BuiltIn`s (eval.rs §callable dispatch).

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::eval::{call_value, Interp};
use crate::flex;
use crate::value::{Native, Value};
use lisp_macros::builtin;
use std::rc::Rc;

fn as_pairs<'a>(v: &'a Value, name: &str) -> Result<&'a [(Value, Value)], RuntimeError> {
    match v {
        Value::Map(pairs) => Ok(pairs),
        other => Err(RuntimeError::type_error(name, "map", other)),
    }
}

#[builtin(name = "get", category = "Maps", related(get-in, assoc))]
/// Flexible-key lookup; returns `default` (or `nil`) if absent.
///
/// # Examples
///
/// ```lisp
/// (get {:a 1} :a) => 1
/// (get {:a 1} :b "none") => "none"
/// ```
pub fn builtin_get(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(RuntimeError::arity_error("get", crate::error::ARITY_TWO_OR_THREE, args.len()));
    }
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    Ok(flex::get(&args[0], &args[1]).unwrap_or(default))
}

#[builtin(name = "get-in", category = "Maps", related(get, assoc-in))]
/// Walks a path of keys through nested maps.
///
/// # Examples
///
/// ```lisp
/// (get-in {:a {:b 1}} [:a :b]) => 1
/// ```
pub fn builtin_get_in(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(RuntimeError::arity_error("get-in", crate::error::ARITY_TWO_OR_THREE, args.len()));
    }
    let path = match &args[1] {
        Value::Vector(items) => items.as_ref().clone(),
        other => return Err(RuntimeError::type_error("get-in", "vector path", other)),
    };
    let default = args.get(2).cloned().unwrap_or(Value::Nil);
    Ok(flex::get_in(&args[0], &path).unwrap_or(default))
}

#[builtin(name = "assoc", category = "Maps", related(get, dissoc))]
/// Returns a new map with `key` set to `value` (flexible-key overwrite).
///
/// # Examples
///
/// ```lisp
/// (assoc {:a 1} :b 2) => {:a 1 :b 2}
/// ```
pub fn builtin_assoc(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() < 3 || args.len() % 2 == 0 {
        return Err(RuntimeError::ArityError("assoc: expected map and key/value pairs".to_string()));
    }
    let mut pairs = as_pairs(&args[0], "assoc")?.to_vec();
    for kv in args[1..].chunks(2) {
        pairs = flex::assoc(&pairs, kv[0].clone(), kv[1].clone());
    }
    Ok(Value::map(pairs))
}

fn assoc_in_rec(container: &Value, path: &[Value], value: Value) -> Result<Value, RuntimeError> {
    let Some((key, rest)) = path.split_first() else {
        return Ok(value);
    };
    let pairs = match container {
        Value::Map(p) => p.as_ref().clone(),
        Value::Nil => Vec::new(),
        other => return Err(RuntimeError::type_error("assoc-in", "map", other)),
    };
    let existing = flex::map_get(&pairs, key).cloned().unwrap_or(Value::Nil);
    let updated = assoc_in_rec(&existing, rest, value)?;
    Ok(Value::map(flex::assoc(&pairs, key.clone(), updated)))
}

#[builtin(name = "assoc-in", category = "Maps", related(assoc, get-in))]
/// Creates intermediate maps on missing path segments.
///
/// # Examples
///
/// ```lisp
/// (assoc-in {} [:a :b] 1) => {:a {:b 1}}
/// ```
pub fn builtin_assoc_in(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 3 {
        return Err(RuntimeError::arity_error("assoc-in", crate::error::ARITY_THREE, args.len()));
    }
    let path = match &args[1] {
        Value::Vector(items) => items.as_ref().clone(),
        other => return Err(RuntimeError::type_error("assoc-in", "vector path", other)),
    };
    assoc_in_rec(&args[0], &path, args[2].clone())
}

#[builtin(name = "dissoc", category = "Maps", related(assoc))]
/// Returns a new map with `key` removed.
pub fn builtin_dissoc(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("dissoc", crate::error::ARITY_TWO, args.len()));
    }
    let pairs = as_pairs(&args[0], "dissoc")?;
    Ok(Value::map(flex::dissoc(pairs, &args[1])))
}

#[builtin(name = "merge", category = "Maps", related(assoc))]
/// Merges maps left to right; later maps' keys win (flexible-key overwrite).
pub fn builtin_merge(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out: Vec<(Value, Value)> = Vec::new();
    for arg in args {
        for (k, v) in as_pairs(arg, "merge")? {
            out = flex::assoc(&out, k.clone(), v.clone());
        }
    }
    Ok(Value::map(out))
}

#[builtin(name = "select-keys", category = "Maps", related(get, keys))]
/// Returns a new map containing only the keys found (via flexible lookup).
pub fn builtin_select_keys(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("select-keys", crate::error::ARITY_TWO, args.len()));
    }
    let keys = match &args[1] {
        Value::Vector(items) => items.as_ref().clone(),
        other => return Err(RuntimeError::type_error("select-keys", "vector of keys", other)),
    };
    let mut out = Vec::new();
    for key in keys {
        if let Some(v) = flex::get(&args[0], &key) {
            out = flex::assoc(&out, key, v);
        }
    }
    Ok(Value::map(out))
}

fn key_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
    fn sort_text(v: &Value) -> std::borrow::Cow<'_, str> {
        match v {
            Value::Keyword(k) | Value::String(k) => std::borrow::Cow::Borrowed(k.as_ref()),
            other => std::borrow::Cow::Owned(other.to_string()),
        }
    }
    sort_text(a).cmp(&sort_text(b))
}

#[builtin(name = "keys", category = "Maps", related(vals, entries))]
/// Map keys, sorted.
pub fn builtin_keys(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("keys", crate::error::ARITY_ONE, args.len()));
    }
    let pairs = as_pairs(&args[0], "keys")?;
    let mut ks: Vec<Value> = pairs.iter().map(|(k, _)| k.clone()).collect();
    ks.sort_by(key_cmp);
    Ok(Value::vector(ks))
}

#[builtin(name = "vals", category = "Maps", related(keys, entries))]
/// Map values, sorted by key.
pub fn builtin_vals(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("vals", crate::error::ARITY_ONE, args.len()));
    }
    let mut pairs = as_pairs(&args[0], "vals")?.to_vec();
    pairs.sort_by(|(k1, _), (k2, _)| key_cmp(k1, k2));
    Ok(Value::vector(pairs.into_iter().map(|(_, v)| v).collect()))
}

#[builtin(name = "entries", category = "Maps", related(keys, vals))]
/// Map entries as `[k v]` vectors, insertion order.
pub fn builtin_entries(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error("entries", crate::error::ARITY_ONE, args.len()));
    }
    let pairs = as_pairs(&args[0], "entries")?;
    Ok(Value::vector(
        pairs
            .iter()
            .map(|(k, v)| Value::vector(vec![k.clone(), v.clone()]))
            .collect(),
    ))
}

fn native_update(name: &'static str) -> Value {
    let f = move |args: &[Value], interp: &mut Interp| -> Result<Value, RuntimeError> {
        if args.len() < 3 {
            return Err(RuntimeError::arity_error(name, crate::error::ARITY_AT_LEAST_ONE, args.len()));
        }
        let pairs = as_pairs(&args[0], name)?.to_vec();
        let key = &args[1];
        let f = &args[2];
        let extra = &args[3..];
        let current = flex::map_get(&pairs, key).cloned().unwrap_or(Value::Nil);
        let mut call_args = vec![current];
        call_args.extend_from_slice(extra);
        let updated = call_value(f, &call_args, interp)?;
        Ok(Value::map(flex::assoc(&pairs, key.clone(), updated)))
    };
    Value::Native(Native { name, f: Rc::new(f) })
}

/// `(update-in m path f & extra-args)`, creating intermediate maps as needed.
fn native_update_in() -> Value {
    let f = move |args: &[Value], interp: &mut Interp| -> Result<Value, RuntimeError> {
        if args.len() < 3 {
            return Err(RuntimeError::arity_error("update-in", crate::error::ARITY_AT_LEAST_ONE, args.len()));
        }
        let path = match &args[1] {
            Value::Vector(items) => items.as_ref().clone(),
            other => return Err(RuntimeError::type_error("update-in", "vector path", other)),
        };
        let updater = &args[2];
        let extra = &args[3..];
        fn rec(
            container: &Value,
            path: &[Value],
            updater: &Value,
            extra: &[Value],
            interp: &mut Interp,
        ) -> Result<Value, RuntimeError> {
            let Some((key, rest)) = path.split_first() else {
                let mut call_args = vec![container.clone()];
                call_args.extend_from_slice(extra);
                return call_value(updater, &call_args, interp);
            };
            let pairs = match container {
                Value::Map(p) => p.as_ref().clone(),
                Value::Nil => Vec::new(),
                other => return Err(RuntimeError::type_error("update-in", "map", other)),
            };
            let existing = flex::map_get(&pairs, key).cloned().unwrap_or(Value::Nil);
            let updated = rec(&existing, rest, updater, extra, interp)?;
            Ok(Value::map(flex::assoc(&pairs, key.clone(), updated)))
        }
        rec(&args[0], &path, updater, extra, interp)
    };
    Value::Native(Native {
        name: "update-in",
        f: Rc::new(f),
    })
}

/// `(update-vals m f)`: applies `f` to every value, keys unchanged.
fn native_update_vals() -> Value {
    let f = |args: &[Value], interp: &mut Interp| -> Result<Value, RuntimeError> {
        if args.len() != 2 {
            return Err(RuntimeError::arity_error("update-vals", crate::error::ARITY_TWO, args.len()));
        }
        let pairs = as_pairs(&args[0], "update-vals")?.to_vec();
        let f = &args[1];
        let mut out = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            out.push((k, call_value(f, &[v], interp)?));
        }
        Ok(Value::map(out))
    };
    Value::Native(Native {
        name: "update-vals",
        f: Rc::new(f),
    })
}

pub fn register(env: &Rc<Environment>) {
    register_get(env.clone());
    register_get_in(env.clone());
    register_assoc(env.clone());
    register_assoc_in(env.clone());
    register_dissoc(env.clone());
    register_merge(env.clone());
    register_select_keys(env.clone());
    register_keys(env.clone());
    register_vals(env.clone());
    register_entries(env.clone());

    register_help_get();
    register_help_get_in();
    register_help_assoc();
    register_help_assoc_in();
    register_help_dissoc();
    register_help_merge();
    register_help_select_keys();
    register_help_keys();
    register_help_vals();
    register_help_entries();

    env.define("update".to_string(), native_update("update"));
    env.define("update-in".to_string(), native_update_in());
    env.define("update-vals".to_string(), native_update_vals());

    for (name, sig) in [
        ("update", "(update m key f & args)"),
        ("update-in", "(update-in m path f & args)"),
        ("update-vals", "(update-vals m f)"),
    ] {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: sig.to_string(),
            description: format!("Functional map update: {name}."),
            examples: vec![],
            related: vec!["assoc".to_string(), "get".to_string()],
            category: "Maps".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_default_on_miss() {
        let m = Value::map(vec![(Value::keyword("a"), Value::Int(1))]);
        assert_eq!(
            builtin_get(&[m, Value::keyword("b"), Value::string("none")]).unwrap(),
            Value::string("none")
        );
    }

    #[test]
    fn assoc_in_creates_intermediate_maps() {
        let result = builtin_assoc_in(&[
            Value::map(vec![]),
            Value::vector(vec![Value::keyword("a"), Value::keyword("b")]),
            Value::Int(1),
        ])
        .unwrap();
        assert_eq!(flex::get_in(&result, &[Value::keyword("a"), Value::keyword("b")]), Some(Value::Int(1)));
    }

    #[test]
    fn keys_are_sorted() {
        let m = Value::map(vec![
            (Value::keyword("b"), Value::Int(2)),
            (Value::keyword("a"), Value::Int(1)),
        ]);
        assert_eq!(
            builtin_keys(&[m]).unwrap(),
            Value::vector(vec![Value::keyword("a"), Value::keyword("b")])
        );
    }
}
