//! Collection operations: filter, map, reduce, sort, take/drop family, etc.
//!
//! Most of this module is `Native` rather than plain `BuiltIn` because the
//! key-as-predicate / set-as-predicate / callable-argument polymorphism
//! (spec.md §4.4) needs evaluator access to invoke a closure or dispatch a
//! keyword/set acting as a function — see `apply_selector` and eval.rs's
//! `call_value`.

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::eval::{call_value, Interp};
use crate::flex;
use crate::value::{Native, Value};
use std::rc::Rc;

/// Turns any iterable `Value` into a plain `Vec`. Maps iterate as `[k v]`
/// pairs in insertion order (spec.md's "map iteration" rule).
fn to_seq(v: &Value, name: &str) -> Result<Vec<Value>, RuntimeError> {
    match v {
        Value::Vector(items) => Ok(items.as_ref().clone()),
        Value::Set(items) => Ok(items.as_ref().clone()),
        Value::Map(pairs) => Ok(pairs
            .iter()
            .map(|(k, v)| Value::vector(vec![k.clone(), v.clone()]))
            .collect()),
        other => Err(RuntimeError::type_error(name, "collection", other)),
    }
}

/// A key (keyword/string) acts as `flex_get`; anything else is called as a
/// function via the uniform callable dispatch in eval.rs.
fn apply_selector(selector: &Value, arg: &Value, interp: &mut Interp) -> Result<Value, RuntimeError> {
    match selector {
        Value::String(_) => Ok(flex::get(arg, selector).unwrap_or(Value::Nil)),
        other => call_value(other, &[arg.clone()], interp),
    }
}

fn native(name: &'static str, f: impl Fn(&[Value], &mut Interp) -> Result<Value, RuntimeError> + 'static) -> Value {
    Value::Native(Native { name, f: Rc::new(f) })
}

fn builtin(f: fn(&[Value]) -> Result<Value, RuntimeError>) -> Value {
    Value::BuiltIn(f)
}

// ============================================================================
// Key/predicate-as-first-argument operations
// ============================================================================

fn n_filter(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("filter", crate::error::ARITY_TWO, args.len()));
    }
    let mut out = Vec::new();
    for item in to_seq(&args[1], "filter")? {
        if apply_selector(&args[0], &item, interp)?.is_truthy() {
            out.push(item);
        }
    }
    Ok(Value::vector(out))
}

fn n_remove(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("remove", crate::error::ARITY_TWO, args.len()));
    }
    let mut out = Vec::new();
    for item in to_seq(&args[1], "remove")? {
        if !apply_selector(&args[0], &item, interp)?.is_truthy() {
            out.push(item);
        }
    }
    Ok(Value::vector(out))
}

fn n_find(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("find", crate::error::ARITY_TWO, args.len()));
    }
    for item in to_seq(&args[1], "find")? {
        if apply_selector(&args[0], &item, interp)?.is_truthy() {
            return Ok(item);
        }
    }
    Ok(Value::Nil)
}

fn n_map(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("map", crate::error::ARITY_TWO, args.len()));
    }
    let mut out = Vec::new();
    for item in to_seq(&args[1], "map")? {
        out.push(apply_selector(&args[0], &item, interp)?);
    }
    Ok(Value::vector(out))
}

/// `mapv` has the same semantics as `map` here: both return a vector.
fn n_mapv(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    n_map(args, interp)
}

fn n_mapcat(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("mapcat", crate::error::ARITY_TWO, args.len()));
    }
    let mut out = Vec::new();
    for item in to_seq(&args[1], "mapcat")? {
        let mapped = apply_selector(&args[0], &item, interp)?;
        out.extend(to_seq(&mapped, "mapcat")?);
    }
    Ok(Value::vector(out))
}

fn n_map_indexed(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("map-indexed", crate::error::ARITY_TWO, args.len()));
    }
    let mut out = Vec::new();
    for (i, item) in to_seq(&args[1], "map-indexed")?.into_iter().enumerate() {
        out.push(call_value(&args[0], &[Value::Int(i as i64), item], interp)?);
    }
    Ok(Value::vector(out))
}

fn n_sort(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 1 && args.len() != 2 {
        return Err(RuntimeError::arity_error("sort", crate::error::ARITY_ONE_OR_TWO, args.len()));
    }
    let (comparator, coll) = if args.len() == 2 { (Some(&args[0]), &args[1]) } else { (None, &args[0]) };
    let mut items = to_seq(coll, "sort")?;
    let mut err = None;
    items.sort_by(|a, b| {
        if err.is_some() {
            return std::cmp::Ordering::Equal;
        }
        match comparator {
            Some(f) => match call_value(f, &[a.clone(), b.clone()], interp) {
                Ok(v) => {
                    let n = v.as_f64().unwrap_or(0.0);
                    n.partial_cmp(&0.0).unwrap_or(std::cmp::Ordering::Equal)
                }
                Err(e) => {
                    err = Some(e);
                    std::cmp::Ordering::Equal
                }
            },
            None => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                _ => format!("{a}").cmp(&format!("{b}")),
            },
        }
    });
    if let Some(e) = err {
        return Err(e);
    }
    Ok(Value::vector(items))
}

fn n_sort_by(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("sort-by", crate::error::ARITY_TWO, args.len()));
    }
    let mut keyed: Vec<(Value, Value)> = Vec::new();
    for item in to_seq(&args[1], "sort-by")? {
        let key = apply_selector(&args[0], &item, interp)?;
        keyed.push((key, item));
    }
    keyed.sort_by(|(k1, _), (k2, _)| match (k1.as_f64(), k2.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => format!("{k1}").cmp(&format!("{k2}")),
    });
    Ok(Value::vector(keyed.into_iter().map(|(_, v)| v).collect()))
}

/// Supplements the canonical function list with the `*-by` aggregates the
/// spec's own polymorphism notes reference (key-as-predicate applies to them
/// too) but the list itself omits.
fn n_min_by(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("min-by", crate::error::ARITY_TWO, args.len()));
    }
    let items = to_seq(&args[1], "min-by")?;
    let mut best: Option<(f64, Value)> = None;
    for item in items {
        let key = apply_selector(&args[0], &item, interp)?
            .as_f64()
            .ok_or_else(|| RuntimeError::type_error("min-by", "number", &item))?;
        if best.as_ref().map(|(k, _)| key < *k).unwrap_or(true) {
            best = Some((key, item));
        }
    }
    Ok(best.map(|(_, v)| v).unwrap_or(Value::Nil))
}

fn n_max_by(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("max-by", crate::error::ARITY_TWO, args.len()));
    }
    let items = to_seq(&args[1], "max-by")?;
    let mut best: Option<(f64, Value)> = None;
    for item in items {
        let key = apply_selector(&args[0], &item, interp)?
            .as_f64()
            .ok_or_else(|| RuntimeError::type_error("max-by", "number", &item))?;
        if best.as_ref().map(|(k, _)| key > *k).unwrap_or(true) {
            best = Some((key, item));
        }
    }
    Ok(best.map(|(_, v)| v).unwrap_or(Value::Nil))
}

fn n_sum_by(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("sum-by", crate::error::ARITY_TWO, args.len()));
    }
    let mut sum = 0.0;
    let mut float = false;
    for item in to_seq(&args[1], "sum-by")? {
        let key = apply_selector(&args[0], &item, interp)?;
        float = float || matches!(key, Value::Float(_));
        sum += key.as_f64().ok_or_else(|| RuntimeError::type_error("sum-by", "number", &item))?;
    }
    Ok(if float { Value::Float(sum) } else { Value::Int(sum as i64) })
}

fn n_avg_by(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("avg-by", crate::error::ARITY_TWO, args.len()));
    }
    let items = to_seq(&args[1], "avg-by")?;
    if items.is_empty() {
        return Ok(Value::Nil);
    }
    let mut sum = 0.0;
    for item in &items {
        let key = apply_selector(&args[0], item, interp)?;
        sum += key.as_f64().ok_or_else(|| RuntimeError::type_error("avg-by", "number", item))?;
    }
    Ok(Value::Float(sum / items.len() as f64))
}

fn n_take_while(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("take-while", crate::error::ARITY_TWO, args.len()));
    }
    let mut out = Vec::new();
    for item in to_seq(&args[1], "take-while")? {
        if !apply_selector(&args[0], &item, interp)?.is_truthy() {
            break;
        }
        out.push(item);
    }
    Ok(Value::vector(out))
}

fn n_drop_while(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("drop-while", crate::error::ARITY_TWO, args.len()));
    }
    let items = to_seq(&args[1], "drop-while")?;
    let mut i = 0;
    while i < items.len() && apply_selector(&args[0], &items[i], interp)?.is_truthy() {
        i += 1;
    }
    Ok(Value::vector(items[i..].to_vec()))
}

fn n_distinct_by(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("distinct-by", crate::error::ARITY_TWO, args.len()));
    }
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for item in to_seq(&args[1], "distinct-by")? {
        let key = apply_selector(&args[0], &item, interp)?;
        if !seen.contains(&key) {
            seen.push(key);
            out.push(item);
        }
    }
    Ok(Value::vector(out))
}

fn n_group_by(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("group-by", crate::error::ARITY_TWO, args.len()));
    }
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    for item in to_seq(&args[1], "group-by")? {
        let key = apply_selector(&args[0], &item, interp)?;
        match groups.iter_mut().find(|(k, _)| k == &key) {
            Some((_, items)) => items.push(item),
            None => groups.push((key, vec![item])),
        }
    }
    Ok(Value::map(
        groups.into_iter().map(|(k, items)| (k, Value::vector(items))).collect(),
    ))
}

fn n_some(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("some", crate::error::ARITY_TWO, args.len()));
    }
    for item in to_seq(&args[1], "some")? {
        let r = apply_selector(&args[0], &item, interp)?;
        if r.is_truthy() {
            return Ok(r);
        }
    }
    Ok(Value::Nil)
}

fn n_every(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("every?", crate::error::ARITY_TWO, args.len()));
    }
    for item in to_seq(&args[1], "every?")? {
        if !apply_selector(&args[0], &item, interp)?.is_truthy() {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

fn n_not_any(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    match n_some(args, interp)? {
        Value::Nil => Ok(Value::Bool(true)),
        _ => Ok(Value::Bool(false)),
    }
}

fn n_reduce(args: &[Value], interp: &mut Interp) -> Result<Value, RuntimeError> {
    if args.len() != 2 && args.len() != 3 {
        return Err(RuntimeError::arity_error("reduce", crate::error::ARITY_TWO_OR_THREE, args.len()));
    }
    let f = &args[0];
    let (mut acc, items) = if args.len() == 3 {
        (args[1].clone(), to_seq(&args[2], "reduce")?)
    } else {
        let mut items = to_seq(&args[1], "reduce")?;
        if items.is_empty() {
            return Ok(Value::Nil);
        }
        let first = items.remove(0);
        (first, items)
    };
    for item in items {
        acc = call_value(f, &[acc, item], interp)?;
    }
    Ok(acc)
}

// ============================================================================
// Pure (non-callable-argument) operations
// ============================================================================

fn first_of(items: &[Value]) -> Value {
    items.first().cloned().unwrap_or(Value::Nil)
}

pub fn builtin_first(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(first_of(&to_seq(&one(args, "first")?, "first")?))
}

fn one<'a>(args: &'a [Value], name: &str) -> Result<&'a Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity_error(name, crate::error::ARITY_ONE, args.len()));
    }
    Ok(&args[0])
}

pub fn builtin_second(args: &[Value]) -> Result<Value, RuntimeError> {
    let items = to_seq(one(args, "second")?, "second")?;
    Ok(items.get(1).cloned().unwrap_or(Value::Nil))
}

pub fn builtin_last(args: &[Value]) -> Result<Value, RuntimeError> {
    let items = to_seq(one(args, "last")?, "last")?;
    Ok(items.last().cloned().unwrap_or(Value::Nil))
}

pub fn builtin_nth(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(RuntimeError::arity_error("nth", crate::error::ARITY_TWO_OR_THREE, args.len()));
    }
    let items = to_seq(&args[0], "nth")?;
    let idx = args[1].as_f64().ok_or_else(|| RuntimeError::type_error("nth", "int", &args[1]))? as i64;
    if idx < 0 || idx as usize >= items.len() {
        return args.get(2).cloned().ok_or_else(|| {
            RuntimeError::Custom(format!("nth: index {idx} out of bounds (len {})", items.len()))
        });
    }
    Ok(items[idx as usize].clone())
}

pub fn builtin_rest(args: &[Value]) -> Result<Value, RuntimeError> {
    let items = to_seq(one(args, "rest")?, "rest")?;
    Ok(Value::vector(items.into_iter().skip(1).collect()))
}

pub fn builtin_butlast(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut items = to_seq(one(args, "butlast")?, "butlast")?;
    items.pop();
    Ok(Value::vector(items))
}

fn clamp_count(v: &Value, name: &str) -> Result<usize, RuntimeError> {
    let n = v.as_f64().ok_or_else(|| RuntimeError::type_error(name, "int", v))? as i64;
    Ok(n.max(0) as usize)
}

pub fn builtin_take(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("take", crate::error::ARITY_TWO, args.len()));
    }
    let n = clamp_count(&args[0], "take")?;
    let items = to_seq(&args[1], "take")?;
    Ok(Value::vector(items.into_iter().take(n).collect()))
}

pub fn builtin_drop(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("drop", crate::error::ARITY_TWO, args.len()));
    }
    let n = clamp_count(&args[0], "drop")?;
    let items = to_seq(&args[1], "drop")?;
    Ok(Value::vector(items.into_iter().skip(n).collect()))
}

pub fn builtin_take_last(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("take-last", crate::error::ARITY_TWO, args.len()));
    }
    let n = clamp_count(&args[0], "take-last")?;
    let items = to_seq(&args[1], "take-last")?;
    let start = items.len().saturating_sub(n);
    Ok(Value::vector(items[start..].to_vec()))
}

pub fn builtin_drop_last(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("drop-last", crate::error::ARITY_TWO, args.len()));
    }
    let n = clamp_count(&args[0], "drop-last")?;
    let items = to_seq(&args[1], "drop-last")?;
    let end = items.len().saturating_sub(n);
    Ok(Value::vector(items[..end].to_vec()))
}

/// `next`: like `rest`, but `nil` rather than `[]` for an empty result.
pub fn builtin_next(args: &[Value]) -> Result<Value, RuntimeError> {
    let items = to_seq(one(args, "next")?, "next")?;
    if items.len() <= 1 {
        Ok(Value::Nil)
    } else {
        Ok(Value::vector(items[1..].to_vec()))
    }
}

pub fn builtin_distinct(args: &[Value]) -> Result<Value, RuntimeError> {
    let items = to_seq(one(args, "distinct")?, "distinct")?;
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    Ok(Value::vector(out))
}

pub fn builtin_concat(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out = Vec::new();
    for arg in args {
        out.extend(to_seq(arg, "concat")?);
    }
    Ok(Value::vector(out))
}

/// `(conj coll x1 x2 ...)`: appends for a vector, inserts for a set.
pub fn builtin_conj(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity_error("conj", crate::error::ARITY_AT_LEAST_ONE, 0));
    }
    match &args[0] {
        Value::Set(items) => {
            let mut out = items.as_ref().clone();
            for item in &args[1..] {
                if !out.contains(item) {
                    out.push(item.clone());
                }
            }
            Ok(Value::set(out))
        }
        Value::Vector(items) => {
            let mut out = items.as_ref().clone();
            out.extend_from_slice(&args[1..]);
            Ok(Value::vector(out))
        }
        other => Err(RuntimeError::type_error("conj", "vector or set", other)),
    }
}

/// `(into to from)`: pours `from`'s elements into `to`'s collection shape.
pub fn builtin_into(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("into", crate::error::ARITY_TWO, args.len()));
    }
    let items = to_seq(&args[1], "into")?;
    match &args[0] {
        Value::Set(existing) => {
            let mut out = existing.as_ref().clone();
            for item in items {
                if !out.contains(&item) {
                    out.push(item);
                }
            }
            Ok(Value::set(out))
        }
        Value::Vector(existing) => {
            let mut out = existing.as_ref().clone();
            out.extend(items);
            Ok(Value::vector(out))
        }
        Value::Map(existing) => {
            let mut out = existing.as_ref().clone();
            for item in items {
                match item {
                    Value::Vector(kv) if kv.len() == 2 => {
                        out = flex::assoc(&out, kv[0].clone(), kv[1].clone());
                    }
                    other => return Err(RuntimeError::type_error("into", "[k v] pair", &other)),
                }
            }
            Ok(Value::map(out))
        }
        other => Err(RuntimeError::type_error("into", "vector, set, or map", other)),
    }
}

fn flatten_rec(v: &Value, out: &mut Vec<Value>) {
    match v {
        Value::Vector(items) => {
            for item in items.iter() {
                flatten_rec(item, out);
            }
        }
        other => out.push(other.clone()),
    }
}

pub fn builtin_flatten(args: &[Value]) -> Result<Value, RuntimeError> {
    let v = one(args, "flatten")?;
    let mut out = Vec::new();
    for item in to_seq(v, "flatten")? {
        flatten_rec(&item, &mut out);
    }
    Ok(Value::vector(out))
}

pub fn builtin_zip(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("zip", crate::error::ARITY_TWO, args.len()));
    }
    let a = to_seq(&args[0], "zip")?;
    let b = to_seq(&args[1], "zip")?;
    Ok(Value::vector(
        a.into_iter()
            .zip(b)
            .map(|(x, y)| Value::vector(vec![x, y]))
            .collect(),
    ))
}

pub fn builtin_interleave(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("interleave", crate::error::ARITY_TWO, args.len()));
    }
    let a = to_seq(&args[0], "interleave")?;
    let b = to_seq(&args[1], "interleave")?;
    let mut out = Vec::new();
    for (x, y) in a.into_iter().zip(b) {
        out.push(x);
        out.push(y);
    }
    Ok(Value::vector(out))
}

pub fn builtin_interpose(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("interpose", crate::error::ARITY_TWO, args.len()));
    }
    let sep = &args[0];
    let items = to_seq(&args[1], "interpose")?;
    let mut out = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(sep.clone());
        }
        out.push(item);
    }
    Ok(Value::vector(out))
}

pub fn builtin_partition(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("partition", crate::error::ARITY_TWO, args.len()));
    }
    let n = clamp_count(&args[0], "partition")?.max(1);
    let items = to_seq(&args[1], "partition")?;
    Ok(Value::vector(
        items
            .chunks_exact(n)
            .map(|chunk| Value::vector(chunk.to_vec()))
            .collect(),
    ))
}

pub fn builtin_count(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Int(to_seq(one(args, "count")?, "count")?.len() as i64))
}

pub fn builtin_empty_p(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(to_seq(one(args, "empty?")?, "empty?")?.is_empty()))
}

pub fn builtin_not_empty(args: &[Value]) -> Result<Value, RuntimeError> {
    let v = one(args, "not-empty")?;
    if to_seq(v, "not-empty")?.is_empty() {
        Ok(Value::Nil)
    } else {
        Ok(v.clone())
    }
}

/// `seq`: `nil` for an empty collection, the collection itself otherwise.
pub fn builtin_seq(args: &[Value]) -> Result<Value, RuntimeError> {
    let v = one(args, "seq")?;
    let items = to_seq(v, "seq")?;
    if items.is_empty() {
        Ok(Value::Nil)
    } else {
        Ok(Value::vector(items))
    }
}

pub fn builtin_range(args: &[Value]) -> Result<Value, RuntimeError> {
    let (start, end) = match args.len() {
        1 => (0, args[0].as_f64().ok_or_else(|| RuntimeError::type_error("range", "int", &args[0]))? as i64),
        2 => (
            args[0].as_f64().ok_or_else(|| RuntimeError::type_error("range", "int", &args[0]))? as i64,
            args[1].as_f64().ok_or_else(|| RuntimeError::type_error("range", "int", &args[1]))? as i64,
        ),
        _ => return Err(RuntimeError::arity_error("range", crate::error::ARITY_ONE_OR_TWO, args.len())),
    };
    Ok(Value::vector((start..end).map(Value::Int).collect()))
}

pub fn builtin_frequencies(args: &[Value]) -> Result<Value, RuntimeError> {
    let items = to_seq(one(args, "frequencies")?, "frequencies")?;
    let mut out: Vec<(Value, Value)> = Vec::new();
    for item in items {
        match out.iter_mut().find(|(k, _)| k == &item) {
            Some((_, Value::Int(n))) => *n += 1,
            _ => out.push((item, Value::Int(1))),
        }
    }
    Ok(Value::map(out))
}

pub fn builtin_contains(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::arity_error("contains?", crate::error::ARITY_TWO, args.len()));
    }
    match &args[0] {
        Value::Map(pairs) => Ok(Value::Bool(flex::contains_key(pairs, &args[1]))),
        Value::Set(items) => Ok(Value::Bool(items.contains(&args[1]))),
        Value::Vector(items) => {
            let idx = args[1].as_f64().unwrap_or(-1.0) as i64;
            Ok(Value::Bool(idx >= 0 && (idx as usize) < items.len()))
        }
        other => Err(RuntimeError::type_error("contains?", "map, set, or vector", other)),
    }
}

pub fn builtin_reverse(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut items = to_seq(one(args, "reverse")?, "reverse")?;
    items.reverse();
    Ok(Value::vector(items))
}

pub fn register(env: &Rc<Environment>) {
    for (name, f) in [
        ("first", builtin_first as fn(&[Value]) -> Result<Value, RuntimeError>),
        ("second", builtin_second),
        ("last", builtin_last),
        ("nth", builtin_nth),
        ("rest", builtin_rest),
        ("butlast", builtin_butlast),
        ("take", builtin_take),
        ("drop", builtin_drop),
        ("take-last", builtin_take_last),
        ("drop-last", builtin_drop_last),
        ("next", builtin_next),
        ("distinct", builtin_distinct),
        ("concat", builtin_concat),
        ("conj", builtin_conj),
        ("into", builtin_into),
        ("flatten", builtin_flatten),
        ("zip", builtin_zip),
        ("interleave", builtin_interleave),
        ("interpose", builtin_interpose),
        ("partition", builtin_partition),
        ("count", builtin_count),
        ("empty?", builtin_empty_p),
        ("not-empty", builtin_not_empty),
        ("seq", builtin_seq),
        ("range", builtin_range),
        ("frequencies", builtin_frequencies),
        ("contains?", builtin_contains),
        ("reverse", builtin_reverse),
    ] {
        env.define(name.to_string(), builtin(f));
    }

    for (name, f) in [
        (
            "filter",
            Box::new(n_filter) as Box<dyn Fn(&[Value], &mut Interp) -> Result<Value, RuntimeError>>,
        ),
        ("remove", Box::new(n_remove)),
        ("find", Box::new(n_find)),
        ("map", Box::new(n_map)),
        ("mapv", Box::new(n_mapv)),
        ("mapcat", Box::new(n_mapcat)),
        ("map-indexed", Box::new(n_map_indexed)),
        ("sort", Box::new(n_sort)),
        ("sort-by", Box::new(n_sort_by)),
        ("min-by", Box::new(n_min_by)),
        ("max-by", Box::new(n_max_by)),
        ("sum-by", Box::new(n_sum_by)),
        ("avg-by", Box::new(n_avg_by)),
        ("take-while", Box::new(n_take_while)),
        ("drop-while", Box::new(n_drop_while)),
        ("distinct-by", Box::new(n_distinct_by)),
        ("group-by", Box::new(n_group_by)),
        ("some", Box::new(n_some)),
        ("every?", Box::new(n_every)),
        ("not-any?", Box::new(n_not_any)),
        ("reduce", Box::new(n_reduce)),
    ] {
        env.define(name.to_string(), native(name, move |a, i| f(a, i)));
    }

    for name in [
        "filter", "remove", "find", "map", "mapv", "mapcat", "map-indexed", "sort", "sort-by",
        "min-by", "max-by", "sum-by", "avg-by",
        "reverse", "first", "second", "last", "nth", "rest", "butlast", "take", "drop",
        "take-last", "drop-last", "next", "take-while", "drop-while", "distinct", "distinct-by",
        "concat", "conj", "into", "flatten", "zip", "interleave", "interpose", "partition",
        "count", "empty?", "not-empty", "seq", "reduce", "range", "frequencies", "group-by",
        "some", "every?", "not-any?", "contains?",
    ] {
        crate::help::register_help(crate::help::HelpEntry {
            name: name.to_string(),
            signature: format!("({name} ...)"),
            description: format!("Collection operation: {name}."),
            examples: vec![],
            related: vec![],
            category: "Collections".to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::ToolExec;

    struct NoTools;
    impl ToolExec for NoTools {
        fn call(&mut self, _name: &str, _args: Value, _memory: &mut Value) -> Result<Value, RuntimeError> {
            Err(RuntimeError::Custom("no tools in this test".to_string()))
        }
    }

    fn interp() -> (NoTools, Value, Value) {
        (NoTools, Value::map(vec![]), Value::map(vec![]))
    }

    #[test]
    fn filter_with_keyword_selector() {
        let (mut tools, ctx, memory) = interp();
        let mut i = Interp::new(&ctx, memory, &mut tools);
        let rows = Value::vector(vec![
            Value::map(vec![(Value::keyword("ok"), Value::Bool(true))]),
            Value::map(vec![(Value::keyword("ok"), Value::Bool(false))]),
        ]);
        let result = n_filter(&[Value::keyword("ok"), rows], &mut i).unwrap();
        assert_eq!(result, Value::vector(vec![Value::map(vec![(Value::keyword("ok"), Value::Bool(true))])]));
    }

    #[test]
    fn reduce_without_init_uses_first_element() {
        let (mut tools, ctx, memory) = interp();
        let mut i = Interp::new(&ctx, memory, &mut tools);
        let add = Value::BuiltIn(crate::builtins::arithmetic::builtin_add);
        let coll = Value::vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(n_reduce(&[add, coll], &mut i).unwrap(), Value::Int(6));
    }

    #[test]
    fn take_drop_and_nth_bounds() {
        let coll = Value::vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            builtin_take(&[Value::Int(2), coll.clone()]).unwrap(),
            Value::vector(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            builtin_nth(&[coll.clone(), Value::Int(5), Value::string("default")]).unwrap(),
            Value::string("default")
        );
        assert!(builtin_nth(&[coll, Value::Int(5)]).is_err());
    }

    #[test]
    fn set_as_predicate_membership_filter() {
        let (mut tools, ctx, memory) = interp();
        let mut i = Interp::new(&ctx, memory, &mut tools);
        let allowed = Value::set(vec![Value::Int(1), Value::Int(3)]);
        let coll = Value::vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let result = n_filter(&[allowed, coll], &mut i).unwrap();
        assert_eq!(result, Value::vector(vec![Value::Int(1), Value::Int(3)]));
    }
}
