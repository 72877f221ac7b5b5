// ABOUTME: The one shared flexible key-access helper (spec.md §9)
// ABOUTME: try the key as given, then its alternate atom/string form

use crate::value::Value;

/// Alternate-form candidates for a key, tried in order after the key as
/// given comes up empty. A keyword key also tries its string form; a
/// string key also tries its keyword form. Every other key type has no
/// alternate.
fn alternate(key: &Value) -> Option<Value> {
    match key {
        Value::Keyword(k) => Some(Value::String(k.clone())),
        Value::String(s) => Some(Value::Keyword(s.clone())),
        _ => None,
    }
}

/// Looks a key up in a map's association list using flexible key access:
/// the key as given, then its alternate form.
pub fn map_get<'a>(pairs: &'a [(Value, Value)], key: &Value) -> Option<&'a Value> {
    if let Some((_, v)) = pairs.iter().find(|(k, _)| k == key) {
        return Some(v);
    }
    if let Some(alt) = alternate(key) {
        if let Some((_, v)) = pairs.iter().find(|(k, _)| *k == alt) {
            return Some(v);
        }
    }
    None
}

/// Same contract as `map_get` but against any `Value` container: a map
/// uses flexible lookup, anything else yields `None` (callers decide
/// whether that's a type error or a `nil` default).
pub fn get(container: &Value, key: &Value) -> Option<Value> {
    match container {
        Value::Map(pairs) => map_get(pairs, key).cloned(),
        _ => None,
    }
}

/// Walks a path of keys through nested maps, flexible lookup at each step.
pub fn get_in(container: &Value, path: &[Value]) -> Option<Value> {
    let mut current = container.clone();
    for key in path {
        current = get(&current, key)?;
    }
    Some(current)
}

pub fn contains_key(pairs: &[(Value, Value)], key: &Value) -> bool {
    map_get(pairs, key).is_some()
}

/// Returns a new association list with `key` set to `value`, replacing any
/// existing entry found via flexible lookup (so re-assoc'ing `"a"` onto a
/// map already keyed by `:a` overwrites rather than duplicates).
pub fn assoc(pairs: &[(Value, Value)], key: Value, value: Value) -> Vec<(Value, Value)> {
    let mut out = Vec::with_capacity(pairs.len() + 1);
    let mut replaced = false;
    let alt = alternate(&key);
    for (k, v) in pairs {
        if *k == key || alt.as_ref() == Some(k) {
            out.push((k.clone(), value.clone()));
            replaced = true;
        } else {
            out.push((k.clone(), v.clone()));
        }
    }
    if !replaced {
        out.push((key, value));
    }
    out
}

pub fn dissoc(pairs: &[(Value, Value)], key: &Value) -> Vec<(Value, Value)> {
    let alt = alternate(key);
    pairs
        .iter()
        .filter(|(k, _)| k != key && alt.as_ref() != Some(k))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flexible_key_access_agrees_across_forms() {
        let by_kw = vec![(Value::keyword("a"), Value::Int(1))];
        let by_str = vec![(Value::string("a"), Value::Int(1))];
        assert_eq!(map_get(&by_kw, &Value::keyword("a")), Some(&Value::Int(1)));
        assert_eq!(map_get(&by_str, &Value::keyword("a")), Some(&Value::Int(1)));
        assert_eq!(map_get(&by_kw, &Value::string("a")), Some(&Value::Int(1)));
    }

    #[test]
    fn assoc_overwrites_via_alternate_form() {
        let pairs = vec![(Value::keyword("a"), Value::Int(1))];
        let updated = assoc(&pairs, Value::string("a"), Value::Int(2));
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].1, Value::Int(2));
    }
}
