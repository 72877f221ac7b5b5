// ABOUTME: Value <-> JSON bridging for the CLI's --ctx/--memory flags and outcome printing
//
// Type mapping:
// - Map <-> JSON object (keyword/string keys become plain JSON string keys)
// - Vector/Set <-> JSON array
// - Int/Float <-> JSON number
// - String/Keyword <-> JSON string
// - Bool <-> JSON boolean
// - Nil <-> JSON null

use crate::value::Value;
use serde_json::{Map as JsonMap, Number, Value as Json};

pub fn to_json(value: &Value) -> Option<Json> {
    match value {
        Value::Nil => Some(Json::Null),
        Value::Bool(b) => Some(Json::Bool(*b)),
        Value::Int(i) => Some(Json::Number(Number::from(*i))),
        Value::Float(f) => Number::from_f64(*f).map(Json::Number),
        Value::String(s) => Some(Json::String(s.to_string())),
        Value::Keyword(k) => Some(Json::String(k.to_string())),
        Value::Vector(items) | Value::Set(items) => {
            items.iter().map(to_json).collect::<Option<Vec<_>>>().map(Json::Array)
        }
        Value::Map(pairs) => {
            let mut obj = JsonMap::new();
            for (k, v) in pairs.iter() {
                let key = match k {
                    Value::Keyword(k) | Value::String(k) => k.to_string(),
                    _ => return None, // JSON objects only have string keys
                };
                obj.insert(key, to_json(v)?);
            }
            Some(Json::Object(obj))
        }
        Value::Closure(_) | Value::BuiltIn(_) | Value::Native(_) => None,
    }
}

pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Json::String(s) => Value::string(s.clone()),
        Json::Array(items) => Value::vector(items.iter().map(from_json).collect()),
        Json::Object(obj) => {
            Value::map(obj.iter().map(|(k, v)| (Value::keyword(k.clone()), from_json(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_round_trips_through_json() {
        let v = Value::map(vec![
            (Value::keyword("name"), Value::string("Alice")),
            (Value::keyword("age"), Value::Int(30)),
        ]);
        let json = to_json(&v).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Alice", "age": 30}));
        assert_eq!(from_json(&json), v);
    }

    #[test]
    fn closures_are_not_json_representable() {
        assert_eq!(to_json(&Value::BuiltIn(|_| Ok(Value::Nil))), None);
    }
}
