// ABOUTME: Chained lexical environment frames for closures and `let`

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent (a new lexical frame,
    /// e.g. for `let`, `fn` application, or destructuring binds).
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope (doesn't walk the parent chain).
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a symbol in this scope and parent scopes recursively.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }
        None
    }

    #[allow(dead_code)]
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        if let Some(ref parent) = self.parent {
            return parent.set(name, value);
        }
        Err(RuntimeError::UnboundVar(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Int(42));
        assert_eq!(env.get("x"), Some(Value::Int(42)));
    }

    #[test]
    fn undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn shadowing() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Int(42));
        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Int(100));
        assert_eq!(child.get("x"), Some(Value::Int(100)));
    }

    #[test]
    fn parent_lookup() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Int(42));
        let child = Environment::with_parent(parent);
        assert_eq!(child.get("x"), Some(Value::Int(42)));
    }

    #[test]
    fn multiple_levels() {
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::Int(1));
        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::Int(2));
        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::Int(3));

        assert_eq!(child.get("a"), Some(Value::Int(1)));
        assert_eq!(child.get("b"), Some(Value::Int(2)));
        assert_eq!(child.get("c"), Some(Value::Int(3)));
    }
}
