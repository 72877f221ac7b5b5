// ABOUTME: Data-key static analysis (spec.md §4.5) — which ctx(key) entries a program touches

use crate::core::{Binding, CoreNode, Pattern};
use std::collections::HashSet;

/// Returns every key referenced as `ctx(key)` anywhere in `core`, including
/// inside nested closures. Hosts use this to prune large context maps down
/// to only what a program actually reads.
pub fn extract(core: &CoreNode) -> HashSet<String> {
    let mut keys = HashSet::new();
    walk(core, &mut keys);
    keys
}

fn walk(node: &CoreNode, keys: &mut HashSet<String>) {
    match node {
        CoreNode::Literal(_) | CoreNode::Var(_) | CoreNode::Memory(_) | CoreNode::TurnHistory(_) => {}
        CoreNode::Ctx(key) => {
            keys.insert(key.clone());
        }
        CoreNode::Vector(items) | CoreNode::Set(items) | CoreNode::Do(items) | CoreNode::And(items) | CoreNode::Or(items) | CoreNode::Juxt(items) => {
            for item in items {
                walk(item, keys);
            }
        }
        CoreNode::Map(pairs) => {
            for (k, v) in pairs {
                walk(k, keys);
                walk(v, keys);
            }
        }
        CoreNode::Let { bindings, body } => {
            for Binding { pattern, value } in bindings {
                walk_pattern(pattern, keys);
                walk(value, keys);
            }
            walk(body, keys);
        }
        CoreNode::If { cond, then, els } => {
            walk(cond, keys);
            walk(then, keys);
            walk(els, keys);
        }
        CoreNode::Fn { params, body } => {
            for p in params {
                walk_pattern(p, keys);
            }
            walk(body, keys);
        }
        CoreNode::Call { callee, args } => {
            walk(callee, keys);
            for a in args {
                walk(a, keys);
            }
        }
        CoreNode::CallTool { args, .. } => walk(args, keys),
        CoreNode::CtxCall { args, .. } => {
            for a in args {
                walk(a, keys);
            }
        }
        CoreNode::Where { value, .. } => {
            if let Some(v) = value {
                walk(v, keys);
            }
        }
        CoreNode::PredCombinator { preds, .. } => {
            for p in preds {
                walk(p, keys);
            }
        }
        CoreNode::Def { value, .. } => walk(value, keys),
    }
}

fn walk_pattern(pattern: &Pattern, keys: &mut HashSet<String>) {
    match pattern {
        Pattern::Var(_) => {}
        Pattern::DestructureKeys { defaults, .. } | Pattern::DestructureMap { defaults, .. } => {
            for (_, default_expr) in defaults {
                walk(default_expr, keys);
            }
        }
        Pattern::DestructureAs { inner, .. } => walk_pattern(inner, keys),
        Pattern::DestructureSeq { items, rest } => {
            for p in items {
                walk_pattern(p, keys);
            }
            if let Some(r) = rest {
                walk_pattern(r, keys);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoreNode;

    #[test]
    fn extracts_top_level_ctx_ref() {
        let node = CoreNode::Vector(vec![CoreNode::Ctx("y".to_string()), CoreNode::Literal(crate::value::Value::Int(1))]);
        let keys = extract(&node);
        assert_eq!(keys, HashSet::from(["y".to_string()]));
    }

    #[test]
    fn extracts_ctx_ref_inside_nested_fn() {
        let node = CoreNode::Fn {
            params: vec![Pattern::Var("x".to_string())],
            body: Box::new(CoreNode::If {
                cond: Box::new(CoreNode::Var("x".to_string())),
                then: Box::new(CoreNode::Ctx("a".to_string())),
                els: Box::new(CoreNode::Ctx("b".to_string())),
            }),
        };
        assert_eq!(extract(&node), HashSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn def_value_and_where_value_are_walked() {
        let def = CoreNode::Def {
            name: "x".to_string(),
            value: Box::new(CoreNode::Ctx("cfg".to_string())),
        };
        assert_eq!(extract(&def), HashSet::from(["cfg".to_string()]));

        let where_node = CoreNode::Where {
            path: vec![],
            op: crate::core::WhereOp::Eq,
            value: Some(Box::new(CoreNode::Ctx("threshold".to_string()))),
        };
        assert_eq!(extract(&where_node), HashSet::from(["threshold".to_string()]));
    }
}
