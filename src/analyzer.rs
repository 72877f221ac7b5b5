// ABOUTME: Raw AST -> Core AST lowering: scope enforcement, desugaring, validation (spec.md §4.2)

use crate::core::{
    Binding, CoreNode, FieldPathSegment, Pattern, PredCombinatorKind, WhereOp,
};
use crate::error::AnalysisError;
use crate::raw::RawNode;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    TopLevel,
    Lexical,
}

/// Lowers a whole program (possibly wrapped in `RawNode::Program`) into a
/// single Core AST node, wrapping multiple top-level forms in `Do` so the
/// evaluator always has one node to walk.
pub fn analyze_program(raw: &RawNode) -> Result<CoreNode, AnalysisError> {
    match raw {
        RawNode::Program(forms) => {
            let lowered = forms
                .iter()
                .map(|f| analyze(f, Scope::TopLevel))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CoreNode::Do(lowered))
        }
        other => analyze(other, Scope::TopLevel),
    }
}

pub fn analyze(raw: &RawNode, scope: Scope) -> Result<CoreNode, AnalysisError> {
    match raw {
        RawNode::Literal(v) => Ok(CoreNode::Literal(v.clone())),
        RawNode::Vector(items) => Ok(CoreNode::Vector(
            items
                .iter()
                .map(|i| analyze(i, scope))
                .collect::<Result<_, _>>()?,
        )),
        RawNode::MapLit(pairs) => Ok(CoreNode::Map(
            pairs
                .iter()
                .map(|(k, v)| Ok((analyze(k, scope)?, analyze(v, scope)?)))
                .collect::<Result<_, AnalysisError>>()?,
        )),
        RawNode::SetLit(items) => Ok(CoreNode::Set(
            items
                .iter()
                .map(|i| analyze(i, scope))
                .collect::<Result<_, _>>()?,
        )),
        RawNode::TurnHistory(n) => Ok(CoreNode::TurnHistory(*n)),
        RawNode::Sym(name) => analyze_symbol(name),
        RawNode::NsSym { namespace, name } => analyze_ns_symbol(namespace, name),
        RawNode::ShortFn(body) => analyze_short_fn(body),
        RawNode::List(items) => analyze_list(items, scope),
        RawNode::Program(_) => Err(AnalysisError::InvalidForm(
            "nested program form".to_string(),
        )),
    }
}

fn is_placeholder(name: &str) -> bool {
    match name.strip_prefix('%') {
        Some("") => true,
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn analyze_symbol(name: &str) -> Result<CoreNode, AnalysisError> {
    if is_placeholder(name) {
        return Err(AnalysisError::InvalidPlaceholder(format!(
            "placeholder '{name}' used outside a #() short-fn"
        )));
    }
    Ok(CoreNode::Var(name.to_string()))
}

fn analyze_ns_symbol(namespace: &str, name: &str) -> Result<CoreNode, AnalysisError> {
    match namespace {
        "ctx" => Ok(CoreNode::Ctx(name.to_string())),
        "memory" => Ok(CoreNode::Memory(name.to_string())),
        _ => Err(AnalysisError::InvalidForm(format!(
            "unknown namespace '{namespace}' in {namespace}/{name}"
        ))),
    }
}

// ============================================================================
// Short-fn desugaring
// ============================================================================

fn collect_placeholder_max(raw: &RawNode, max: &mut u32) {
    match raw {
        RawNode::Sym(name) => {
            if let Some(digits) = name.strip_prefix('%') {
                if digits.is_empty() {
                    *max = (*max).max(1);
                } else if let Ok(n) = digits.parse::<u32>() {
                    *max = (*max).max(n);
                }
            }
        }
        RawNode::Vector(items) | RawNode::List(items) | RawNode::SetLit(items) => {
            for i in items {
                collect_placeholder_max(i, max);
            }
        }
        RawNode::MapLit(pairs) => {
            for (k, v) in pairs {
                collect_placeholder_max(k, max);
                collect_placeholder_max(v, max);
            }
        }
        // Nested #() forms have their own placeholder scope.
        RawNode::ShortFn(_) => {}
        _ => {}
    }
}

fn rewrite_bare_percent(raw: &RawNode) -> RawNode {
    match raw {
        RawNode::Sym(name) if name == "%" => RawNode::Sym("%1".to_string()),
        RawNode::Vector(items) => RawNode::Vector(items.iter().map(rewrite_bare_percent).collect()),
        RawNode::List(items) => RawNode::List(items.iter().map(rewrite_bare_percent).collect()),
        RawNode::SetLit(items) => RawNode::SetLit(items.iter().map(rewrite_bare_percent).collect()),
        RawNode::MapLit(pairs) => RawNode::MapLit(
            pairs
                .iter()
                .map(|(k, v)| (rewrite_bare_percent(k), rewrite_bare_percent(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn analyze_short_fn(body: &[RawNode]) -> Result<CoreNode, AnalysisError> {
    let mut max = 0u32;
    for node in body {
        collect_placeholder_max(node, &mut max);
    }

    let params: Vec<Pattern> = (1..=max).map(|n| Pattern::Var(format!("%{n}"))).collect();

    let rewritten: Vec<RawNode> = body.iter().map(rewrite_bare_percent).collect();
    let body_core = if rewritten.len() == 1 {
        analyze(&rewritten[0], Scope::Lexical)?
    } else {
        CoreNode::Do(
            rewritten
                .iter()
                .map(|n| analyze(n, Scope::Lexical))
                .collect::<Result<_, _>>()?,
        )
    };

    Ok(CoreNode::Fn {
        params,
        body: Box::new(body_core),
    })
}

// ============================================================================
// List / special-form dispatch
// ============================================================================

fn head_name(items: &[RawNode]) -> Option<&str> {
    match items.first() {
        Some(RawNode::Sym(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn analyze_list(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.is_empty() {
        return Ok(CoreNode::Literal(Value::Nil));
    }

    if let Some(RawNode::NsSym { namespace, name }) = items.first() {
        if namespace == "ctx" {
            let args = items[1..]
                .iter()
                .map(|a| analyze(a, scope))
                .collect::<Result<_, _>>()?;
            return Ok(CoreNode::CtxCall {
                tool_name: name.clone(),
                args,
            });
        }
    }

    match head_name(items) {
        Some("let") => analyze_let(items, scope),
        Some("if") => analyze_if(items, scope),
        Some("when") => analyze_when(items, scope),
        Some("if-let") => analyze_if_let(items, scope),
        Some("when-let") => analyze_when_let(items, scope),
        Some("cond") => analyze_cond(items, scope),
        Some("fn") => analyze_fn(items),
        Some("do") => analyze_do(items, scope),
        Some("and") => analyze_variadic_logic(items, scope, true),
        Some("or") => analyze_variadic_logic(items, scope, false),
        Some("->") => analyze_thread(items, scope, true),
        Some("->>") => analyze_thread(items, scope, false),
        Some("where") => analyze_where(items, scope),
        Some("all-of") => analyze_pred_combinator(items, scope, PredCombinatorKind::All),
        Some("any-of") => analyze_pred_combinator(items, scope, PredCombinatorKind::Any),
        Some("none-of") => analyze_pred_combinator(items, scope, PredCombinatorKind::None),
        Some("juxt") => Ok(CoreNode::Juxt(
            items[1..]
                .iter()
                .map(|a| analyze(a, scope))
                .collect::<Result<_, _>>()?,
        )),
        Some("call") => analyze_call_tool(items, scope),
        Some("return") => analyze_return_fail(items, scope, "return"),
        Some("fail") => analyze_return_fail(items, scope, "fail"),
        Some("def") => analyze_def(items, scope),
        Some("defn") => analyze_defn(items, scope),
        Some(op @ ("=" | "not=" | ">" | "<" | ">=" | "<=")) => analyze_comparison(op, items, scope),
        _ => {
            let callee = analyze(&items[0], scope)?;
            let args = items[1..]
                .iter()
                .map(|a| analyze(a, scope))
                .collect::<Result<_, _>>()?;
            Ok(CoreNode::Call {
                callee: Box::new(callee),
                args,
            })
        }
    }
}

fn analyze_comparison(op: &str, items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    let args = &items[1..];
    if args.len() != 2 {
        return Err(AnalysisError::arity(op, "2", args.len()));
    }
    let callee = CoreNode::Var(op.to_string());
    let args = args
        .iter()
        .map(|a| analyze(a, scope))
        .collect::<Result<_, _>>()?;
    Ok(CoreNode::Call {
        callee: Box::new(callee),
        args,
    })
}

fn analyze_do(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    // `do` preserves the caller's scope: `(do (def ...))` at top level is legal.
    Ok(CoreNode::Do(
        items[1..]
            .iter()
            .map(|i| analyze(i, scope))
            .collect::<Result<_, _>>()?,
    ))
}

fn analyze_variadic_logic(items: &[RawNode], scope: Scope, is_and: bool) -> Result<CoreNode, AnalysisError> {
    let clauses = items[1..]
        .iter()
        .map(|i| analyze(i, scope))
        .collect::<Result<_, _>>()?;
    Ok(if is_and {
        CoreNode::And(clauses)
    } else {
        CoreNode::Or(clauses)
    })
}

fn analyze_if(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.len() != 4 {
        return Err(AnalysisError::arity("if", "3", items.len() - 1));
    }
    Ok(CoreNode::If {
        cond: Box::new(analyze(&items[1], scope)?),
        then: Box::new(analyze(&items[2], Scope::Lexical)?),
        els: Box::new(analyze(&items[3], Scope::Lexical)?),
    })
}

fn analyze_when(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.len() != 3 {
        return Err(AnalysisError::arity("when", "2", items.len() - 1));
    }
    Ok(CoreNode::If {
        cond: Box::new(analyze(&items[1], scope)?),
        then: Box::new(analyze(&items[2], Scope::Lexical)?),
        els: Box::new(CoreNode::Literal(Value::Nil)),
    })
}

fn single_symbol_binding(binding_vec: &RawNode) -> Result<(String, RawNode), AnalysisError> {
    match binding_vec {
        RawNode::Vector(pair) if pair.len() == 2 => match &pair[0] {
            RawNode::Sym(name) => Ok((name.clone(), pair[1].clone())),
            _ => Err(AnalysisError::InvalidForm(
                "if-let/when-let binding must be a plain symbol".to_string(),
            )),
        },
        _ => Err(AnalysisError::InvalidForm(
            "if-let/when-let requires a single [name cond] binding vector".to_string(),
        )),
    }
}

fn analyze_if_let(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.len() != 4 {
        return Err(AnalysisError::arity("if-let", "3", items.len() - 1));
    }
    let (name, cond_raw) = single_symbol_binding(&items[1])?;
    let cond_core = analyze(&cond_raw, scope)?;
    let then = analyze(&items[2], Scope::Lexical)?;
    let els = analyze(&items[3], Scope::Lexical)?;
    Ok(CoreNode::Let {
        bindings: vec![Binding {
            pattern: Pattern::Var(name.clone()),
            value: cond_core,
        }],
        body: Box::new(CoreNode::If {
            cond: Box::new(CoreNode::Var(name)),
            then: Box::new(then),
            els: Box::new(els),
        }),
    })
}

fn analyze_when_let(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.len() != 3 {
        return Err(AnalysisError::arity("when-let", "2", items.len() - 1));
    }
    let (name, cond_raw) = single_symbol_binding(&items[1])?;
    let cond_core = analyze(&cond_raw, scope)?;
    let body = analyze(&items[2], Scope::Lexical)?;
    Ok(CoreNode::Let {
        bindings: vec![Binding {
            pattern: Pattern::Var(name.clone()),
            value: cond_core,
        }],
        body: Box::new(CoreNode::If {
            cond: Box::new(CoreNode::Var(name)),
            then: Box::new(body),
            els: Box::new(CoreNode::Literal(Value::Nil)),
        }),
    })
}

fn analyze_cond(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    let clauses = &items[1..];
    if clauses.is_empty() {
        return Err(AnalysisError::InvalidCondForm("(cond) has no clauses".to_string()));
    }

    // Strip a trailing `:else result` pair before checking parity.
    let (pairs, else_result) = if clauses.len() % 2 == 1 {
        if matches!(&clauses[clauses.len() - 2], RawNode::Literal(Value::Keyword(k)) if &**k == "else")
        {
            (&clauses[..clauses.len() - 2], Some(&clauses[clauses.len() - 1]))
        } else {
            return Err(AnalysisError::InvalidCondForm(
                "odd number of cond clauses without a trailing :else".to_string(),
            ));
        }
    } else {
        (clauses, None)
    };

    let mut acc = match else_result {
        Some(r) => analyze(r, Scope::Lexical)?,
        None => CoreNode::Literal(Value::Nil),
    };

    for pair in pairs.chunks(2).rev() {
        let cond = analyze(&pair[0], scope)?;
        let then = analyze(&pair[1], Scope::Lexical)?;
        acc = CoreNode::If {
            cond: Box::new(cond),
            then: Box::new(then),
            els: Box::new(acc),
        };
    }
    Ok(acc)
}

fn analyze_let(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.len() != 3 {
        return Err(AnalysisError::arity("let", "2", items.len() - 1));
    }
    let binding_vec = match &items[1] {
        RawNode::Vector(v) => v,
        _ => return Err(AnalysisError::InvalidForm("let bindings must be a vector".to_string())),
    };
    if binding_vec.len() % 2 != 0 {
        return Err(AnalysisError::InvalidForm(
            "let binding vector must have an even number of elements".to_string(),
        ));
    }

    let mut bindings = Vec::new();
    for pair in binding_vec.chunks(2) {
        let pattern = analyze_pattern(&pair[0])?;
        let value = analyze(&pair[1], scope)?;
        bindings.push(Binding { pattern, value });
    }

    let body = analyze(&items[2], Scope::Lexical)?;
    Ok(CoreNode::Let {
        bindings,
        body: Box::new(body),
    })
}

fn analyze_fn(items: &[RawNode]) -> Result<CoreNode, AnalysisError> {
    if items.len() != 3 {
        return Err(AnalysisError::arity("fn", "2", items.len() - 1));
    }
    let param_vec = match &items[1] {
        RawNode::Vector(v) => v,
        _ => return Err(AnalysisError::InvalidForm("fn params must be a vector".to_string())),
    };
    let params = param_vec
        .iter()
        .map(analyze_pattern)
        .collect::<Result<Vec<_>, _>>()?;
    let body = analyze(&items[2], Scope::Lexical)?;
    Ok(CoreNode::Fn {
        params,
        body: Box::new(body),
    })
}

// ============================================================================
// Threading macros
// ============================================================================

fn analyze_thread(items: &[RawNode], scope: Scope, is_first: bool) -> Result<CoreNode, AnalysisError> {
    if items.len() < 2 {
        return Err(AnalysisError::InvalidThreadForm(
            "threading macro requires a head expression".to_string(),
        ));
    }
    let mut acc = items[1].clone();
    for step in &items[2..] {
        acc = thread_step(&acc, step, is_first)?;
    }
    analyze(&acc, scope)
}

fn thread_step(acc: &RawNode, step: &RawNode, is_first: bool) -> Result<RawNode, AnalysisError> {
    match step {
        RawNode::List(call) => {
            if call.is_empty() {
                return Err(AnalysisError::InvalidThreadForm(
                    "threading step cannot be an empty list".to_string(),
                ));
            }
            let mut new_call = vec![call[0].clone()];
            if is_first {
                new_call.push(acc.clone());
                new_call.extend(call[1..].iter().cloned());
            } else {
                new_call.extend(call[1..].iter().cloned());
                new_call.push(acc.clone());
            }
            Ok(RawNode::List(new_call))
        }
        other => Ok(RawNode::List(vec![other.clone(), acc.clone()])),
    }
}

// ============================================================================
// where / predicate combinators / juxt
// ============================================================================

fn field_path_from_raw(raw: &RawNode) -> Result<Vec<FieldPathSegment>, AnalysisError> {
    let to_segment = |node: &RawNode| -> Result<FieldPathSegment, AnalysisError> {
        match node {
            RawNode::Literal(Value::Keyword(k)) => Ok(FieldPathSegment::Keyword(k.clone())),
            RawNode::Literal(Value::String(s)) => Ok(FieldPathSegment::String(s.clone())),
            _ => Err(AnalysisError::InvalidWhereForm(
                "where path segments must be keywords or strings".to_string(),
            )),
        }
    };
    match raw {
        RawNode::Vector(segs) => segs.iter().map(to_segment).collect(),
        single => Ok(vec![to_segment(single)?]),
    }
}

fn where_op_from_symbol(sym: &str) -> Result<WhereOp, AnalysisError> {
    Ok(match sym {
        "=" => WhereOp::Eq,
        "not=" => WhereOp::NotEq,
        ">" => WhereOp::Gt,
        "<" => WhereOp::Lt,
        ">=" => WhereOp::Gte,
        "<=" => WhereOp::Lte,
        "includes" => WhereOp::Includes,
        "in" => WhereOp::In,
        "truthy" => WhereOp::Truthy,
        other => {
            return Err(AnalysisError::InvalidWhereOperator(format!(
                "unknown where operator '{other}'"
            )))
        }
    })
}

fn analyze_where(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.len() < 3 || items.len() > 4 {
        return Err(AnalysisError::InvalidWhereForm(
            "(where path op value?) takes 2 or 3 arguments".to_string(),
        ));
    }
    let path = field_path_from_raw(&items[1])?;
    let op_sym = match &items[2] {
        RawNode::Sym(s) => s.as_str(),
        _ => {
            return Err(AnalysisError::InvalidWhereForm(
                "where operator must be a bare symbol".to_string(),
            ))
        }
    };
    let op = where_op_from_symbol(op_sym)?;
    if op == WhereOp::Truthy && items.len() != 3 {
        return Err(AnalysisError::InvalidWhereForm(
            "truthy takes no comparison value".to_string(),
        ));
    }
    if op != WhereOp::Truthy && items.len() != 4 {
        return Err(AnalysisError::InvalidWhereForm(format!(
            "where operator '{op_sym}' requires a comparison value"
        )));
    }
    let value = if items.len() == 4 {
        Some(Box::new(analyze(&items[3], scope)?))
    } else {
        None
    };
    Ok(CoreNode::Where { path, op, value })
}

fn analyze_pred_combinator(
    items: &[RawNode],
    scope: Scope,
    kind: PredCombinatorKind,
) -> Result<CoreNode, AnalysisError> {
    let preds = items[1..]
        .iter()
        .map(|p| analyze(p, scope))
        .collect::<Result<_, _>>()?;
    Ok(CoreNode::PredCombinator { kind, preds })
}

// ============================================================================
// Tool invocation
// ============================================================================

fn analyze_call_tool(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if items.len() < 2 || items.len() > 3 {
        return Err(AnalysisError::InvalidCallToolName(
            "(call name args?) takes 1 or 2 arguments".to_string(),
        ));
    }
    let name = match &items[1] {
        RawNode::Literal(Value::String(s)) => s.to_string(),
        _ => {
            return Err(AnalysisError::InvalidCallToolName(
                "call's first argument must be a literal string".to_string(),
            ))
        }
    };
    let args = if items.len() == 3 {
        let args_core = analyze(&items[2], scope)?;
        match &args_core {
            CoreNode::Map(_) | CoreNode::Var(_) | CoreNode::Call { .. } | CoreNode::Let { .. } => {
                args_core
            }
            _ => {
                return Err(AnalysisError::InvalidCallToolName(
                    "call's second argument must evaluate to a map".to_string(),
                ))
            }
        }
    } else {
        CoreNode::Map(Vec::new())
    };
    Ok(CoreNode::CallTool {
        name,
        args: Box::new(args),
    })
}

fn analyze_return_fail(items: &[RawNode], scope: Scope, which: &str) -> Result<CoreNode, AnalysisError> {
    if items.len() != 2 {
        return Err(AnalysisError::arity(which, "1", items.len() - 1));
    }
    let value = analyze(&items[1], scope)?;
    Ok(CoreNode::CallTool {
        name: which.to_string(),
        args: Box::new(value),
    })
}

// ============================================================================
// def / defn
// ============================================================================

fn analyze_def(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if scope != Scope::TopLevel {
        return Err(AnalysisError::InvalidForm(
            "def is only legal at top level".to_string(),
        ));
    }
    let (name, value_raw) = match items.len() {
        3 => (&items[1], &items[2]),
        4 => (&items[1], &items[3]), // docstring at items[2] is ignored
        _ => return Err(AnalysisError::arity("def", "2", items.len() - 1)),
    };
    let name = match name {
        RawNode::Sym(s) => s.clone(),
        _ => return Err(AnalysisError::InvalidForm("def name must be a symbol".to_string())),
    };
    let value = analyze(value_raw, Scope::TopLevel)?;
    Ok(CoreNode::Def {
        name,
        value: Box::new(value),
    })
}

fn analyze_defn(items: &[RawNode], scope: Scope) -> Result<CoreNode, AnalysisError> {
    if scope != Scope::TopLevel {
        return Err(AnalysisError::InvalidForm(
            "defn is only legal at top level".to_string(),
        ));
    }
    if items.len() < 3 {
        return Err(AnalysisError::arity("defn", "at least 2", items.len() - 1));
    }
    let name = match &items[1] {
        RawNode::Sym(s) => s.clone(),
        _ => return Err(AnalysisError::InvalidForm("defn name must be a symbol".to_string())),
    };

    // Optional docstring between name and params.
    let (params_idx, body_start) = match &items[2] {
        RawNode::Literal(Value::String(_)) => (3, 4),
        _ => (2, 3),
    };
    let params_raw = items.get(params_idx).ok_or_else(|| {
        AnalysisError::InvalidForm("defn is missing a parameter vector".to_string())
    })?;
    let param_vec = match params_raw {
        RawNode::Vector(v) => v,
        RawNode::List(_) => {
            return Err(AnalysisError::InvalidForm(
                "multi-arity defn is not supported".to_string(),
            ))
        }
        _ => return Err(AnalysisError::InvalidForm("defn params must be a vector".to_string())),
    };
    let params = param_vec
        .iter()
        .map(analyze_pattern)
        .collect::<Result<Vec<_>, _>>()?;

    let body_forms = &items[body_start..];
    if body_forms.is_empty() {
        return Err(AnalysisError::InvalidForm("defn body is empty".to_string()));
    }
    let body = if body_forms.len() == 1 {
        analyze(&body_forms[0], Scope::Lexical)?
    } else {
        CoreNode::Do(
            body_forms
                .iter()
                .map(|f| analyze(f, Scope::Lexical))
                .collect::<Result<_, _>>()?,
        )
    };

    Ok(CoreNode::Def {
        name,
        value: Box::new(CoreNode::Fn {
            params,
            body: Box::new(body),
        }),
    })
}

// ============================================================================
// Pattern analysis (destructuring)
// ============================================================================

fn analyze_pattern(raw: &RawNode) -> Result<Pattern, AnalysisError> {
    match raw {
        RawNode::Sym(s) if s == "&" => Err(AnalysisError::UnsupportedPattern(
            "'&' may only appear inside a vector destructuring pattern".to_string(),
        )),
        RawNode::Sym(s) => Ok(Pattern::Var(s.clone())),
        RawNode::Vector(items) => analyze_seq_pattern(items),
        RawNode::MapLit(pairs) => analyze_map_pattern(pairs),
        other => Err(AnalysisError::UnsupportedPattern(format!(
            "unsupported binding pattern: {other:?}"
        ))),
    }
}

fn analyze_seq_pattern(items: &[RawNode]) -> Result<Pattern, AnalysisError> {
    let mut out = Vec::new();
    let mut rest = None;
    let mut i = 0;
    while i < items.len() {
        if let RawNode::Sym(s) = &items[i] {
            if s == "&" {
                let rest_raw = items.get(i + 1).ok_or_else(|| {
                    AnalysisError::UnsupportedPattern("'&' with no following pattern".to_string())
                })?;
                rest = Some(Box::new(analyze_pattern(rest_raw)?));
                i += 2;
                continue;
            }
        }
        out.push(analyze_pattern(&items[i])?);
        i += 1;
    }
    Ok(Pattern::DestructureSeq { items: out, rest })
}

/// `{:keys [a b] :or {a 1} :as m}` plus the general rename form
/// `{a :x b :y}`. Unknown keys are rejected as `unsupported_pattern`.
fn analyze_map_pattern(pairs: &[(RawNode, RawNode)]) -> Result<Pattern, AnalysisError> {
    let mut keys: Vec<String> = Vec::new();
    let mut renames: Vec<(String, String)> = Vec::new();
    let mut defaults: Vec<(String, CoreNode)> = Vec::new();
    let mut as_name: Option<String> = None;

    for (k, v) in pairs {
        match k {
            RawNode::Literal(Value::Keyword(kw)) if &**kw == "keys" => {
                let names = match v {
                    RawNode::Vector(names) => names,
                    _ => {
                        return Err(AnalysisError::UnsupportedPattern(
                            ":keys must be bound to a vector of symbols".to_string(),
                        ))
                    }
                };
                for n in names {
                    match n {
                        RawNode::Sym(s) => keys.push(s.clone()),
                        _ => {
                            return Err(AnalysisError::UnsupportedPattern(
                                ":keys entries must be symbols".to_string(),
                            ))
                        }
                    }
                }
            }
            RawNode::Literal(Value::Keyword(kw)) if &**kw == "or" => {
                let pairs = match v {
                    RawNode::MapLit(p) => p,
                    _ => {
                        return Err(AnalysisError::UnsupportedPattern(
                            ":or must be bound to a map".to_string(),
                        ))
                    }
                };
                for (dk, dv) in pairs {
                    let name = match dk {
                        RawNode::Sym(s) => s.clone(),
                        _ => {
                            return Err(AnalysisError::UnsupportedPattern(
                                ":or keys must be symbols".to_string(),
                            ))
                        }
                    };
                    defaults.push((name, analyze(dv, Scope::Lexical)?));
                }
            }
            RawNode::Literal(Value::Keyword(kw)) if &**kw == "as" => {
                as_name = match v {
                    RawNode::Sym(s) => Some(s.clone()),
                    _ => {
                        return Err(AnalysisError::UnsupportedPattern(
                            ":as must be bound to a symbol".to_string(),
                        ))
                    }
                };
            }
            RawNode::Sym(binding_name) => {
                let key_name = match v {
                    RawNode::Literal(Value::Keyword(kw)) => kw.to_string(),
                    RawNode::Literal(Value::String(s)) => s.to_string(),
                    _ => {
                        return Err(AnalysisError::UnsupportedPattern(
                            "map destructure rename value must be a keyword or string".to_string(),
                        ))
                    }
                };
                renames.push((binding_name.clone(), key_name));
            }
            _ => {
                return Err(AnalysisError::UnsupportedPattern(format!(
                    "unrecognised map destructuring key: {k:?}"
                )))
            }
        }
    }

    if renames.is_empty() && as_name.is_none() {
        Ok(Pattern::DestructureKeys {
            names: keys,
            defaults,
        })
    } else {
        for k in keys {
            renames.push((k.clone(), k));
        }
        let pat = Pattern::DestructureMap {
            renames,
            defaults,
            as_name: as_name.clone(),
        };
        Ok(pat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read;

    fn analyze_src(src: &str) -> CoreNode {
        analyze_program(&read(src).unwrap()).unwrap()
    }

    #[test]
    fn simple_call() {
        match analyze_src("(+ 1 2 3)") {
            CoreNode::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn if_requires_three_args() {
        assert!(analyze_program(&read("(if 1 2)").unwrap()).is_err());
    }

    #[test]
    fn let_desugars_bindings() {
        match analyze_src("(let [a 1 b 2] (+ a b))") {
            CoreNode::Let { bindings, .. } => assert_eq!(bindings.len(), 2),
            other => panic!("expected Let, got {other:?}"),
        }
    }

    #[test]
    fn def_rejected_in_lexical_scope() {
        let raw = read("(let [] (def x 1))").unwrap();
        assert!(analyze_program(&raw).is_err());
    }

    #[test]
    fn cond_without_clauses_is_error() {
        assert!(analyze_program(&read("(cond)").unwrap()).is_err());
    }

    #[test]
    fn cond_with_else() {
        match analyze_src("(cond :else 1)") {
            CoreNode::Literal(Value::Int(1)) => {}
            other => panic!("expected literal 1, got {other:?}"),
        }
    }

    #[test]
    fn short_fn_with_percent() {
        match analyze_src("#(+ % 1)") {
            CoreNode::Fn { params, .. } => {
                assert_eq!(params, vec![Pattern::Var("%1".to_string())])
            }
            other => panic!("expected Fn, got {other:?}"),
        }
    }

    #[test]
    fn placeholder_outside_short_fn_is_error() {
        assert!(analyze_program(&read("(+ %1 1)").unwrap()).is_err());
    }

    #[test]
    fn thread_first_desugars() {
        match analyze_src("(-> {:a 1} (assoc :b 2))") {
            CoreNode::Call { args, .. } => assert_eq!(args.len(), 3),
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn destructure_keys_with_or() {
        match analyze_src("(let [{:keys [a b] :or {b 99}} {:a 1}] [a b])") {
            CoreNode::Let { bindings, .. } => match &bindings[0].pattern {
                Pattern::DestructureKeys { names, defaults } => {
                    assert_eq!(names, &vec!["a".to_string(), "b".to_string()]);
                    assert_eq!(defaults.len(), 1);
                }
                other => panic!("expected DestructureKeys, got {other:?}"),
            },
            other => panic!("expected Let, got {other:?}"),
        }
    }
}
