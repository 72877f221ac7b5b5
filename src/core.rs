// ABOUTME: Core AST — the only node shapes the evaluator consumes

use crate::value::Value;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum WhereOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    Gte,
    Lte,
    Includes,
    In,
    Truthy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredCombinatorKind {
    All,
    Any,
    None,
}

/// One segment of a `where` field path: a keyword or string, looked up
/// with flexible key access at each step.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPathSegment {
    Keyword(Rc<str>),
    String(Rc<str>),
}

pub type FieldPath = Vec<FieldPathSegment>;

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Var(String),
    /// `{:keys [a b] :or {a 1}}`
    DestructureKeys {
        names: Vec<String>,
        defaults: Vec<(String, CoreNode)>,
    },
    /// `{a :x b :y :or {a 1} :as m}` (general map destructure with renames)
    DestructureMap {
        renames: Vec<(String, String)>,
        defaults: Vec<(String, CoreNode)>,
        as_name: Option<String>,
    },
    DestructureAs {
        alias: String,
        inner: Box<Pattern>,
    },
    /// Vector destructure, optionally with `& rest`.
    DestructureSeq {
        items: Vec<Pattern>,
        rest: Option<Box<Pattern>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub pattern: Pattern,
    pub value: CoreNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoreNode {
    Literal(Value),
    Vector(Vec<CoreNode>),
    Map(Vec<(CoreNode, CoreNode)>),
    Set(Vec<CoreNode>),
    Var(String),
    Ctx(String),
    Memory(String),
    TurnHistory(u8),
    Let {
        bindings: Vec<Binding>,
        body: Box<CoreNode>,
    },
    If {
        cond: Box<CoreNode>,
        then: Box<CoreNode>,
        els: Box<CoreNode>,
    },
    Fn {
        params: Vec<Pattern>,
        body: Box<CoreNode>,
    },
    Do(Vec<CoreNode>),
    And(Vec<CoreNode>),
    Or(Vec<CoreNode>),
    Call {
        callee: Box<CoreNode>,
        args: Vec<CoreNode>,
    },
    CallTool {
        name: String,
        args: Box<CoreNode>,
    },
    CtxCall {
        tool_name: String,
        args: Vec<CoreNode>,
    },
    Where {
        path: FieldPath,
        op: WhereOp,
        value: Option<Box<CoreNode>>,
    },
    PredCombinator {
        kind: PredCombinatorKind,
        preds: Vec<CoreNode>,
    },
    Juxt(Vec<CoreNode>),
    Def {
        name: String,
        value: Box<CoreNode>,
    },
}
