// ABOUTME: Raw AST produced by the reader — syntactic shape only, no validation

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    /// nil, bool, int, float, string, keyword — the literal leaves. Reuses
    /// `Value` directly since the Raw AST's literal universe is exactly the
    /// scalar subset of the runtime Value universe.
    Literal(Value),
    Vector(Vec<RawNode>),
    /// Flat key/value pairs in source order; the reader has already
    /// rejected odd counts.
    MapLit(Vec<(RawNode, RawNode)>),
    SetLit(Vec<RawNode>),
    Sym(String),
    NsSym { namespace: String, name: String },
    /// `*1`, `*2`, `*3`.
    TurnHistory(u8),
    /// `#(...)` — body kept raw, desugared by the analyzer.
    ShortFn(Vec<RawNode>),
    List(Vec<RawNode>),
    Program(Vec<RawNode>),
}
