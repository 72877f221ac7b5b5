// ABOUTME: Renders a Value back to source text (spec.md §4.6)

use crate::core::Pattern;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatterMode {
    /// Host language's own inspect rules — Rust's derived `Debug`.
    HostDebug,
    /// `nil/true/false`, JSON-escaped strings, `:keyword`, sorted maps,
    /// space-separated vectors. Used for LLM-facing feedback.
    ClojureStyle,
}

impl Default for FormatterMode {
    fn default() -> Self {
        FormatterMode::ClojureStyle
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormatterOptions {
    pub mode: FormatterMode,
    /// Max items rendered per collection; excess collapses to `...`.
    pub limit: Option<usize>,
    /// Max string bytes before truncation with `...`.
    pub printable_limit: Option<usize>,
}

pub fn to_source(value: &Value, opts: &FormatterOptions) -> String {
    match opts.mode {
        FormatterMode::HostDebug => format!("{value:?}"),
        FormatterMode::ClojureStyle => clojure(value, opts),
    }
}

fn truncated_items<'a>(items: &'a [Value], opts: &FormatterOptions) -> (&'a [Value], bool) {
    match opts.limit {
        Some(n) if items.len() > n => (&items[..n], true),
        _ => (items, false),
    }
}

fn clojure(value: &Value, opts: &FormatterOptions) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => json_escape(s, opts.printable_limit),
        Value::Keyword(k) => format!(":{k}"),
        Value::Vector(items) => {
            let (shown, truncated) = truncated_items(items, opts);
            let mut parts: Vec<String> = shown.iter().map(|v| clojure(v, opts)).collect();
            if truncated {
                parts.push("...".to_string());
            }
            format!("[{}]", parts.join(" "))
        }
        Value::Set(items) => {
            let (shown, truncated) = truncated_items(items, opts);
            let mut parts: Vec<String> = shown.iter().map(|v| clojure(v, opts)).collect();
            if truncated {
                parts.push("...".to_string());
            }
            format!("#{{{}}}", parts.join(" "))
        }
        Value::Map(pairs) => {
            let mut sorted = pairs.as_ref().clone();
            sorted.sort_by(|(k1, _), (k2, _)| sort_key(k1).cmp(&sort_key(k2)));
            let (shown, truncated) = match opts.limit {
                Some(n) if sorted.len() > n => (&sorted[..n], true),
                _ => (&sorted[..], false),
            };
            let mut parts: Vec<String> = shown
                .iter()
                .map(|(k, v)| format!("{} {}", clojure(k, opts), clojure(v, opts)))
                .collect();
            if truncated {
                parts.push("...".to_string());
            }
            format!("{{{}}}", parts.join(" "))
        }
        Value::Closure(c) => format!("#fn[{}]", param_labels(&c.params).join(" ")),
        Value::BuiltIn(_) => "#<builtin>".to_string(),
        Value::Native(n) => format!("#<builtin:{}>", n.name),
    }
}

fn sort_key(v: &Value) -> String {
    match v {
        Value::Keyword(k) | Value::String(k) => k.to_string(),
        other => clojure(other, &FormatterOptions::default()),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn char_boundary_at_or_before(s: &str, n: usize) -> usize {
    let mut n = n.min(s.len());
    while n > 0 && !s.is_char_boundary(n) {
        n -= 1;
    }
    n
}

fn json_escape(s: &str, printable_limit: Option<usize>) -> String {
    let (body, truncated) = match printable_limit {
        Some(n) if s.len() > n => (&s[..char_boundary_at_or_before(s, n)], true),
        _ => (s, false),
    };
    let mut out = String::with_capacity(body.len() + 2);
    out.push('"');
    for c in body.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    if truncated {
        out.push_str("...");
    }
    out.push('"');
    out
}

fn param_labels(pattern: &Pattern) -> Vec<String> {
    match pattern {
        Pattern::Var(name) => vec![name.clone()],
        Pattern::DestructureSeq { items, rest } => {
            let mut labels: Vec<String> = items.iter().flat_map(param_labels).collect();
            if let Some(r) = rest {
                labels.push(format!("&{}", param_labels(r).join(" ")));
            }
            labels
        }
        Pattern::DestructureKeys { .. } | Pattern::DestructureMap { .. } => vec!["{...}".to_string()],
        Pattern::DestructureAs { alias, .. } => vec![alias.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clojure_style_renders_sorted_map_and_keyword() {
        let v = Value::map(vec![
            (Value::keyword("b"), Value::Int(2)),
            (Value::keyword("a"), Value::Int(1)),
        ]);
        assert_eq!(to_source(&v, &FormatterOptions::default()), "{:a 1 :b 2}");
    }

    #[test]
    fn string_is_json_escaped() {
        let v = Value::string("a\"b\nc");
        assert_eq!(to_source(&v, &FormatterOptions::default()), "\"a\\\"b\\nc\"");
    }

    #[test]
    fn float_keeps_decimal_point() {
        assert_eq!(to_source(&Value::Float(3.0), &FormatterOptions::default()), "3.0");
        assert_eq!(to_source(&Value::Float(3.5), &FormatterOptions::default()), "3.5");
    }

    #[test]
    fn vector_limit_truncates_with_ellipsis() {
        let v = Value::vector(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let opts = FormatterOptions { limit: Some(2), ..Default::default() };
        assert_eq!(to_source(&v, &opts), "[1 2 ...]");
    }

    #[test]
    fn host_debug_uses_rust_debug() {
        let v = Value::Int(5);
        let opts = FormatterOptions { mode: FormatterMode::HostDebug, ..Default::default() };
        assert_eq!(to_source(&v, &opts), "Int(5)");
    }
}
