// ABOUTME: Syntax highlighter for REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for PTC-Lisp syntax elements while preserving display width

use rustyline::Helper;
use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use std::borrow::Cow;
use std::collections::HashSet;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_BOOLEAN: &str = "\x1b[33m"; // Yellow
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_KEYWORD: &str = "\x1b[1;33m"; // Bold yellow
const COLOR_NAMESPACE: &str = "\x1b[35m"; // Magenta

/// Syntax-aware color highlighting for the PTC-Lisp REPL.
pub struct LispHelper;

impl LispHelper {
    pub fn new() -> Self {
        LispHelper
    }
}

impl Default for LispHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for LispHelper {}

impl Completer for LispHelper {
    type Candidate = String;
}

impl Hinter for LispHelper {
    type Hint = String;
}

impl Validator for LispHelper {}

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let special_forms = special_forms();
        let builtins = builtin_names();
        let highlighted = highlight_line(line, &special_forms, &builtins);

        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn is_symbol_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
}

fn highlight_line(line: &str, special_forms: &HashSet<&'static str>, builtins: &HashSet<&'static str>) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ';' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
            }

            // Keyword: `:name`
            ':' => {
                let start = i;
                i += 1;
                while i < chars.len() && !is_symbol_boundary(chars[i]) {
                    i += 1;
                }
                let kw: String = chars[start..i].iter().collect();
                result.push_str(COLOR_KEYWORD);
                result.push_str(&kw);
                result.push_str(COLOR_RESET);
            }

            '0'..='9' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num);
                result.push_str(COLOR_RESET);
            }

            '(' | ')' | '[' | ']' | '{' | '}' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            '#' if i + 1 < chars.len() && chars[i + 1] == '{' => {
                result.push_str(COLOR_PARENS);
                result.push('#');
                i += 1;
                result.push_str(COLOR_RESET);
            }

            c if c.is_whitespace() => {
                result.push(c);
                i += 1;
            }

            _ => {
                let start = i;
                while i < chars.len() && !is_symbol_boundary(chars[i]) {
                    i += 1;
                }
                let symbol: String = chars[start..i].iter().collect();

                if symbol == "true" || symbol == "false" || symbol == "nil" {
                    result.push_str(COLOR_BOOLEAN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if let Some((ns, rest)) = symbol.split_once('/') {
                    if ns == "ctx" || ns == "memory" {
                        result.push_str(COLOR_NAMESPACE);
                        result.push_str(ns);
                        result.push('/');
                        result.push_str(rest);
                        result.push_str(COLOR_RESET);
                    } else {
                        result.push_str(&symbol);
                    }
                } else if special_forms.contains(symbol.as_str()) {
                    result.push_str(COLOR_SPECIAL_FORM);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(symbol.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&symbol);
                }
            }
        }
    }

    result
}

/// Forms with dedicated analyzer handling (spec.md §4.2).
fn special_forms() -> HashSet<&'static str> {
    [
        "let", "if", "when", "if-let", "when-let", "cond", "fn", "do", "and", "or", "->", "->>",
        "where", "all-of", "any-of", "none-of", "juxt", "call", "return", "fail", "def", "defn",
    ]
    .iter()
    .copied()
    .collect()
}

/// Runtime library function names (spec.md §4.4).
fn builtin_names() -> HashSet<&'static str> {
    [
        "+", "-", "*", "/", "mod", "inc", "dec", "abs", "max", "min", "=", "not=", ">", "<", ">=",
        "<=", "not", "identity", "str", "subs", "join", "split", "trim", "replace", "parse-long",
        "parse-double", "nil?", "some?", "boolean?", "number?", "string?", "keyword?", "vector?",
        "set?", "map?", "coll?", "set", "zero?", "pos?", "neg?", "even?", "odd?", "get", "get-in",
        "assoc", "assoc-in", "update", "update-in", "dissoc", "merge", "select-keys", "keys",
        "vals", "entries", "update-vals", "filter", "remove", "find", "map", "mapv", "mapcat",
        "map-indexed", "sort", "sort-by", "reverse", "first", "second", "last", "nth", "rest",
        "butlast", "take", "drop", "take-last", "drop-last", "next", "take-while", "drop-while",
        "distinct", "distinct-by", "concat", "conj", "into", "flatten", "zip", "interleave",
        "interpose", "partition", "count", "empty?", "not-empty", "seq", "reduce", "range",
        "frequencies", "group-by", "some", "every?", "not-any?", "contains?", "min-by", "max-by",
        "sum-by", "avg-by", "help",
    ]
    .iter()
    .copied()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_highlighting() {
        let highlighted = highlight_line("42", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_NUMBER));
    }

    #[test]
    fn test_string_highlighting() {
        let highlighted = highlight_line("\"hello\"", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_STRING));
    }

    #[test]
    fn test_comment_highlighting() {
        let highlighted = highlight_line("; a comment", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_COMMENT));
    }

    #[test]
    fn test_special_form_highlighting() {
        let highlighted = highlight_line("(let [x 5] x)", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_SPECIAL_FORM));
        assert!(highlighted.contains(COLOR_PARENS));
    }

    #[test]
    fn test_builtin_function_highlighting() {
        let highlighted = highlight_line("(+ 1 2)", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_BUILTIN));
    }

    #[test]
    fn test_keyword_highlighting() {
        let highlighted = highlight_line("{:a 1}", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_KEYWORD));
    }

    #[test]
    fn test_nil_true_false_highlighting() {
        let highlighted = highlight_line("nil true false", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_BOOLEAN));
    }

    #[test]
    fn test_ctx_namespace_highlighting() {
        let highlighted = highlight_line("ctx/user-id", &special_forms(), &builtin_names());
        assert!(highlighted.contains(COLOR_NAMESPACE));
    }
}
