// ABOUTME: Tokenizes and parses source text into Raw AST nodes (spec.md §4.1)

use crate::error::ReadError;
use crate::raw::RawNode;
use crate::value::Value;
use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while, take_while1},
    character::complete::{char, digit1, multispace1, none_of, one_of},
    combinator::{map, not, opt, peek, recognize, value},
    multi::many0,
    IResult, Parser,
};

// ============================================================================
// Whitespace, commas, comments
// ============================================================================

fn parse_comment(input: &str) -> IResult<&str, ()> {
    let (input, _) = char(';')(input)?;
    let (input, _) = take_while(|c| c != '\n')(input)?;
    Ok((input, ()))
}

fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((
        value((), multispace1),
        value((), char(',')),
        parse_comment,
    )))
    .map(|_| ())
    .parse(input)
}

// ============================================================================
// Literals
// ============================================================================

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '+' | '-' | '*' | '/' | '<' | '>' | '=' | '?' | '!' | '_' | '.' | '&'
        )
}

fn parse_number(input: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize((
        opt(char('-')),
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;

    if text.contains('.') || text.contains('e') || text.contains('E') {
        let f: f64 = text.parse().expect("reader: malformed float literal");
        Ok((rest, Value::Float(f)))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Ok((rest, Value::Int(i))),
            Err(_) => {
                let f: f64 = text.parse().expect("reader: malformed integer literal");
                Ok((rest, Value::Float(f)))
            }
        }
    }
}

fn parse_special_float(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Float(f64::INFINITY), tag("##Inf")),
        value(Value::Float(f64::NEG_INFINITY), tag("##-Inf")),
        value(Value::Float(f64::NAN), tag("##NaN")),
    ))
    .parse(input)
}

fn parse_char_literal(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('\\')(input)?;
    alt((
        value(Value::string("\n"), tag("newline")),
        value(Value::string(" "), tag("space")),
        value(Value::string("\t"), tag("tab")),
        value(Value::string("\r"), tag("return")),
        value(Value::string("\u{8}"), tag("backspace")),
        value(Value::string("\u{c}"), tag("formfeed")),
        map(nom::character::complete::anychar, |c| {
            Value::string(c.to_string())
        }),
    ))
    .parse(input)
}

fn parse_string_literal(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('"')(input)?;
    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('"')(input) {
        return Ok((input, Value::string("")));
    }
    let (input, content) = escaped(none_of("\"\\"), '\\', one_of("\"\\nrt")).parse(input)?;
    let (input, _) = char('"')(input)?;

    let mut out = String::new();
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Ok((input, Value::string(out)))
}

fn parse_keyword(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = char(':')(input)?;
    let (input, name) = take_while1(is_symbol_char)(input)?;
    Ok((input, RawNode::Literal(Value::keyword(name))))
}

fn parse_bare_symbol_text(input: &str) -> IResult<&str, &str> {
    recognize((
        one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-*/<>=?!_.&"),
        take_while(is_symbol_char),
    ))
    .parse(input)
}

fn parse_symbol_or_turnhist(input: &str) -> IResult<&str, RawNode> {
    let (rest, text) = parse_bare_symbol_text(input)?;

    if let Some(n) = turn_history_index(text) {
        return Ok((rest, RawNode::TurnHistory(n)));
    }

    match text.splitn(2, '/').collect::<Vec<_>>().as_slice() {
        [ns, name] if !ns.is_empty() => Ok((
            rest,
            RawNode::NsSym {
                namespace: ns.to_string(),
                name: name.to_string(),
            },
        )),
        // `""/x` — the divide operator and any other bare leading-slash
        // token is a plain symbol, not a namespaced one.
        _ => Ok((rest, RawNode::Sym(text.to_string()))),
    }
}

fn turn_history_index(text: &str) -> Option<u8> {
    let digits = text.strip_prefix('*')?;
    match digits {
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        _ => None,
    }
}

fn parse_var_ref(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = tag("#'")(input)?;
    let (input, text) = parse_bare_symbol_text(input)?;
    Ok((input, RawNode::Sym(text.to_string())))
}

// ============================================================================
// Collections
// ============================================================================

fn parse_vector(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = char('[')(input)?;
    let (mut input, _) = ws_and_comments(input)?;
    let mut items = Vec::new();
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(']')(input) {
            return Ok((rest, RawNode::Vector(items)));
        }
        let (rest, item) = parse_expr(input)?;
        items.push(item);
        let (rest, _) = ws_and_comments(rest)?;
        input = rest;
    }
}

fn parse_map(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = char('{')(input)?;
    let (mut input, _) = ws_and_comments(input)?;
    let mut items = Vec::new();
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('}')(input) {
            if items.len() % 2 != 0 {
                // Surface as a nom failure so the caller's error path
                // produces a ReadError; the odd count is checked again in
                // `read` for a clearer message.
                return Err(nom::Err::Failure(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Verify,
                )));
            }
            let pairs = items
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            return Ok((rest, RawNode::MapLit(pairs)));
        }
        let (rest, item) = parse_expr(input)?;
        items.push(item);
        let (rest, _) = ws_and_comments(rest)?;
        input = rest;
    }
}

fn parse_set(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = tag("#{")(input)?;
    let (mut input, _) = ws_and_comments(input)?;
    let mut items = Vec::new();
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>('}')(input) {
            return Ok((rest, RawNode::SetLit(items)));
        }
        let (rest, item) = parse_expr(input)?;
        items.push(item);
        let (rest, _) = ws_and_comments(rest)?;
        input = rest;
    }
}

fn parse_short_fn(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = tag("#(")(input)?;
    let (mut input, _) = ws_and_comments(input)?;
    let mut items = Vec::new();
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(')')(input) {
            return Ok((rest, RawNode::ShortFn(items)));
        }
        let (rest, item) = parse_expr(input)?;
        items.push(item);
        let (rest, _) = ws_and_comments(rest)?;
        input = rest;
    }
}

fn parse_list(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = char('(')(input)?;
    let (mut input, _) = ws_and_comments(input)?;
    let mut items = Vec::new();
    loop {
        if let Ok((rest, _)) = char::<_, nom::error::Error<_>>(')')(input) {
            return Ok((rest, RawNode::List(items)));
        }
        let (rest, item) = parse_expr(input)?;
        items.push(item);
        let (rest, _) = ws_and_comments(rest)?;
        input = rest;
    }
}

fn parse_literal_keyword(input: &str) -> IResult<&str, RawNode> {
    alt((
        value(RawNode::Literal(Value::Nil), tag("nil")),
        value(RawNode::Literal(Value::Bool(true)), tag("true")),
        value(RawNode::Literal(Value::Bool(false)), tag("false")),
    ))
    .parse(input)
}

/// A bare `name`-shaped token that isn't one of the reserved literal words
/// above; requires a lookahead so `niladic` doesn't get eaten by `nil`.
fn is_reserved_word_boundary(rest: &str) -> bool {
    !rest.chars().next().map(is_symbol_char).unwrap_or(false)
}

fn parse_expr(input: &str) -> IResult<&str, RawNode> {
    let (input, _) = ws_and_comments(input)?;

    if let Ok((rest, node)) = parse_literal_keyword(input) {
        if is_reserved_word_boundary(rest) {
            return Ok((rest, node));
        }
    }

    alt((
        parse_set,
        parse_short_fn,
        parse_var_ref,
        parse_vector,
        parse_map,
        parse_list,
        parse_special_float,
        map(parse_number, RawNode::Literal),
        parse_keyword,
        map(parse_string_literal, RawNode::Literal),
        map(parse_char_literal, RawNode::Literal),
        parse_symbol_or_turnhist,
    ))
    .parse(input)
}

// ============================================================================
// Pre-parse rejections
// ============================================================================

/// Masks string and comment contents with `#` so that reserved-syntax
/// detection never trips on text that merely mentions e.g. `'quote` inside
/// a string literal.
fn mask_strings_and_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push('#');
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push('#');
                    let _ = next;
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push('#');
            }
            ';' => {
                out.push('#');
                for nc in chars.by_ref() {
                    out.push('#');
                    if nc == '\n' {
                        break;
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn reject_unsupported_syntax(src: &str) -> Result<(), ReadError> {
    let masked = mask_strings_and_comments(src);
    let checks: &[(&str, &str)] = &[
        ("#\"", "regex literals (#\"...\") are not supported; use `str`/`replace` builtins instead"),
        ("#_", "reader discard (#_) is not supported"),
        ("@", "deref syntax (@name) is not supported"),
        ("'", "quote syntax ('x) is not supported"),
    ];
    for (needle, message) in checks {
        if let Some(byte_pos) = masked.find(needle) {
            let (line, col) = line_col_at(src, byte_pos);
            return Err(ReadError::new(message.to_string(), line, col));
        }
    }
    Ok(())
}

fn line_col_at(src: &str, byte_pos: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for c in src[..byte_pos.min(src.len())].chars() {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// On parse failure at offset 0 (i.e. no progress at all), scan for the
/// first unbalanced delimiter to give a more specific diagnostic than
/// nom's internal error would.
fn delimiter_balance_diagnostic(src: &str) -> Option<ReadError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let pairs = [('(', ')'), ('[', ']'), ('{', '}')];
    let mut in_string = false;
    let mut chars = src.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if in_string {
            if c == '\\' {
                chars.next();
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            continue;
        }
        if c == ';' {
            for (_, nc) in chars.by_ref() {
                if nc == '\n' {
                    break;
                }
            }
            continue;
        }
        if let Some((open, _)) = pairs.iter().find(|(open, _)| *open == c) {
            stack.push((*open, i));
        } else if let Some((open, close)) = pairs.iter().find(|(_, close)| *close == c) {
            match stack.pop() {
                Some((top, _)) if top == *open => {}
                Some((top, pos)) => {
                    let (line, col) = line_col_at(src, pos);
                    return Some(ReadError::new(
                        format!("unbalanced delimiter: '{top}' never closed before '{close}'"),
                        line,
                        col,
                    ));
                }
                None => {
                    let (line, col) = line_col_at(src, i);
                    return Some(ReadError::new(
                        format!("unexpected closing delimiter '{close}'"),
                        line,
                        col,
                    ));
                }
            }
        }
    }
    if let Some((open, pos)) = stack.pop() {
        let (line, col) = line_col_at(src, pos);
        return Some(ReadError::new(
            format!("unbalanced delimiter: '{open}' never closed"),
            line,
            col,
        ));
    }
    None
}

/// Entry point: parse a whole source string into one Raw AST node.
/// Multiple top-level forms wrap in `Program`; empty/comment-only input
/// yields `Literal(Nil)`.
pub fn read(src: &str) -> Result<RawNode, ReadError> {
    reject_unsupported_syntax(src)?;

    let mut forms = Vec::new();
    let mut rest = src;
    loop {
        let (after_ws, _) = ws_and_comments(rest).unwrap_or((rest, ()));
        if after_ws.trim().is_empty() {
            break;
        }
        match parse_expr(after_ws) {
            Ok((tail, node)) => {
                forms.push(node);
                rest = tail;
            }
            Err(_) => {
                if let Some(diag) = delimiter_balance_diagnostic(src) {
                    return Err(diag);
                }
                let (line, col) = line_col_at(src, src.len() - after_ws.len());
                return Err(ReadError::new("could not parse expression", line, col));
            }
        }
    }

    match forms.len() {
        0 => Ok(RawNode::Literal(Value::Nil)),
        1 => Ok(forms.into_iter().next().unwrap()),
        _ => Ok(RawNode::Program(forms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_nil() {
        assert_eq!(read("").unwrap(), RawNode::Literal(Value::Nil));
        assert_eq!(read("   ; just a comment\n").unwrap(), RawNode::Literal(Value::Nil));
    }

    #[test]
    fn integers_and_floats() {
        assert_eq!(read("42").unwrap(), RawNode::Literal(Value::Int(42)));
        assert_eq!(read("-7").unwrap(), RawNode::Literal(Value::Int(-7)));
        assert_eq!(read("3.14").unwrap(), RawNode::Literal(Value::Float(3.14)));
        assert_eq!(read("1e5").unwrap(), RawNode::Literal(Value::Float(1e5)));
        assert_eq!(read("2E-10").unwrap(), RawNode::Literal(Value::Float(2e-10)));
    }

    #[test]
    fn keywords_and_symbols() {
        assert_eq!(read(":foo").unwrap(), RawNode::Literal(Value::keyword("foo")));
        assert_eq!(read("foo-bar?").unwrap(), RawNode::Sym("foo-bar?".to_string()));
        assert_eq!(read("/").unwrap(), RawNode::Sym("/".to_string()));
    }

    #[test]
    fn namespaced_symbol() {
        assert_eq!(
            read("ctx/name").unwrap(),
            RawNode::NsSym {
                namespace: "ctx".to_string(),
                name: "name".to_string(),
            }
        );
    }

    #[test]
    fn turn_history() {
        assert_eq!(read("*1").unwrap(), RawNode::TurnHistory(1));
        assert_eq!(read("*2").unwrap(), RawNode::TurnHistory(2));
        assert_eq!(read("*3").unwrap(), RawNode::TurnHistory(3));
        // Not a turn-history ref: falls back to a plain symbol.
        assert_eq!(read("*").unwrap(), RawNode::Sym("*".to_string()));
    }

    #[test]
    fn vectors_maps_sets() {
        assert_eq!(
            read("[1 2 3]").unwrap(),
            RawNode::Vector(vec![
                RawNode::Literal(Value::Int(1)),
                RawNode::Literal(Value::Int(2)),
                RawNode::Literal(Value::Int(3)),
            ])
        );
        assert_eq!(
            read("{:a 1}").unwrap(),
            RawNode::MapLit(vec![(
                RawNode::Literal(Value::keyword("a")),
                RawNode::Literal(Value::Int(1))
            )])
        );
        assert!(read("{:a}").is_err());
        assert_eq!(
            read("#{1 2}").unwrap(),
            RawNode::SetLit(vec![
                RawNode::Literal(Value::Int(1)),
                RawNode::Literal(Value::Int(2)),
            ])
        );
    }

    #[test]
    fn short_fn() {
        match read("#(+ % 1)").unwrap() {
            RawNode::ShortFn(items) => assert_eq!(items.len(), 3),
            other => panic!("expected ShortFn, got {other:?}"),
        }
    }

    #[test]
    fn multiple_top_level_forms_wrap_in_program() {
        match read("1 2").unwrap() {
            RawNode::Program(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Program, got {other:?}"),
        }
    }

    #[test]
    fn rejects_quote_and_deref_and_discard_and_regex() {
        assert!(read("'x").is_err());
        assert!(read("@x").is_err());
        assert!(read("#_x y").is_err());
        assert!(read("#\"abc\"").is_err());
    }

    #[test]
    fn quote_inside_string_is_not_rejected() {
        assert_eq!(read("\"it's fine\"").unwrap(), RawNode::Literal(Value::string("it's fine")));
    }

    #[test]
    fn unbalanced_delimiter_reports_diagnostic() {
        assert!(read("(1 2").is_err());
        assert!(read(")").is_err());
    }
}
