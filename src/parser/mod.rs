//! Hand-rolled recursive-descent parser.
//!
//! Deliberately does not depend on `regex-syntax`: the grammar accepted here
//! is a practical subset (spec §4.1 "Required syntactic surface") rather
//! than the full PCRE/Oniguruma grammar, and keeping it in-house means every
//! AST node the rest of the crate sees is exactly the shape [`crate::ast`]
//! defines.

mod char_class;
mod unicode_class;

use std::collections::HashMap;

use crate::ast::{AnchorKind, BackrefTarget, ClassSet, LookDirection, Node, Pattern};
use crate::error::ParseError;
use crate::flags::Flags;

/// A `(byte offset, char)` walker over the pattern source.
pub(crate) struct Cursor<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    idx: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let chars: Vec<(usize, char)> = source.char_indices().collect();
        Cursor { source, chars, idx: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.chars.get(self.idx).map(|&(p, _)| p).unwrap_or(self.source.len())
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|&(_, c)| c)
    }

    pub(crate) fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.idx + n).map(|&(_, c)| c)
    }

    pub(crate) fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.idx += 1;
        }
        c
    }

    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn starts_with(&self, s: &str) -> bool {
        self.source[self.pos()..].starts_with(s)
    }

    /// Consumes `s` if the remaining input starts with it exactly.
    pub(crate) fn eat_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            for _ in 0..s.chars().count() {
                self.next();
            }
            true
        } else {
            false
        }
    }

    pub(crate) fn eof(&self) -> bool {
        self.idx >= self.chars.len()
    }
}

pub(crate) enum EscapeAtom {
    Char(char),
    Set(ClassSet),
}

/// Resolves a single escape sequence (the character right after `\`) to
/// either a literal character or a shorthand class, for use both inside and
/// outside bracket expressions.
pub(crate) fn escape_class_atom(
    cursor: &mut Cursor,
    e: char,
    esc_pos: usize,
) -> Result<EscapeAtom, ParseError> {
    use EscapeAtom::*;
    Ok(match e {
        'd' => Set(unicode_class::digit()),
        'D' => Set(unicode_class::digit().negate()),
        'w' => Set(unicode_class::word()),
        'W' => Set(unicode_class::word().negate()),
        's' => Set(unicode_class::space()),
        'S' => Set(unicode_class::space().negate()),
        'n' => Char('\n'),
        't' => Char('\t'),
        'r' => Char('\r'),
        'f' => Char('\u{0C}'),
        'v' => Char('\u{0B}'),
        '0' => Char('\0'),
        'x' => Char(parse_hex_escape(cursor, esc_pos, 2)?),
        'u' => Char(parse_unicode_escape(cursor, esc_pos)?),
        'p' | 'P' => {
            let negate = e == 'P';
            let name = parse_brace_name(cursor, esc_pos)?;
            let set = unicode_class::property(&name, esc_pos)?;
            Set(if negate { set.negate() } else { set })
        }
        other if other.is_ascii_punctuation() => Char(other),
        other => Char(other),
    })
}

fn parse_hex_escape(cursor: &mut Cursor, at: usize, digits: usize) -> Result<char, ParseError> {
    let mut value = 0u32;
    for _ in 0..digits {
        let c = cursor.next().ok_or_else(|| ParseError::new(at, "truncated \\x escape"))?;
        let d = c.to_digit(16).ok_or_else(|| ParseError::new(at, "invalid hex digit in \\x escape"))?;
        value = value * 16 + d;
    }
    char::from_u32(value).ok_or_else(|| ParseError::new(at, "\\x escape is not a valid character"))
}

fn parse_unicode_escape(cursor: &mut Cursor, at: usize) -> Result<char, ParseError> {
    if cursor.eat('{') {
        let mut value = 0u32;
        let mut any = false;
        loop {
            match cursor.next() {
                Some('}') => break,
                Some(c) => {
                    let d = c
                        .to_digit(16)
                        .ok_or_else(|| ParseError::new(at, "invalid hex digit in \\u{...} escape"))?;
                    value = value * 16 + d;
                    any = true;
                }
                None => return Err(ParseError::new(at, "unterminated \\u{...} escape")),
            }
        }
        if !any {
            return Err(ParseError::new(at, "empty \\u{...} escape"));
        }
        char::from_u32(value).ok_or_else(|| ParseError::new(at, "\\u escape is not a valid character"))
    } else {
        parse_hex_escape(cursor, at, 4)
    }
}

fn parse_brace_name(cursor: &mut Cursor, at: usize) -> Result<String, ParseError> {
    if !cursor.eat('{') {
        // Single-letter shorthand, e.g. `\pL`.
        let c = cursor.next().ok_or_else(|| ParseError::new(at, "truncated \\p escape"))?;
        return Ok(c.to_string());
    }
    let mut name = String::new();
    loop {
        match cursor.next() {
            Some('}') => break,
            Some(c) => name.push(c),
            None => return Err(ParseError::new(at, "unterminated \\p{...} escape")),
        }
    }
    Ok(name)
}

struct ParserState<'a> {
    cursor: Cursor<'a>,
    flags: Flags,
    group_count: u32,
    group_names: HashMap<String, u32>,
}

/// Parses `source` under `flags` into a [`Pattern`].
pub fn parse(source: &str, flags: Flags) -> Result<Pattern, ParseError> {
    let mut state = ParserState {
        cursor: Cursor::new(source),
        flags,
        group_count: 0,
        group_names: HashMap::new(),
    };
    let root = parse_alt(&mut state)?;
    if !state.cursor.eof() {
        return Err(ParseError::new(state.cursor.pos(), "unexpected ')' with no matching '('"));
    }
    Ok(Pattern {
        source: source.to_string(),
        flags,
        root,
        group_count: state.group_count,
        group_names: state.group_names,
    })
}

fn parse_alt(state: &mut ParserState) -> Result<Node, ParseError> {
    let mut branches = vec![parse_concat(state)?];
    while state.cursor.eat('|') {
        branches.push(parse_concat(state)?);
    }
    Ok(if branches.len() == 1 { branches.pop().unwrap() } else { Node::Alt(branches) })
}

fn parse_concat(state: &mut ParserState) -> Result<Node, ParseError> {
    let mut nodes = Vec::new();
    while let Some(c) = state.cursor.peek() {
        if c == '|' || c == ')' {
            break;
        }
        nodes.push(parse_repeat(state)?);
    }
    Ok(match nodes.len() {
        0 => Node::Empty,
        1 => nodes.pop().unwrap(),
        _ => Node::Concat(nodes),
    })
}

fn parse_repeat(state: &mut ParserState) -> Result<Node, ParseError> {
    let start = state.cursor.pos();
    let atom = parse_atom(state)?;
    let (min, max) = match state.cursor.peek() {
        Some('*') => {
            state.cursor.next();
            (0, None)
        }
        Some('+') => {
            state.cursor.next();
            (1, None)
        }
        Some('?') => {
            state.cursor.next();
            (0, Some(1))
        }
        Some('{') => {
            if let Some((min, max)) = try_parse_bounded(&mut state.cursor) {
                (min, max)
            } else {
                return Ok(atom);
            }
        }
        _ => return Ok(atom),
    };
    if let (Some(max), true) = (max, min > max.unwrap_or(u32::MAX)) {
        return Err(ParseError::new(start, "repetition min exceeds max"));
    }
    let greedy = !state.cursor.eat('?');
    let end = state.cursor.pos();
    Ok(Node::Repeat { node: Box::new(atom), min, max, greedy, span: start..end })
}

/// Attempts `{n}`, `{n,}`, `{n,m}` starting at `{`. Returns `None` (and
/// leaves the cursor where it found `{`, i.e. unconsumed) if what follows
/// isn't a valid bound, so `{` can fall back to being a literal.
fn try_parse_bounded(cursor: &mut Cursor) -> Option<(u32, Option<u32>)> {
    let save = cursor.idx;
    cursor.next(); // '{'
    let min = parse_digits(cursor);
    let result = match (min, cursor.peek()) {
        (Some(min), Some('}')) => {
            cursor.next();
            Some((min, Some(min)))
        }
        (Some(min), Some(',')) => {
            cursor.next();
            let max = parse_digits(cursor);
            if cursor.peek() == Some('}') {
                cursor.next();
                Some((min, max))
            } else {
                None
            }
        }
        _ => None,
    };
    if result.is_none() {
        cursor.idx = save;
    }
    result
}

fn parse_digits(cursor: &mut Cursor) -> Option<u32> {
    let mut value: Option<u32> = None;
    while let Some(c) = cursor.peek() {
        if let Some(d) = c.to_digit(10) {
            value = Some(value.unwrap_or(0) * 10 + d);
            cursor.next();
        } else {
            break;
        }
    }
    value
}

fn parse_atom(state: &mut ParserState) -> Result<Node, ParseError> {
    let start = state.cursor.pos();
    let c = state
        .cursor
        .next()
        .ok_or_else(|| ParseError::new(start, "unexpected end of pattern"))?;
    match c {
        '(' => parse_group(state, start),
        '[' => {
            let set = char_class::parse_bracket(&mut state.cursor)?;
            let set = apply_case_folding(set, state.flags);
            Ok(Node::Class { set, span: start..state.cursor.pos() })
        }
        '.' => Ok(Node::Dot { dotall: state.flags.contains(Flags::DOTALL), span: start..state.cursor.pos() }),
        '^' => Ok(Node::Anchor {
            kind: if state.flags.contains(Flags::MULTILINE) { AnchorKind::LineStart } else { AnchorKind::TextStart },
            span: start..state.cursor.pos(),
        }),
        '$' => Ok(Node::Anchor {
            kind: if state.flags.contains(Flags::MULTILINE) { AnchorKind::LineEnd } else { AnchorKind::TextEnd },
            span: start..state.cursor.pos(),
        }),
        '\\' => parse_escape_atom(state, start),
        ')' => Err(ParseError::new(start, "unmatched ')'")),
        '*' | '+' | '?' => Err(ParseError::new(start, "quantifier with nothing to repeat")),
        other => {
            let ch = apply_char_case_folding(other, state.flags);
            Ok(Node::Literal { ch, span: start..state.cursor.pos() })
        }
    }
}

fn parse_escape_atom(state: &mut ParserState, start: usize) -> Result<Node, ParseError> {
    let esc_pos = state.cursor.pos();
    let e = state.cursor.next().ok_or_else(|| ParseError::new(esc_pos, "trailing backslash"))?;
    match e {
        'b' => Ok(Node::Anchor { kind: AnchorKind::WordBoundary, span: start..state.cursor.pos() }),
        'B' => Ok(Node::Anchor { kind: AnchorKind::NonWordBoundary, span: start..state.cursor.pos() }),
        'A' => Ok(Node::Anchor { kind: AnchorKind::TextStart, span: start..state.cursor.pos() }),
        'Z' => Ok(Node::Anchor { kind: AnchorKind::TextEnd, span: start..state.cursor.pos() }),
        'g' => parse_named_backref(state, start),
        '1'..='9' => {
            let mut value = e.to_digit(10).unwrap();
            while let Some(d) = state.cursor.peek().and_then(|c| c.to_digit(10)) {
                value = value * 10 + d;
                state.cursor.next();
            }
            if value > state.group_count {
                return Err(ParseError::new(start, "backreference to non-existent group"));
            }
            Ok(Node::Backref { target: BackrefTarget::Index(value), span: start..state.cursor.pos() })
        }
        _ => match escape_class_atom(&mut state.cursor, e, esc_pos)? {
            EscapeAtom::Char(ch) => {
                let ch = apply_char_case_folding(ch, state.flags);
                Ok(Node::Literal { ch, span: start..state.cursor.pos() })
            }
            EscapeAtom::Set(set) => {
                let set = apply_case_folding(set, state.flags);
                Ok(Node::Class { set, span: start..state.cursor.pos() })
            }
        },
    }
}

fn parse_named_backref(state: &mut ParserState, start: usize) -> Result<Node, ParseError> {
    if !state.cursor.eat('<') {
        return Err(ParseError::new(start, "expected '<' after \\g"));
    }
    let mut name = String::new();
    loop {
        match state.cursor.next() {
            Some('>') => break,
            Some(c) => name.push(c),
            None => return Err(ParseError::new(start, "unterminated \\g<...> backreference")),
        }
    }
    if !state.group_names.contains_key(&name) {
        return Err(ParseError::new(start, format!("backreference to undefined group '{name}'")));
    }
    Ok(Node::Backref { target: BackrefTarget::Name(name), span: start..state.cursor.pos() })
}

fn parse_group(state: &mut ParserState, start: usize) -> Result<Node, ParseError> {
    if state.cursor.eat('?') {
        if state.cursor.eat(':') {
            let inner = parse_alt(state)?;
            expect_close_paren(state, start)?;
            return Ok(Node::Group { node: Box::new(inner), capture: None, name: None, span: start..state.cursor.pos() });
        }
        if state.cursor.eat('=') {
            let inner = parse_alt(state)?;
            expect_close_paren(state, start)?;
            return Ok(Node::Lookaround {
                direction: LookDirection::Ahead,
                negative: false,
                node: Box::new(inner),
                span: start..state.cursor.pos(),
            });
        }
        if state.cursor.eat('!') {
            let inner = parse_alt(state)?;
            expect_close_paren(state, start)?;
            return Ok(Node::Lookaround {
                direction: LookDirection::Ahead,
                negative: true,
                node: Box::new(inner),
                span: start..state.cursor.pos(),
            });
        }
        if state.cursor.starts_with("<=") {
            state.cursor.eat_str("<=");
            let inner = parse_alt(state)?;
            expect_close_paren(state, start)?;
            return Ok(Node::Lookaround {
                direction: LookDirection::Behind,
                negative: false,
                node: Box::new(inner),
                span: start..state.cursor.pos(),
            });
        }
        if state.cursor.starts_with("<!") {
            state.cursor.eat_str("<!");
            let inner = parse_alt(state)?;
            expect_close_paren(state, start)?;
            return Ok(Node::Lookaround {
                direction: LookDirection::Behind,
                negative: true,
                node: Box::new(inner),
                span: start..state.cursor.pos(),
            });
        }
        if state.cursor.eat_str("P<") || state.cursor.eat('<') {
            let mut name = String::new();
            loop {
                match state.cursor.next() {
                    Some('>') => break,
                    Some(c) => name.push(c),
                    None => return Err(ParseError::new(start, "unterminated named group")),
                }
            }
            state.group_count += 1;
            let idx = state.group_count;
            state.group_names.insert(name.clone(), idx);
            let inner = parse_alt(state)?;
            expect_close_paren(state, start)?;
            return Ok(Node::Group {
                node: Box::new(inner),
                capture: Some(idx),
                name: Some(name),
                span: start..state.cursor.pos(),
            });
        }
        return Err(ParseError::new(start, "unsupported group syntax after '(?'"));
    }

    state.group_count += 1;
    let idx = state.group_count;
    let inner = parse_alt(state)?;
    expect_close_paren(state, start)?;
    Ok(Node::Group { node: Box::new(inner), capture: Some(idx), name: None, span: start..state.cursor.pos() })
}

fn expect_close_paren(state: &mut ParserState, open_at: usize) -> Result<(), ParseError> {
    if state.cursor.eat(')') {
        Ok(())
    } else {
        Err(ParseError::new(open_at, "unterminated group"))
    }
}

fn apply_char_case_folding(c: char, flags: Flags) -> char {
    if flags.contains(Flags::IGNORE_CASE) {
        c.to_lowercase().next().unwrap_or(c)
    } else {
        c
    }
}

fn apply_case_folding(set: ClassSet, flags: Flags) -> ClassSet {
    if !flags.contains(Flags::IGNORE_CASE) {
        return set;
    }
    let mut folded = set.clone();
    for range in set.ranges() {
        for cp in range.lo..=range.hi {
            if let Some(c) = char::from_u32(cp) {
                for alt in c.to_uppercase().chain(c.to_lowercase()) {
                    folded.push_range(crate::ast::CharRange::single(alt as u32));
                }
            }
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_literal_concat() {
        let p = parse("abc", Flags::default()).unwrap();
        assert!(matches!(p.root, Node::Concat(_)));
    }

    #[test]
    fn parses_alternation() {
        let p = parse("a|b", Flags::default()).unwrap();
        assert!(matches!(p.root, Node::Alt(_)));
    }

    #[test]
    fn parses_star_and_plus() {
        let p = parse("a*b+", Flags::default()).unwrap();
        if let Node::Concat(nodes) = p.root {
            assert!(matches!(nodes[0], Node::Repeat { min: 0, max: None, .. }));
            assert!(matches!(nodes[1], Node::Repeat { min: 1, max: None, .. }));
        } else {
            panic!("expected concat");
        }
    }

    #[test]
    fn parses_bounded_repeat() {
        let p = parse("a{2,4}", Flags::default()).unwrap();
        assert!(matches!(p.root, Node::Repeat { min: 2, max: Some(4), .. }));
    }

    #[test]
    fn lazy_quantifier_suffix() {
        let p = parse("a*?", Flags::default()).unwrap();
        assert!(matches!(p.root, Node::Repeat { greedy: false, .. }));
    }

    #[test]
    fn nested_groups_and_backreference() {
        let p = parse(r"(a)\1", Flags::default()).unwrap();
        assert_eq!(p.group_count, 1);
        assert!(p.root.contains_backref());
    }

    #[test]
    fn named_group_and_named_backreference() {
        let p = parse(r"(?P<x>a)\g<x>", Flags::default()).unwrap();
        assert_eq!(p.group_names.get("x"), Some(&1));
        assert!(p.root.contains_backref());
    }

    #[test]
    fn lookaround_variants_parse() {
        for src in ["(?=a)", "(?!a)", "(?<=a)", "(?<!a)"] {
            let p = parse(src, Flags::default()).unwrap();
            assert!(p.root.contains_lookaround(), "failed for {src}");
        }
    }

    #[test]
    fn unmatched_paren_is_error() {
        assert!(parse("(a", Flags::default()).is_err());
        assert!(parse("a)", Flags::default()).is_err());
    }

    #[test]
    fn backreference_to_undefined_group_is_error() {
        assert!(parse(r"\1", Flags::default()).is_err());
    }

    #[test]
    fn anchors_respect_multiline_flag() {
        let p = parse("^a$", Flags::default()).unwrap();
        if let Node::Concat(nodes) = p.root {
            assert!(matches!(nodes[0], Node::Anchor { kind: AnchorKind::TextStart, .. }));
            assert!(matches!(nodes[2], Node::Anchor { kind: AnchorKind::TextEnd, .. }));
        } else {
            panic!("expected concat");
        }

        let p = parse("^a$", Flags::MULTILINE).unwrap();
        if let Node::Concat(nodes) = p.root {
            assert!(matches!(nodes[0], Node::Anchor { kind: AnchorKind::LineStart, .. }));
            assert!(matches!(nodes[2], Node::Anchor { kind: AnchorKind::LineEnd, .. }));
        } else {
            panic!("expected concat");
        }
    }
}
