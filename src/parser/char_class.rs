//! Parsing of bracket expressions, `[abc]`, `[^a-z]`, `[a-z\d]`, etc.

use crate::ast::{CharRange, ClassSet};
use crate::error::ParseError;

use super::{escape_class_atom, Cursor};

/// Parses a bracket expression starting just after the opening `[`.
/// `cursor.pos()` must point at the first character of the class body.
pub fn parse_bracket(cursor: &mut Cursor) -> Result<ClassSet, ParseError> {
    let start = cursor.pos();
    let negate = cursor.eat('^');
    let mut set = ClassSet::empty();
    let mut first = true;

    loop {
        match cursor.peek() {
            None => return Err(ParseError::new(start, "unterminated character class")),
            Some(']') if !first => {
                cursor.next();
                break;
            }
            _ => {}
        }
        first = false;

        let lo = parse_class_atom(cursor)?;
        match lo {
            ClassAtom::Set(s) => {
                set.union_in_place(&s);
                continue;
            }
            ClassAtom::Char(lo_ch) => {
                if cursor.peek() == Some('-') && cursor.peek_at(1) != Some(']') && cursor.peek_at(1).is_some()
                {
                    cursor.next(); // consume '-'
                    match parse_class_atom(cursor)? {
                        ClassAtom::Char(hi_ch) => {
                            if (hi_ch as u32) < (lo_ch as u32) {
                                return Err(ParseError::new(
                                    cursor.pos(),
                                    "character range out of order",
                                ));
                            }
                            set.push_range(CharRange::new(lo_ch as u32, hi_ch as u32));
                        }
                        ClassAtom::Set(_) => {
                            return Err(ParseError::new(
                                cursor.pos(),
                                "cannot use a class shorthand as a range endpoint",
                            ))
                        }
                    }
                } else {
                    set.push_range(CharRange::single(lo_ch as u32));
                }
            }
        }
    }

    Ok(if negate { set.negate() } else { set })
}

enum ClassAtom {
    Char(char),
    Set(ClassSet),
}

fn parse_class_atom(cursor: &mut Cursor) -> Result<ClassAtom, ParseError> {
    let pos = cursor.pos();
    let c = cursor.next().ok_or_else(|| ParseError::new(pos, "unterminated character class"))?;
    if c == '\\' {
        let esc_pos = cursor.pos();
        let e = cursor.next().ok_or_else(|| ParseError::new(esc_pos, "trailing backslash"))?;
        return match escape_class_atom(cursor, e, esc_pos)? {
            super::EscapeAtom::Char(c) => Ok(ClassAtom::Char(c)),
            super::EscapeAtom::Set(s) => Ok(ClassAtom::Set(s)),
        };
    }
    Ok(ClassAtom::Char(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::Cursor;

    fn parse(s: &str) -> ClassSet {
        let mut cursor = Cursor::new(s);
        parse_bracket(&mut cursor).unwrap()
    }

    #[test]
    fn simple_range() {
        let set = parse("a-z]");
        assert!(set.contains('m'));
        assert!(!set.contains('A'));
    }

    #[test]
    fn negated_class() {
        let set = parse("^a-z]");
        assert!(!set.contains('m'));
        assert!(set.contains('M'));
    }

    #[test]
    fn leading_bracket_literal() {
        // `]` immediately after `[` or `[^` is a literal, not the terminator.
        let set = parse("]a]");
        assert!(set.contains(']'));
        assert!(set.contains('a'));
    }

    #[test]
    fn shorthand_inside_class() {
        let set = parse(r"a\d]");
        assert!(set.contains('a'));
        assert!(set.contains('5'));
        assert!(!set.contains('x'));
    }
}
