//! Minimal, hand-rolled classifier for `\p{...}` Unicode property classes
//! and the ASCII shorthand classes (`\d`, `\w`, `\s`).
//!
//! This intentionally covers only the handful of property names that show
//! up in real-world patterns (`L`, `N`, `Alphabetic`, `White_Space`, ...),
//! built purely from `char::is_*` queries rather than a full UCD table. A
//! pattern using an unrecognized property name is a parse error, not a
//! silent "matches nothing."

use crate::ast::ClassSet;
use crate::error::ParseError;

/// `\d` — ASCII/Unicode decimal digit.
pub fn digit() -> ClassSet {
    build(char::is_numeric)
}

/// `\s` — whitespace.
pub fn space() -> ClassSet {
    build(char::is_whitespace)
}

/// `\w` — "word" character: alphanumeric or underscore.
pub fn word() -> ClassSet {
    let mut set = build(char::is_alphanumeric);
    set.push_range(crate::ast::CharRange::single('_' as u32));
    set
}

/// Resolve a `\p{Name}` or `\pX` property name to a [`ClassSet`].
pub fn property(name: &str, at: usize) -> Result<ClassSet, ParseError> {
    let set = match name {
        "L" | "Letter" | "Alphabetic" => build(char::is_alphabetic),
        "N" | "Number" | "Nd" | "Decimal_Number" => build(char::is_numeric),
        "Lu" | "Uppercase" | "Uppercase_Letter" => build(char::is_uppercase),
        "Ll" | "Lowercase" | "Lowercase_Letter" => build(char::is_lowercase),
        "White_Space" | "space" | "Space" => build(char::is_whitespace),
        "Alnum" | "Alphanumeric" => build(char::is_alphanumeric),
        "Cc" | "Control" => build(char::is_control),
        "ASCII" => build(|c| c.is_ascii()),
        other => {
            return Err(ParseError::new(at, format!("unknown Unicode property '{other}'")))
        }
    };
    Ok(set)
}

/// Build a [`ClassSet`] by scanning the full scalar-value range and testing
/// `pred`. Only run at parse time, on property classes, which are rare
/// compared to literal characters — the resulting set is then cached as
/// part of the AST, so the cost is paid once per distinct `\p{...}` use.
fn build(pred: impl Fn(char) -> bool) -> ClassSet {
    let mut set = ClassSet::empty();
    let mut run_start: Option<u32> = None;
    for cp in 0u32..=0x10FFFF {
        if (0xD800..=0xDFFF).contains(&cp) {
            if let Some(start) = run_start.take() {
                set.push_range(crate::ast::CharRange::new(start, cp - 1));
            }
            continue;
        }
        let Some(c) = char::from_u32(cp) else { continue };
        if pred(c) {
            if run_start.is_none() {
                run_start = Some(cp);
            }
        } else if let Some(start) = run_start.take() {
            set.push_range(crate::ast::CharRange::new(start, cp - 1));
        }
    }
    if let Some(start) = run_start {
        set.push_range(crate::ast::CharRange::new(start, 0x10FFFF));
    }
    set
}
