//! Match flags, fixed at parse time (spec §3).

use bitflags::bitflags;

bitflags! {
    /// Flags that influence how the parser interprets a pattern.
    ///
    /// Once a [`crate::ast::Pattern`] is built, flags are baked into the AST
    /// (case folding in character classes, `dotall` on `.`, `multiline` on
    /// line anchors) and are not consulted again downstream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// `(?i)` — case-insensitive matching.
        const IGNORE_CASE = 1 << 0;
        /// `(?m)` — `^`/`$` match at line boundaries, not just text boundaries.
        const MULTILINE   = 1 << 1;
        /// `(?s)` — `.` matches line terminators too.
        const DOTALL      = 1 << 2;
        /// `(?u)` — Unicode-aware character classes and case folding. On by default.
        const UNICODE     = 1 << 3;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::UNICODE
    }
}

impl Flags {
    /// Render as the conventional single-letter flag string (`i`, `m`, `s`, `u`),
    /// in that fixed order. Used for `Diagnostics::flags` (spec §6).
    pub fn to_letters(self) -> String {
        let mut s = String::new();
        if self.contains(Flags::IGNORE_CASE) {
            s.push('i');
        }
        if self.contains(Flags::MULTILINE) {
            s.push('m');
        }
        if self.contains(Flags::DOTALL) {
            s.push('s');
        }
        if self.contains(Flags::UNICODE) {
            s.push('u');
        }
        s
    }
}

impl serde::Serialize for Flags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_letters())
    }
}

impl<'de> serde::Deserialize<'de> for Flags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut flags = Flags::empty();
        for c in s.chars() {
            flags |= match c {
                'i' => Flags::IGNORE_CASE,
                'm' => Flags::MULTILINE,
                's' => Flags::DOTALL,
                'u' => Flags::UNICODE,
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "unknown flag letter '{other}'"
                    )))
                }
            };
        }
        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unicode_on() {
        assert!(Flags::default().contains(Flags::UNICODE));
        assert_eq!(Flags::default().to_letters(), "u");
    }

    #[test]
    fn letters_roundtrip() {
        let flags = Flags::IGNORE_CASE | Flags::MULTILINE | Flags::UNICODE;
        let s = flags.to_letters();
        assert_eq!(s, "imu");
        let json = serde_json::to_string(&flags).unwrap();
        let back: Flags = serde_json::from_str(&json).unwrap();
        assert_eq!(flags, back);
    }
}
