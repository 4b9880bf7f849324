//! The structured result of [`crate::checker::check`] (spec §6).

use serde::{Deserialize, Serialize};

use crate::complexity::Complexity;
use crate::error::InternalError;
use crate::flags::Flags;
use crate::witness::AttackPattern;

/// Which internal path produced a verdict, surfaced for observability
/// rather than for callers to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checker {
    Automaton,
    Fuzz,
}

/// The verdict itself, carrying no data of its own — the associated
/// detail (witness, message, or error text) lives alongside it on
/// [`Diagnostics`], matching the flat `status` field of the export
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No super-linear behavior found.
    Safe,
    /// Confirmed vulnerable, at the attached [`Complexity`].
    Vulnerable,
    /// The gate routed to the fuzz path and no witness was found within
    /// budget, recall validation could not confirm an automaton-derived
    /// witness, or a configured budget was exhausted. Never silently
    /// reported as `Safe` (spec design note: "the implementer must not
    /// silently return SAFE"). Detail lives in `Diagnostics::message`.
    Unknown,
    /// Parse failure or internal invariant violation. Detail lives in
    /// `Diagnostics::error`.
    Error,
}

/// A rendered attack witness, nested under `Diagnostics::attack` (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    pub prefix: String,
    pub pump: String,
    pub suffix: String,
    pub base: u32,
    pub repeat: u32,
    /// `prefix + pump.repeat(repeat) + suffix`, rendered once so callers
    /// don't have to reimplement the repeat arithmetic.
    pub string: String,
}

impl From<&AttackPattern> for AttackReport {
    fn from(attack: &AttackPattern) -> Self {
        AttackReport {
            prefix: attack.prefix.clone(),
            pump: attack.pump.clone(),
            suffix: attack.suffix.clone(),
            base: attack.base,
            repeat: attack.repeat,
            string: attack.render_default(),
        }
    }
}

/// The sub-expression responsible for an ambiguity, nested under
/// `Diagnostics::hotspot` (spec §3, §4.6, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotspot {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Full result of analyzing one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub source: String,
    pub flags: Flags,
    pub status: Status,
    pub complexity: Option<Complexity>,
    pub attack: Option<AttackReport>,
    pub hotspot: Option<Hotspot>,
    pub checker: Option<Checker>,
    pub message: Option<String>,
    pub error: Option<String>,
    /// `(pump_length, step_count)` samples observed during recall
    /// validation. Additive beyond the literal export contract in §6, kept
    /// for callers that want the raw growth curve behind a `Vulnerable`
    /// verdict.
    pub recall_steps: Vec<(u32, u64)>,
}

impl Diagnostics {
    pub fn is_vulnerable(&self) -> bool {
        matches!(self.status, Status::Vulnerable)
    }

    pub fn is_safe(&self) -> bool {
        matches!(self.status, Status::Safe)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, Status::Error)
    }

    fn empty(pattern: &str, flags: Flags, status: Status) -> Self {
        Diagnostics {
            source: pattern.to_string(),
            flags,
            status,
            complexity: None,
            attack: None,
            hotspot: None,
            checker: None,
            message: None,
            error: None,
            recall_steps: Vec::new(),
        }
    }

    pub(crate) fn safe(pattern: &str, flags: Flags) -> Self {
        Diagnostics { complexity: Some(Complexity::Safe), ..Diagnostics::empty(pattern, flags, Status::Safe) }
    }

    /// A pattern that failed to parse (spec §7 "Parse error").
    pub(crate) fn parse_error(pattern: &str, flags: Flags, reason: String) -> Self {
        Diagnostics { error: Some(reason), ..Diagnostics::empty(pattern, flags, Status::Error) }
    }

    /// An internal invariant violation (spec §7 "Internal invariant
    /// violation") — this crate's own bug, not the caller's input.
    pub(crate) fn internal_error(pattern: &str, flags: Flags, err: InternalError) -> Self {
        Diagnostics { error: Some(err.to_string()), ..Diagnostics::empty(pattern, flags, Status::Error) }
    }

    pub(crate) fn unknown(pattern: &str, flags: Flags, checker: Option<Checker>, reason: String) -> Self {
        Diagnostics { checker, message: Some(reason), ..Diagnostics::empty(pattern, flags, Status::Unknown) }
    }

    pub(crate) fn vulnerable(
        pattern: &str,
        flags: Flags,
        checker: Checker,
        complexity: Complexity,
        attack: &AttackPattern,
        hotspot: Option<Hotspot>,
        recall_steps: Vec<(u32, u64)>,
    ) -> Self {
        Diagnostics {
            complexity: Some(complexity),
            attack: Some(attack.into()),
            hotspot,
            checker: Some(checker),
            recall_steps,
            ..Diagnostics::empty(pattern, flags, Status::Vulnerable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_attack() -> AttackPattern {
        AttackPattern { prefix: "".into(), pump: "a".into(), suffix: "!".into(), base: 0, repeat: 4 }
    }

    #[test]
    fn safe_diagnostics_round_trips_through_json() {
        let diag = Diagnostics::safe("abc", Flags::default());
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(diag, back);
    }

    #[test]
    fn json_shape_matches_export_contract() {
        let diag = Diagnostics::vulnerable(
            "(a+)+",
            Flags::default(),
            Checker::Automaton,
            Complexity::Exponential,
            &sample_attack(),
            Some(Hotspot { start: 0, end: 5, text: "(a+)+".into() }),
            vec![(8, 100), (16, 10000)],
        );
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["status"], "vulnerable");
        assert_eq!(json["source"], "(a+)+");
        assert_eq!(json["attack"]["pump"], "a");
        assert_eq!(json["attack"]["string"], "aaaa!");
        assert_eq!(json["hotspot"]["start"], 0);
        assert_eq!(json["complexity"]["type"], "exponential");
        assert!(json["error"].is_null());
    }

    #[test]
    fn vulnerable_diagnostics_carries_witness_fields() {
        let diag = Diagnostics::vulnerable(
            "(a+)+",
            Flags::default(),
            Checker::Automaton,
            Complexity::Exponential,
            &sample_attack(),
            None,
            vec![(8, 100), (16, 10000)],
        );
        assert!(diag.is_vulnerable());
        assert_eq!(diag.attack.as_ref().unwrap().pump, "a");
    }

    #[test]
    fn parse_error_reports_error_status() {
        let diag = Diagnostics::parse_error("(unclosed", Flags::default(), "unbalanced group at offset 9".into());
        assert!(diag.is_error());
        assert_eq!(diag.error.as_deref(), Some("unbalanced group at offset 9"));
        assert!(diag.message.is_none());
    }

    #[test]
    fn unknown_diagnostics_carries_message_not_error() {
        let diag = Diagnostics::unknown("a+", Flags::default(), Some(Checker::Fuzz), "timeout".into());
        assert_eq!(diag.status, Status::Unknown);
        assert_eq!(diag.message.as_deref(), Some("timeout"));
        assert!(diag.error.is_none());
    }
}
