//! Error types.
//!
//! Per the design note "exceptions vs. status": parse failures and internal
//! invariant violations are genuine errors. Budget exhaustion and unsupported
//! features on the automaton path are *not* errors — they are values that
//! flow through [`crate::diagnostics::Diagnostics`] as `Status::Unknown`.

use thiserror::Error;

/// A pattern failed to parse.
///
/// Carries the byte offset into the source pattern at which the problem was
/// detected, and a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at offset {position}")]
pub struct ParseError {
    /// Byte offset into the pattern source.
    pub position: usize,
    /// Human-readable description of the problem.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(position: usize, reason: impl Into<String>) -> Self {
        ParseError { position, reason: reason.into() }
    }
}

/// Internal invariant violations.
///
/// These never occur in normal operation; encountering one means the
/// analyzer itself has a bug. They propagate as `Status::Error`, not as a
/// `Result` from [`crate::check`] — see [`crate::diagnostics::Diagnostics`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Why the automaton path was abandoned in favor of the fuzz path.
///
/// Not an error: the feasibility gate (see [`crate::gate`]) treats this as a
/// routing decision, logged at `debug` level, never surfaced to the caller
/// except via `Diagnostics::checker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasibility {
    Backreference,
    LookAround,
    PatternTooLarge,
    NfaTooLarge,
    /// `Config::checker` was set to `CheckerMode::Fuzz`, forcing the fuzz
    /// path regardless of whether the automaton path would have been
    /// feasible (spec §4.7 gate rule 2).
    Forced,
}

impl std::fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Infeasibility::Backreference => "pattern contains a backreference",
            Infeasibility::LookAround => "pattern contains look-around",
            Infeasibility::PatternTooLarge => "pattern exceeds max_pattern_size",
            Infeasibility::NfaTooLarge => "projected NFA exceeds max_nfa_size",
            Infeasibility::Forced => "checker forced to the fuzz path by config",
        };
        f.write_str(s)
    }
}

/// Which configured budget tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Timeout,
    RecallTimeout,
    MaxIterations,
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Budget::Timeout => "timeout",
            Budget::RecallTimeout => "recall_timeout",
            Budget::MaxIterations => "max_iterations",
        };
        f.write_str(s)
    }
}
