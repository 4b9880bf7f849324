//! The driver that wires every stage together (spec §5 end-to-end flow).

use log::debug;

use crate::complexity::Complexity;
use crate::config::Config;
use crate::continuation;
use crate::diagnostics::{Checker, Diagnostics, Hotspot};
use crate::error::InternalError;
use crate::flags::Flags;
use crate::gate::{self, Route};
use crate::nfa;
use crate::parser;
use crate::recall;
use crate::scc;
use crate::witness;

/// Analyzes `pattern` under `flags` and returns a full diagnostic report.
///
/// Never panics on malformed input; a parse failure is reported as
/// [`crate::diagnostics::Status::Error`] rather than propagated as a
/// `Result`, so every call site gets one uniform return shape.
pub fn check(pattern: &str, flags: Flags, config: Config) -> Diagnostics {
    let parsed = match parser::parse(pattern, flags) {
        Ok(p) => p,
        Err(e) => return Diagnostics::parse_error(pattern, flags, e.to_string()),
    };

    match gate::route(&parsed, &config) {
        Route::Automaton => check_automaton(pattern, flags, &parsed, &config),
        Route::Fuzz(reason) => {
            debug!("pattern {:?} routed to fuzz path: {}", pattern, reason);
            check_fuzz(pattern, flags, &parsed, &config)
        }
        Route::Unsupported(reason) => Diagnostics::unknown(
            pattern,
            flags,
            None,
            format!("checker forced to the automaton path, but the pattern is not automaton-feasible: {reason}"),
        ),
    }
}

fn check_automaton(pattern: &str, flags: Flags, parsed: &crate::ast::Pattern, config: &Config) -> Diagnostics {
    // Infeasibility should have been caught by the gate already; an `Err`
    // here means the AST changed shape between the two calls, which cannot
    // happen since both read the same immutable `parsed`. Reported as a
    // graceful `Error` diagnostic rather than a panic, per the "never a
    // crash" invariant.
    let enfa = match nfa::build(&parsed.root) {
        Ok(enfa) => enfa,
        Err(infeasible) => {
            let err = InternalError::Invariant(format!(
                "gate routed to the automaton path but nfa::build failed: {infeasible}"
            ));
            return Diagnostics::internal_error(pattern, flags, err);
        }
    };
    let ordered = nfa::ordered::build(&enfa);
    let la = nfa::look_ahead::build(&ordered);

    let Some(ambiguity) = scc::analyze(&la) else {
        return Diagnostics::safe(pattern, flags);
    };

    // An automaton can be ambiguous in isolation yet never actually blow up:
    // if the whole pattern can always match trivially (nullable) and nothing
    // forces it past that immediate success, a backtracking engine never
    // explores the ambiguous region deeply enough to matter. Only a right
    // anchor, or a continuation that cannot itself match empty, forces the
    // engine to keep searching on failure and pay for the ambiguity.
    let continuation_info = continuation::analyze(&parsed.root);
    if !continuation::is_exploitable(&continuation_info, config.match_mode) {
        debug!("pattern {:?} ambiguity is unreachable under match_mode={:?}", pattern, config.match_mode);
        return Diagnostics::safe(pattern, flags);
    }

    let attack = witness::build(&ambiguity, &la, &parsed.root, config);
    let hotspot = witness::hotspot(&la, &ambiguity.scc_states).map(|span| Hotspot {
        start: span.start,
        end: span.end,
        text: parsed.source.get(span.clone()).unwrap_or_default().to_string(),
    });

    if config.skip_recall {
        return Diagnostics::vulnerable(
            pattern,
            flags,
            Checker::Automaton,
            ambiguity.complexity,
            &attack,
            hotspot,
            Vec::new(),
        );
    }

    match recall::validate(parsed, &attack, config) {
        Some(complexity) => {
            let samples = recall::measure(parsed, &attack, config);
            Diagnostics::vulnerable(pattern, flags, Checker::Automaton, complexity, &attack, hotspot, samples)
        }
        None => Diagnostics::unknown(
            pattern,
            flags,
            Some(Checker::Automaton),
            format!(
                "automaton analysis found {} ambiguity but recall validation could not confirm it empirically",
                ambiguity.complexity
            ),
        ),
    }
}

fn check_fuzz(pattern: &str, flags: Flags, parsed: &crate::ast::Pattern, config: &Config) -> Diagnostics {
    let result = crate::fuzz::run(parsed, config);
    match result.witness {
        Some((attack, complexity)) => {
            let samples = recall::measure(parsed, &attack, config);
            Diagnostics::vulnerable(pattern, flags, Checker::Fuzz, complexity, &attack, None, samples)
        }
        None => Diagnostics::unknown(
            pattern,
            flags,
            Some(Checker::Fuzz),
            format!("fuzzing found no super-linear witness in {} iterations", result.iterations),
        ),
    }
}

/// Convenience wrapper: `true` iff [`check`] reports `Status::Safe`.
pub fn is_safe(pattern: &str, flags: Flags, config: Config) -> bool {
    check(pattern, flags, config).is_safe()
}

/// Convenience wrapper: `true` iff [`check`] reports `Status::Vulnerable`.
pub fn is_vulnerable(pattern: &str, flags: Flags, config: Config) -> bool {
    check(pattern, flags, config).is_vulnerable()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Diagnostics {
        check(src, Flags::default(), Config::default())
    }

    #[test]
    fn plain_literal_is_safe() {
        assert!(run("abc").is_safe());
    }

    #[test]
    fn single_star_is_safe() {
        assert!(run("a*b").is_safe());
    }

    #[test]
    fn star_of_star_is_safe_without_anchor() {
        // (a*)* alone has no forcing continuation: the whole pattern can
        // always match empty, so a backtracking engine never has to explore
        // the ambiguous region deeply. Only the anchored form below forces
        // failure, and with it, exponential backtracking.
        let diag = run("(a*)*");
        assert!(diag.is_safe());
    }

    #[test]
    fn anchored_nested_star_is_exponential() {
        let diag = run("^(a*)*$");
        assert!(diag.is_vulnerable());
        assert!(diag.complexity.unwrap().is_exponential());
    }

    #[test]
    fn classic_nested_plus_is_exponential() {
        let diag = run("^(a+)+$");
        assert!(diag.is_vulnerable());
        assert_eq!(diag.complexity, Some(Complexity::Exponential));
    }

    #[test]
    fn email_like_pattern_is_exponential_even_unanchored_at_end() {
        // The trailing literal `@` (not a `$`) is enough to make the nested
        // quantifier exploitable: no match can succeed without it, so an
        // attacker can still force catastrophic backtracking before failing.
        let diag = run(r"^([^@]+)+@");
        assert!(diag.is_vulnerable());
        assert!(diag.complexity.unwrap().is_exponential());
    }

    #[test]
    fn chained_dot_star_is_polynomial_degree_two() {
        let diag = run(".*a.*a.*");
        assert!(diag.is_vulnerable());
        assert_eq!(diag.complexity, Some(Complexity::Polynomial(2)));
    }

    #[test]
    fn chained_dot_star_is_polynomial_degree_three() {
        let diag = run(".*a.*a.*a.*");
        assert!(diag.is_vulnerable());
        assert_eq!(diag.complexity, Some(Complexity::Polynomial(3)));
    }

    #[test]
    fn backreference_pattern_routes_through_fuzz_checker() {
        let diag = run(r"^(a+)\1$");
        assert_eq!(diag.checker, Some(Checker::Fuzz));
    }

    #[test]
    fn invalid_pattern_reports_error_status_not_panic() {
        let diag = run("(unclosed");
        assert!(diag.is_error());
        assert!(diag.error.is_some());
    }

    #[test]
    fn is_safe_and_is_vulnerable_agree_with_check() {
        assert!(is_safe("abc", Flags::default(), Config::default()));
        assert!(is_vulnerable("^(a+)+$", Flags::default(), Config::default()));
    }

    #[test]
    fn determinism_same_input_same_verdict() {
        let d1 = run(r"^(a+)\1$");
        let d2 = run(r"^(a+)\1$");
        assert_eq!(d1.status, d2.status);
    }
}
