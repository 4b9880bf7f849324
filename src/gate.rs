//! Feasibility gate (spec §4.7): decides whether a pattern's AST is a
//! candidate for the automaton path, or must fall back to the fuzz path.

use crate::ast::Pattern;
use crate::config::{CheckerMode, Config};
use crate::error::Infeasibility;
use crate::nfa;

/// Where a pattern should be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Automaton,
    Fuzz(Infeasibility),
    /// `config.checker` was pinned to `CheckerMode::Automaton`, but the
    /// pattern isn't automaton-feasible (spec §4.7 gate rule 2: "If
    /// checker = AUTOMATON explicitly, skip FUZZ"). Reported as `Unknown`
    /// rather than silently falling back to the fuzz path.
    Unsupported(Infeasibility),
}

/// Applies the feasibility rules in order (spec §4.7 step 1): backreference
/// or look-around anywhere in the AST, oversize pattern source, or an
/// NFA projected to exceed `config.max_nfa_size`.
fn feasibility(pattern: &Pattern, config: &Config) -> Result<(), Infeasibility> {
    if pattern.source.len() > config.max_pattern_size {
        return Err(Infeasibility::PatternTooLarge);
    }
    if pattern.root.contains_backref() {
        return Err(Infeasibility::Backreference);
    }
    if pattern.root.contains_lookaround() {
        return Err(Infeasibility::LookAround);
    }
    match nfa::build(&pattern.root) {
        Ok(enfa) if enfa.state_count() <= config.max_nfa_size => Ok(()),
        Ok(_) => Err(Infeasibility::NfaTooLarge),
        Err(infeasible) => Err(infeasible),
    }
}

/// Routes `pattern` to the automaton or fuzz path, honoring `config.checker`
/// (spec §4.7 gate rule 2) before falling through to the natural feasibility
/// rules.
pub fn route(pattern: &Pattern, config: &Config) -> Route {
    if config.checker == CheckerMode::Fuzz {
        return Route::Fuzz(Infeasibility::Forced);
    }
    match feasibility(pattern, config) {
        Ok(()) => Route::Automaton,
        Err(reason) if config.checker == CheckerMode::Automaton => Route::Unsupported(reason),
        Err(reason) => Route::Fuzz(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::parser;

    #[test]
    fn plain_pattern_routes_to_automaton() {
        let pattern = parser::parse("a+b", Flags::default()).unwrap();
        assert_eq!(route(&pattern, &Config::default()), Route::Automaton);
    }

    #[test]
    fn backreference_routes_to_fuzz() {
        let pattern = parser::parse(r"(a)\1", Flags::default()).unwrap();
        assert_eq!(route(&pattern, &Config::default()), Route::Fuzz(Infeasibility::Backreference));
    }

    #[test]
    fn lookaround_routes_to_fuzz() {
        let pattern = parser::parse("(?=a)b", Flags::default()).unwrap();
        assert_eq!(route(&pattern, &Config::default()), Route::Fuzz(Infeasibility::LookAround));
    }

    #[test]
    fn oversize_pattern_routes_to_fuzz() {
        let pattern = parser::parse(&"a".repeat(10), Flags::default()).unwrap();
        let config = Config::builder().max_pattern_size(5).build();
        assert_eq!(route(&pattern, &config), Route::Fuzz(Infeasibility::PatternTooLarge));
    }

    #[test]
    fn tiny_nfa_budget_routes_to_fuzz() {
        let pattern = parser::parse("a+b+c+d+", Flags::default()).unwrap();
        let config = Config::builder().max_nfa_size(2).build();
        assert_eq!(route(&pattern, &config), Route::Fuzz(Infeasibility::NfaTooLarge));
    }

    #[test]
    fn checker_mode_fuzz_forces_fuzz_path_even_for_feasible_pattern() {
        let pattern = parser::parse("a+b", Flags::default()).unwrap();
        let config = Config::builder().checker(crate::config::CheckerMode::Fuzz).build();
        assert_eq!(route(&pattern, &config), Route::Fuzz(Infeasibility::Forced));
    }

    #[test]
    fn checker_mode_automaton_reports_unsupported_instead_of_falling_back() {
        let pattern = parser::parse(r"(a)\1", Flags::default()).unwrap();
        let config = Config::builder().checker(crate::config::CheckerMode::Automaton).build();
        assert_eq!(route(&pattern, &config), Route::Unsupported(Infeasibility::Backreference));
    }
}
