//! Tunable limits and thresholds for [`crate::checker::check`] (spec §3, §5).

use bon::bon;

/// Which analysis path to use (spec §3 `checker` option, §4.7 gate rule 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckerMode {
    /// Let the feasibility gate decide (default).
    #[default]
    Auto,
    /// Force the automaton path; an infeasible pattern reports `Unknown`
    /// instead of silently falling back to fuzzing.
    Automaton,
    /// Force the fuzz path even for patterns the automaton path could
    /// handle.
    Fuzz,
}

/// How to treat the implicit trailing context when deciding whether an
/// ambiguous automaton region is actually exploitable (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Exploitable if a right anchor is present, OR the pattern requires a
    /// continuation past the ambiguous region (the disjunction in §4.4).
    #[default]
    Auto,
    /// Always treat the match as if it must consume the whole input,
    /// regardless of anchors or continuation.
    Full,
    /// Require both a right anchor AND a continuation (the conjunction in
    /// §4.4) — the strictest, least false-positive-prone setting.
    Partial,
}

/// How the fuzz path's initial corpus is built (spec §3 `seeder` option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeederMode {
    /// Structural seeds derived from the AST's repeat nodes only.
    #[default]
    Static,
    /// Structural seeds, plus an extra seed derived by mutating the first
    /// one under the configured `fuzz_seed` — still fully deterministic.
    Dynamic,
}

/// How aggressively the fuzz mutator grows pump candidates (spec §3
/// `acceleration` option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acceleration {
    /// Behaves like `On` — this crate has no adaptive heuristic to switch
    /// on, so `Auto` and `On` coincide.
    #[default]
    Auto,
    /// Grow the pump by a multi-character chunk per mutation, for faster
    /// convergence on a strong witness.
    On,
    /// Grow the pump one character at a time.
    Off,
}

/// Growth-rate threshold (in measured step count) above which [`crate::recall`]
/// confirms a witness as exponential rather than demoting it to `Unknown`.
///
/// Spec §9 "Open question — recall threshold" asks that these constants be
/// exposed as configuration rather than hard-coded, so they live as
/// [`Config`] fields (`exponential_growth_ratio` / `polynomial_fit_threshold`)
/// below; these constants only document their shipped defaults.
pub const EXPONENTIAL_GROWTH_RATIO: f64 = 1.5;

/// Minimum R² of the log-log fit required for [`crate::recall`] to accept a
/// polynomial-degree estimate instead of demoting to `Unknown`.
pub const POLYNOMIAL_FIT_THRESHOLD: f64 = 0.9;

/// Configuration for a single [`crate::checker::check`] call.
///
/// Built with [`Config::builder`]; every field has a spec-mandated default
/// (spec §3 "Config") so `Config::default()` is always a legal, safe-by-default
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Which analysis path to use.
    pub checker: CheckerMode,
    /// How to treat implicit trailing context for exploitability.
    pub match_mode: MatchMode,
    /// Hard cap on pattern source length, in bytes. Patterns over this size
    /// fail the feasibility gate and fall straight to the fuzz path.
    pub max_pattern_size: usize,
    /// Hard cap on the number of ε-NFA states the automaton path may build.
    /// Exceeding it routes to the fuzz path (spec §4.7).
    pub max_nfa_size: usize,
    /// Wall-clock budget for the whole `check()` call.
    pub timeout: std::time::Duration,
    /// Wall-clock budget for the recall-validation sub-phase alone.
    pub recall_timeout: std::time::Duration,
    /// Cap on fuzz iterations when the fuzz path is taken.
    pub max_fuzz_iterations: u32,
    /// Cap on VM steps per single simulated match, used both by the fuzz
    /// path and by recall validation to detect runaway backtracking without
    /// actually waiting for it.
    pub max_vm_steps: u64,
    /// Pump-length values used during recall validation, e.g. `[8, 16, 32]`.
    pub recall_pump_lengths: Vec<u32>,
    /// Seed for the deterministic fuzzer RNG (spec P6: determinism).
    pub fuzz_seed: u64,
    /// Maximum rendered attack-string length; bounds `AttackPattern`'s
    /// default `repeat` (spec §4.6).
    pub max_attack_length: usize,
    /// Floor for the default `repeat` count synthesized for an
    /// `AttackPattern` (spec §4.6 "repeat ≥ attack_limit's minimum").
    pub attack_limit: u32,
    /// Caps how many of `recall_pump_lengths` are actually sampled during
    /// recall validation.
    pub recall_limit: usize,
    /// Skip empirical recall validation entirely and trust the automaton's
    /// static ambiguity classification (spec §4.8 "Skipped when
    /// `skip_recall = true`").
    pub skip_recall: bool,
    /// How the fuzz path seeds its initial corpus.
    pub seeder: SeederMode,
    /// How aggressively the fuzz mutator grows pump candidates.
    pub acceleration: Acceleration,
    /// Growth-rate ratio threshold for classifying exponential growth.
    pub exponential_growth_ratio: f64,
    /// R² threshold for accepting a polynomial-degree log-log fit.
    pub polynomial_fit_threshold: f64,
}

#[bon]
impl Config {
    #[builder]
    pub fn new(
        #[builder(default)] checker: CheckerMode,
        #[builder(default)] match_mode: MatchMode,
        #[builder(default = 4096)] max_pattern_size: usize,
        #[builder(default = 20_000)] max_nfa_size: usize,
        #[builder(default = std::time::Duration::from_millis(500))] timeout: std::time::Duration,
        #[builder(default = std::time::Duration::from_millis(200))] recall_timeout: std::time::Duration,
        #[builder(default = 2_000)] max_fuzz_iterations: u32,
        #[builder(default = 1_000_000)] max_vm_steps: u64,
        #[builder(default = vec![8, 16, 32, 64])] recall_pump_lengths: Vec<u32>,
        #[builder(default = 0x5EED)] fuzz_seed: u64,
        #[builder(default = 64)] max_attack_length: usize,
        #[builder(default = 20)] attack_limit: u32,
        #[builder(default = 4)] recall_limit: usize,
        #[builder(default = false)] skip_recall: bool,
        #[builder(default)] seeder: SeederMode,
        #[builder(default)] acceleration: Acceleration,
        #[builder(default = EXPONENTIAL_GROWTH_RATIO)] exponential_growth_ratio: f64,
        #[builder(default = POLYNOMIAL_FIT_THRESHOLD)] polynomial_fit_threshold: f64,
    ) -> Self {
        Config {
            checker,
            match_mode,
            max_pattern_size,
            max_nfa_size,
            timeout,
            recall_timeout,
            max_fuzz_iterations,
            max_vm_steps,
            recall_pump_lengths,
            fuzz_seed,
            max_attack_length,
            attack_limit,
            recall_limit,
            skip_recall,
            seeder,
            acceleration,
            exponential_growth_ratio,
            polynomial_fit_threshold,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_values() {
        let cfg = Config::default();
        assert_eq!(cfg.max_pattern_size, 4096);
        assert_eq!(cfg.max_nfa_size, 20_000);
        assert_eq!(cfg.recall_pump_lengths, vec![8, 16, 32, 64]);
        assert_eq!(cfg.checker, CheckerMode::Auto);
        assert_eq!(cfg.match_mode, MatchMode::Auto);
        assert_eq!(cfg.attack_limit, 20);
        assert!(!cfg.skip_recall);
    }

    #[test]
    fn builder_overrides_individual_fields() {
        let cfg = Config::builder().max_pattern_size(128).fuzz_seed(7).build();
        assert_eq!(cfg.max_pattern_size, 128);
        assert_eq!(cfg.fuzz_seed, 7);
        // untouched fields keep their defaults
        assert_eq!(cfg.max_nfa_size, 20_000);
    }

    #[test]
    fn builder_overrides_checker_and_match_mode() {
        let cfg = Config::builder().checker(CheckerMode::Automaton).match_mode(MatchMode::Partial).build();
        assert_eq!(cfg.checker, CheckerMode::Automaton);
        assert_eq!(cfg.match_mode, MatchMode::Partial);
    }
}
