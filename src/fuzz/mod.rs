//! Seed/mutate fuzzing fallback (spec §4.8), used when the feasibility gate
//! (see [`crate::gate`]) routes a pattern away from the automaton path.

pub mod mutate;
pub mod seed;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ast::Pattern;
use crate::complexity::Complexity;
use crate::config::Config;
use crate::vm::{compiler, interp};
use crate::witness::AttackPattern;

/// Outcome of the fuzz loop: either a witness with its classified
/// complexity, or nothing found within budget.
#[derive(Debug, Clone)]
pub struct FuzzResult {
    pub witness: Option<(AttackPattern, Complexity)>,
    pub iterations: u32,
}

/// Seeds a small corpus of candidate attack strings from the pattern's own
/// structure, then repeatedly mutates the most promising one, measuring VM
/// step growth at each iteration (spec P6: determinism under a fixed seed).
pub fn run(pattern: &Pattern, config: &Config) -> FuzzResult {
    let program = compiler::compile(pattern);
    let mut rng = StdRng::seed_from_u64(config.fuzz_seed);

    let mut corpus = seed::seed_corpus(&pattern.root, config);
    if corpus.is_empty() {
        corpus.push(AttackPattern {
            prefix: String::new(),
            pump: "a".to_string(),
            suffix: String::new(),
            base: 0,
            repeat: config.attack_limit,
        });
    }

    let mut best: Option<(AttackPattern, u64)> = None;
    let mut iterations = 0u32;

    for candidate in &corpus {
        let steps = measure_growth(&program, candidate, config);
        iterations += 1;
        if best.as_ref().map(|(_, s)| steps > *s).unwrap_or(true) {
            best = Some((candidate.clone(), steps));
        }
    }

    while iterations < config.max_fuzz_iterations {
        let Some((current, current_steps)) = best.clone() else { break };
        let mutated = mutate::mutate(&current, &mut rng, config.acceleration);
        let steps = measure_growth(&program, &mutated, config);
        iterations += 1;
        if steps > current_steps {
            best = Some((mutated, steps));
        }
        if steps >= config.max_vm_steps {
            break;
        }
    }

    let witness = best.and_then(|(attack, _)| classify_from_growth(&program, &attack, config).map(|c| (attack, c)));

    FuzzResult { witness, iterations }
}

/// Runs `candidate` at the largest configured pump length and returns the
/// VM step count observed, as a single scalar fitness signal for the
/// mutate loop.
fn measure_growth(program: &crate::vm::Program, candidate: &AttackPattern, config: &Config) -> u64 {
    let n = config.recall_pump_lengths.last().copied().unwrap_or(32);
    let input = candidate.render(n);
    interp::run(program, &input, config.max_vm_steps).steps
}

/// Classifies the fuzz-discovered candidate's growth curve the same way
/// [`crate::recall`] classifies automaton-derived witnesses.
fn classify_from_growth(program: &crate::vm::Program, candidate: &AttackPattern, config: &Config) -> Option<Complexity> {
    let samples: Vec<(u32, u64)> = config
        .recall_pump_lengths
        .iter()
        .map(|&n| {
            let input = candidate.render(n);
            (n, interp::run(program, &input, config.max_vm_steps).steps)
        })
        .collect();
    crate::recall::classify_growth(&samples, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::parser;

    #[test]
    fn fuzzing_backreference_pattern_is_deterministic() {
        let pattern = parser::parse(r"(a+)\1b", Flags::default()).unwrap();
        let config = Config::default();
        let r1 = run(&pattern, &config);
        let r2 = run(&pattern, &config);
        assert_eq!(r1.iterations, r2.iterations);
    }

    #[test]
    fn fuzzing_safe_pattern_finds_no_witness() {
        let pattern = parser::parse(r"(a)\1", Flags::default()).unwrap();
        let config = Config::default();
        let result = run(&pattern, &config);
        assert!(result.witness.is_none());
    }
}
