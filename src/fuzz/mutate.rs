//! Deterministic mutation of a candidate attack string, seeded from
//! [`crate::config::Config::fuzz_seed`] so two runs over the same pattern
//! and config always explore the corpus in the same order (spec P6).

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::Acceleration;
use crate::witness::AttackPattern;

const ALPHABET: &[char] = &['a', 'b', '\n', '0', ' '];

/// Applies one random mutation: grow or shrink the pump, or perturb the
/// suffix, chosen uniformly.
///
/// Under `Acceleration::On` (or `Auto`, which behaves the same way here)
/// the pump grows by a short chunk of characters per mutation instead of
/// one at a time, converging on a strong witness in fewer iterations at
/// the cost of coarser step sizes.
pub fn mutate(current: &AttackPattern, rng: &mut StdRng, acceleration: Acceleration) -> AttackPattern {
    let mut next = current.clone();
    let chunk = if acceleration == Acceleration::Off { 1 } else { 3 };
    match rng.random_range(0..4) {
        0 => {
            for _ in 0..chunk {
                let c = ALPHABET[rng.random_range(0..ALPHABET.len())];
                next.pump.push(c);
            }
        }
        1 => {
            if next.pump.len() > 1 {
                next.pump.pop();
            }
        }
        2 => {
            let c = ALPHABET[rng.random_range(0..ALPHABET.len())];
            next.suffix.push(c);
        }
        _ => {
            if !next.prefix.is_empty() && rng.random_bool(0.5) {
                next.prefix.pop();
            } else {
                let c = ALPHABET[rng.random_range(0..ALPHABET.len())];
                next.prefix.push(c);
            }
        }
    }
    next.base = next.prefix.chars().count() as u32;
    next
}
