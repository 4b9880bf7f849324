//! Recall validation (spec §4.9): confirms ambiguity evidence empirically by
//! running the step-counting VM over increasing pump lengths and fitting
//! the observed growth curve, rather than trusting the automaton analysis
//! (or the fuzzer) blindly.

use crate::ast::Pattern;
use crate::complexity::Complexity;
use crate::config::Config;
use crate::vm::{compiler, interp};
use crate::witness::AttackPattern;

/// Runs `candidate` at each of the first `config.recall_limit` entries of
/// `config.recall_pump_lengths`, returning `(pump_length, step_count)`
/// pairs.
pub fn measure(pattern: &Pattern, candidate: &AttackPattern, config: &Config) -> Vec<(u32, u64)> {
    let program = compiler::compile(pattern);
    config
        .recall_pump_lengths
        .iter()
        .take(config.recall_limit)
        .map(|&n| {
            let input = candidate.render(n);
            let result = interp::run(&program, &input, config.max_vm_steps);
            (n, result.steps)
        })
        .collect()
}

/// Classifies a growth curve of `(n, steps)` samples as `Exponential`,
/// `Polynomial(k)`, or demotes to `None` (the caller reports `Unknown`) when
/// the curve doesn't clear either bar convincingly.
///
/// Exponential growth is detected by a roughly constant ratio between
/// consecutive step counts above [`Config::exponential_growth_ratio`].
/// Polynomial degree is estimated via the slope of a log(steps)-vs-log(n)
/// least-squares fit, accepted only when the fit is tight enough
/// ([`Config::polynomial_fit_threshold`] R²) to trust the rounded degree.
pub fn classify_growth(samples: &[(u32, u64)], config: &Config) -> Option<Complexity> {
    if samples.len() < 2 {
        return None;
    }
    let finite: Vec<(f64, f64)> = samples
        .iter()
        .filter(|&&(n, steps)| n > 0 && steps > 0)
        .map(|&(n, steps)| (n as f64, steps as f64))
        .collect();
    if finite.len() < 2 {
        return None;
    }

    // Per-character growth rate: d(ln steps)/dn between consecutive samples.
    // True exponential growth (steps ~ C * b^n) holds this rate constant
    // regardless of spacing; polynomial growth (steps ~ C * n^k) has a rate
    // that *decays* as n grows, since d(ln steps)/dn = k/n.
    let mut rates = Vec::new();
    for w in finite.windows(2) {
        let (n0, s0) = w[0];
        let (n1, s1) = w[1];
        if n1 > n0 {
            rates.push((s1.ln() - s0.ln()) / (n1 - n0));
        }
    }
    if !rates.is_empty() {
        let min_rate = rates.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_rate = rates.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exponential_signal = min_rate > 0.02 && max_rate / min_rate < config.exponential_growth_ratio;
        if exponential_signal {
            return Some(Complexity::Exponential);
        }
    }

    let log_points: Vec<(f64, f64)> = finite.iter().map(|&(n, s)| (n.ln(), s.ln())).collect();
    let (slope, r_squared) = linear_fit(&log_points);
    if r_squared >= config.polynomial_fit_threshold && slope >= 1.5 {
        let degree = slope.round().max(2.0) as u32;
        return Some(Complexity::Polynomial(degree));
    }

    None
}

/// Ordinary least-squares fit `y = slope * x + intercept`, returning
/// `(slope, r_squared)`.
fn linear_fit(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|&(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|&(_, y)| y).sum();
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for &(x, y) in points {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
    }
    if var_x == 0.0 {
        return (0.0, 0.0);
    }
    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;

    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for &(x, y) in points {
        let pred = slope * x + intercept;
        ss_res += (y - pred).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };
    (slope, r_squared)
}

/// Validates an automaton-derived [`AttackPattern`] by measuring its actual
/// growth curve. Returns `None` if the curve doesn't confirm super-linear
/// behavior, in which case the caller downgrades the verdict to `Unknown`
/// rather than trusting the static analysis unconditionally.
pub fn validate(pattern: &Pattern, candidate: &AttackPattern, config: &Config) -> Option<Complexity> {
    let samples = measure(pattern, candidate, config);
    classify_growth(&samples, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_samples_classify_as_exponential() {
        let samples = vec![(4, 16), (8, 256), (12, 4096)];
        assert_eq!(classify_growth(&samples, &Config::default()), Some(Complexity::Exponential));
    }

    #[test]
    fn quadratic_samples_classify_as_polynomial_two() {
        let samples = vec![(8, 64), (16, 256), (32, 1024), (64, 4096)];
        let result = classify_growth(&samples, &Config::default());
        assert_eq!(result, Some(Complexity::Polynomial(2)));
    }

    #[test]
    fn linear_samples_are_not_confirmed() {
        let samples = vec![(8, 16), (16, 32), (32, 64), (64, 128)];
        assert_eq!(classify_growth(&samples, &Config::default()), None);
    }

    #[test]
    fn growth_thresholds_are_configurable() {
        let samples = vec![(4, 16), (8, 64), (16, 100)];
        assert_eq!(classify_growth(&samples, &Config::default()), None);
        let lenient = Config::builder().exponential_growth_ratio(10.0).build();
        assert_eq!(classify_growth(&samples, &lenient), Some(Complexity::Exponential));
    }

    #[test]
    fn measure_respects_recall_limit() {
        use crate::flags::Flags;
        use crate::parser;

        let pattern = parser::parse("(a+)+", Flags::default()).unwrap();
        let config = Config::builder().recall_limit(2).build();
        let attack = AttackPattern { prefix: "".into(), pump: "a".into(), suffix: "!".into(), base: 0, repeat: 4 };
        let samples = measure(&pattern, &attack, &config);
        assert_eq!(samples.len(), 2);
    }
}
