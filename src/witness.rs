//! Synthesizes a concrete `(prefix, pump, suffix)` attack string from
//! ambiguity evidence (spec §4.6).

use std::collections::{HashSet, VecDeque};

use crate::ast::{Node, Span};
use crate::config::Config;
use crate::nfa::look_ahead::NfaWithLookAhead;
use crate::scc::AmbiguityWitness;

/// A witness that `prefix + pump.repeat(n) + suffix` forces super-linear
/// backtracking, for increasing `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackPattern {
    pub prefix: String,
    pub pump: String,
    pub suffix: String,
    /// `max(prefix length, 0)` (spec §4.6) — always equal to `prefix`'s
    /// length since a `String`'s length can't be negative; kept as its own
    /// field because the wire format names it separately from `prefix`.
    pub base: u32,
    /// Default pump repeat count, sized so the rendered string fits within
    /// `max_attack_length` while still repeating at least `attack_limit`
    /// times (spec §4.6).
    pub repeat: u32,
}

impl AttackPattern {
    /// Renders the concrete attack string for a given repeat count.
    pub fn render(&self, n: u32) -> String {
        let mut s = String::with_capacity(self.prefix.len() + self.pump.len() * n as usize + self.suffix.len());
        s.push_str(&self.prefix);
        for _ in 0..n {
            s.push_str(&self.pump);
        }
        s.push_str(&self.suffix);
        s
    }

    /// Renders the attack string at this witness's default `repeat`.
    pub fn render_default(&self) -> String {
        self.render(self.repeat)
    }
}

/// Chooses a default `repeat` satisfying `|prefix| + |pump|*repeat + |suffix|
/// <= max_attack_length` where possible, but never below `attack_limit`
/// (spec §4.6's two constraints conflict whenever the pump alone can't fit
/// `attack_limit` copies within the length cap; this crate always returns
/// exactly one witness per call, so the floor wins that conflict rather than
/// silently truncating the witness below the caller's requested strength).
fn default_repeat(prefix_len: usize, pump_len: usize, suffix_len: usize, config: &Config) -> u32 {
    if pump_len == 0 {
        return config.attack_limit;
    }
    let overhead = prefix_len + suffix_len;
    let capacity = config.max_attack_length.saturating_sub(overhead);
    let max_fit = (capacity / pump_len) as u32;
    config.attack_limit.max(max_fit)
}

/// Shortest sequence of representative characters leading from `la.start` to
/// `target`, via breadth-first search over the look-ahead NFA.
fn shortest_path_chars(la: &NfaWithLookAhead, start: usize, target: usize) -> String {
    if start == target {
        return String::new();
    }
    let mut visited = vec![false; la.state_count()];
    let mut parent: Vec<Option<(usize, char)>> = vec![None; la.state_count()];
    visited[start] = true;
    let mut queue = VecDeque::from([start]);
    while let Some(s) = queue.pop_front() {
        if s == target {
            break;
        }
        for (set, t) in &la.edges[s] {
            if visited[*t] {
                continue;
            }
            visited[*t] = true;
            parent[*t] = Some((s, set.min_char().unwrap_or('a')));
            queue.push_back(*t);
        }
    }
    if !visited[target] {
        return String::new();
    }
    let mut chars = Vec::new();
    let mut cur = target;
    while let Some((prev, ch)) = parent[cur] {
        chars.push(ch);
        cur = prev;
    }
    chars.reverse();
    chars.into_iter().collect()
}

/// A short cycle from `entry` back to itself, visiting only `members`.
fn shortest_cycle_chars(la: &NfaWithLookAhead, entry: usize, members: &HashSet<usize>) -> String {
    let mut visited = vec![false; la.state_count()];
    let mut parent: Vec<Option<(usize, char)>> = vec![None; la.state_count()];
    let mut queue = VecDeque::new();
    for (set, t) in &la.edges[entry] {
        if !members.contains(t) {
            continue;
        }
        if *t == entry {
            return set.min_char().map(|c| c.to_string()).unwrap_or_default();
        }
        if !visited[*t] {
            visited[*t] = true;
            parent[*t] = Some((entry, set.min_char().unwrap_or('a')));
            queue.push_back(*t);
        }
    }
    while let Some(s) = queue.pop_front() {
        for (set, t) in &la.edges[s] {
            if !members.contains(t) {
                continue;
            }
            if *t == entry {
                let mut chars = Vec::new();
                let ch = set.min_char().unwrap_or('a');
                chars.push(ch);
                let mut cur = s;
                while let Some((prev, c)) = parent[cur] {
                    chars.push(c);
                    cur = prev;
                }
                chars.reverse();
                return chars.into_iter().collect();
            }
            if !visited[*t] {
                visited[*t] = true;
                parent[*t] = Some((s, set.min_char().unwrap_or('a')));
                queue.push_back(*t);
            }
        }
    }
    "a".to_string()
}

/// Picks up a trailing run of literal characters at the very end of the
/// pattern, e.g. the `@` in `^([^@]+)+@`. Used so the synthesized suffix
/// actually defeats the continuation an attacker would need to satisfy,
/// rather than just any single excluded character.
fn trailing_literal(node: &Node) -> String {
    match node {
        Node::Literal { ch, .. } => ch.to_string(),
        Node::Concat(nodes) => {
            let mut s = String::new();
            for n in nodes.iter().rev() {
                match n {
                    Node::Literal { ch, .. } => s.insert(0, *ch),
                    Node::Anchor { .. } => continue,
                    _ => break,
                }
            }
            s
        }
        Node::Group { node, .. } => trailing_literal(node),
        _ => String::new(),
    }
}

/// Builds an [`AttackPattern`] from ambiguity evidence found by
/// [`crate::scc::analyze`].
pub fn build(witness: &AmbiguityWitness, la: &NfaWithLookAhead, root: &Node, config: &Config) -> AttackPattern {
    let prefix = shortest_path_chars(la, la.start, witness.entry_state);
    let members: HashSet<usize> = witness.scc_states.iter().copied().collect();
    let pump = shortest_cycle_chars(la, witness.entry_state, &members);

    let pump_labels = witness
        .scc_states
        .iter()
        .flat_map(|&s| la.edges[s].iter().map(|(set, _)| set.clone()))
        .fold(crate::ast::ClassSet::empty(), |acc, s| acc.union(&s));
    let excluded = pump_labels.any_excluded_char().unwrap_or('\u{1}');

    let mut suffix = String::new();
    suffix.push(excluded);
    suffix.push_str(&trailing_literal(root));

    let base = prefix.chars().count() as u32;
    let repeat = default_repeat(prefix.len(), pump.len(), suffix.len(), config);

    AttackPattern { prefix, pump, suffix, base, repeat }
}

/// Union of source spans carried by the look-ahead-NFA states participating
/// in an ambiguity cycle (spec §4.6: "Hotspot = union of source spans
/// carried by NFAwLA states participating in the ambiguity cycle").
///
/// Returns `None` if none of the member states were tagged with a span
/// (only possible for a pattern with no source at all).
pub fn hotspot(la: &NfaWithLookAhead, scc_states: &[usize]) -> Option<Span> {
    let mut result: Option<Span> = None;
    for &s in scc_states {
        let Some(span) = &la.spans[s] else { continue };
        result = Some(match result {
            Some(acc) => acc.start.min(span.start)..acc.end.max(span.end),
            None => span.clone(),
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::{nfa, parser, scc};

    fn witness_for(src: &str) -> (AttackPattern, crate::complexity::Complexity) {
        let pattern = parser::parse(src, Flags::default()).unwrap();
        let enfa = nfa::build(&pattern.root).unwrap();
        let ordered = nfa::ordered::build(&enfa);
        let la = nfa::look_ahead::build(&ordered);
        let w = scc::analyze(&la).expect("expected ambiguity");
        let complexity = w.complexity;
        (build(&w, &la, &pattern.root, &Config::default()), complexity)
    }

    fn attack(prefix: &str, pump: &str, suffix: &str) -> AttackPattern {
        AttackPattern {
            prefix: prefix.into(),
            pump: pump.into(),
            suffix: suffix.into(),
            base: prefix.chars().count() as u32,
            repeat: 20,
        }
    }

    #[test]
    fn nested_star_produces_nonempty_pump() {
        let (attack, _) = witness_for("(a+)+");
        assert!(!attack.pump.is_empty());
    }

    #[test]
    fn render_repeats_pump_n_times() {
        let a = attack("p", "ab", "s");
        assert_eq!(a.render(3), "pabababs");
        assert_eq!(a.render(0), "ps");
    }

    #[test]
    fn suffix_includes_trailing_literal_anchor() {
        let (attack, _) = witness_for("^([^@]+)+@");
        assert!(attack.suffix.ends_with('@'));
    }

    #[test]
    fn base_equals_prefix_length() {
        let (attack, _) = witness_for("^([^@]+)+@");
        assert_eq!(attack.base, attack.prefix.chars().count() as u32);
    }

    #[test]
    fn default_repeat_respects_attack_limit_floor() {
        let config = Config::builder().max_attack_length(4).attack_limit(20).build();
        let r = default_repeat(0, 1, 0, &config);
        assert_eq!(r, 20, "attack_limit is a floor, even when it overruns max_attack_length");
    }

    #[test]
    fn default_repeat_fills_available_length_when_roomy() {
        let config = Config::builder().max_attack_length(100).attack_limit(5).build();
        let r = default_repeat(0, 2, 0, &config);
        assert_eq!(r, 50);
    }

    #[test]
    fn hotspot_unions_member_spans() {
        let pattern = parser::parse("(a+)+", Flags::default()).unwrap();
        let enfa = nfa::build(&pattern.root).unwrap();
        let ordered = nfa::ordered::build(&enfa);
        let la = nfa::look_ahead::build(&ordered);
        let w = scc::analyze(&la).expect("expected ambiguity");
        let span = hotspot(&la, &w.scc_states).expect("expected a hotspot");
        assert!(span.start < span.end);
    }
}
