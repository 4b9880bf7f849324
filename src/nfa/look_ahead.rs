//! NFA augmented with a reverse-DFA look-ahead component (spec §4.3).
//!
//! Built in two stages:
//!
//! 1. [`build_lookahead_dfa`] determinizes the *reversed* [`OrderedNfa`] via
//!    subset construction. A resulting DFA state is "live" precisely when
//!    the subset of original NFA states it represents contains the
//!    original start state — the operational definition this module follows
//!    literally.
//! 2. [`build`] walks the forward automaton and this reverse DFA in
//!    lockstep, keeping a product transition `(q, d) --c--> (q', d')` only
//!    when `d'` is live. This prunes forward transitions that cannot be
//!    part of any run the automaton could actually have taken from its true
//!    start, without discarding genuine nondeterminism (a single symbol can
//!    still fan out to several product states, which is exactly the
//!    ambiguity [`crate::scc`] needs to see).

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::ast::{ClassSet, Span};

use super::ordered::OrderedNfa;
use super::{minterms, StateId};

struct RState {
    members: BTreeSet<StateId>,
    live: bool,
    edges: Vec<(ClassSet, usize)>,
}

struct ReverseDfa {
    states: Vec<RState>,
}

fn build_lookahead_dfa(ordered: &OrderedNfa) -> ReverseDfa {
    let n = ordered.state_count;
    let mut rev: Vec<Vec<(ClassSet, StateId)>> = vec![Vec::new(); n];
    for s in 0..n {
        for (set, t) in &ordered.edges[s] {
            rev[*t as usize].push((set.clone(), s as StateId));
        }
    }

    let start_set: BTreeSet<StateId> = std::iter::once(ordered.accept).collect();
    let mut index: HashMap<BTreeSet<StateId>, usize> = HashMap::new();
    index.insert(start_set.clone(), 0);
    let mut states = vec![RState {
        live: start_set.contains(&ordered.start),
        members: start_set,
        edges: Vec::new(),
    }];
    let mut queue: VecDeque<usize> = VecDeque::from([0]);

    while let Some(id) = queue.pop_front() {
        let members = states[id].members.clone();
        let mut label_sets = Vec::new();
        for &m in &members {
            for (set, _) in &rev[m as usize] {
                label_sets.push(set.clone());
            }
        }
        let mints = minterms(&label_sets);
        for m in mints {
            let mut succ = BTreeSet::new();
            for &member in &members {
                for (set, target) in &rev[member as usize] {
                    if set.intersects(&m) {
                        succ.insert(*target);
                    }
                }
            }
            if succ.is_empty() {
                continue;
            }
            let next_id = match index.get(&succ) {
                Some(&existing) => existing,
                None => {
                    let id2 = states.len();
                    index.insert(succ.clone(), id2);
                    states.push(RState {
                        live: succ.contains(&ordered.start),
                        members: succ,
                        edges: Vec::new(),
                    });
                    queue.push_back(id2);
                    id2
                }
            };
            states[id].edges.push((m, next_id));
        }
    }

    ReverseDfa { states }
}

/// The product automaton: states are `(forward NFA state, look-ahead DFA
/// state)` pairs, indexed densely by a freshly assigned id.
#[derive(Debug, Clone)]
pub struct NfaWithLookAhead {
    /// `states[id] = (forward_state, lookahead_state)`.
    pub states: Vec<(StateId, usize)>,
    pub start: usize,
    pub accept: Vec<bool>,
    pub edges: Vec<Vec<(ClassSet, usize)>>,
    /// Source span of each product state, inherited from its forward
    /// component (the look-ahead component carries no span of its own).
    pub spans: Vec<Option<Span>>,
}

impl NfaWithLookAhead {
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

/// Builds the look-ahead-pruned product automaton for `ordered`.
pub fn build(ordered: &OrderedNfa) -> NfaWithLookAhead {
    let r = build_lookahead_dfa(ordered);

    let mut states = Vec::new();
    let mut index: HashMap<(StateId, usize), usize> = HashMap::new();
    let mut edges: Vec<Vec<(ClassSet, usize)>> = Vec::new();

    let start_key = (ordered.start, 0usize);
    index.insert(start_key, 0);
    states.push(start_key);
    edges.push(Vec::new());
    let mut queue: VecDeque<usize> = VecDeque::from([0]);

    while let Some(id) = queue.pop_front() {
        let (q, d) = states[id];
        let q_edges = &ordered.edges[q as usize];
        let d_edges = &r.states[d].edges;

        let mut label_sets: Vec<ClassSet> = q_edges.iter().map(|(s, _)| s.clone()).collect();
        label_sets.extend(d_edges.iter().map(|(s, _)| s.clone()));
        let mints = minterms(&label_sets);

        for m in mints {
            for (set_f, q2) in q_edges {
                if !set_f.intersects(&m) {
                    continue;
                }
                for (set_r, d2) in d_edges {
                    if !set_r.intersects(&m) {
                        continue;
                    }
                    if !r.states[*d2].live {
                        continue;
                    }
                    let key = (*q2, *d2);
                    let next_id = match index.get(&key) {
                        Some(&existing) => existing,
                        None => {
                            let id2 = states.len();
                            index.insert(key, id2);
                            states.push(key);
                            edges.push(Vec::new());
                            queue.push_back(id2);
                            id2
                        }
                    };
                    edges[id].push((m.clone(), next_id));
                }
            }
        }
    }

    let accept = states.iter().map(|&(q, _)| q == ordered.accept).collect();
    let spans = states.iter().map(|&(q, _)| ordered.spans[q as usize].clone()).collect();
    NfaWithLookAhead { states, start: 0, accept, edges, spans }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::{nfa, parser};

    fn build_la(src: &str) -> NfaWithLookAhead {
        let pattern = parser::parse(src, Flags::default()).unwrap();
        let enfa = nfa::build(&pattern.root).unwrap();
        let ordered = super::super::ordered::build(&enfa);
        build(&ordered)
    }

    #[test]
    fn start_state_is_always_live() {
        let la = build_la("a*b");
        assert_eq!(la.start, 0);
        assert!(la.state_count() >= 1);
    }

    #[test]
    fn simple_literal_reaches_accept() {
        let la = build_la("a");
        assert!(la.accept.iter().any(|&b| b));
    }

    #[test]
    fn nested_quantifier_product_stays_finite() {
        let la = build_la("(a+)+b");
        assert!(la.state_count() < 500);
    }
}
