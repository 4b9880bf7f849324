//! ε-NFA construction (spec §4.3).
//!
//! A thin, arena-indexed graph: states are plain `u32` indices into a
//! `Vec<EnfaState>`, edges are either unlabeled (epsilon) or labeled with a
//! [`ClassSet`] of characters. Anchors compile to plain epsilon edges — their
//! semantics are instead enforced by [`crate::continuation`] as an AST-level
//! filter over candidate witnesses, which keeps this builder free of any
//! notion of "position in the string."

pub mod look_ahead;
pub mod ordered;

use crate::ast::{ClassSet, Node, Span};
use crate::error::Infeasibility;

pub type StateId = u32;

/// A single ε-NFA state: an ordered list of epsilon successors (order
/// matters — it encodes greedy-vs-lazy and alternation priority) and an
/// ordered list of character-labeled transitions.
///
/// `span` is the source span of the AST node this state was created for,
/// so [`crate::witness::hotspot`] can report which sub-expression an
/// ambiguity cycle came from.
#[derive(Debug, Clone, Default)]
pub struct EnfaState {
    pub eps: Vec<StateId>,
    pub trans: Vec<(ClassSet, StateId)>,
    pub span: Option<Span>,
}

/// An ε-NFA with a single start and single accept state.
#[derive(Debug, Clone)]
pub struct Enfa {
    pub states: Vec<EnfaState>,
    pub start: StateId,
    pub accept: StateId,
}

impl Enfa {
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

/// Builds an ε-NFA from `node`. Returns `Err` if `node` contains a
/// backreference or look-around, which the automaton path cannot express;
/// the feasibility gate (see [`crate::gate`]) is expected to have already
/// routed such patterns to the fuzz path, but this function re-checks so it
/// is safe to call directly.
pub fn build(node: &Node) -> Result<Enfa, Infeasibility> {
    let mut states = Vec::new();
    let (start, accept) = compile(node, &mut states)?;
    Ok(Enfa { states, start, accept })
}

fn new_state(states: &mut Vec<EnfaState>, span: Span) -> StateId {
    states.push(EnfaState { span: Some(span), ..EnfaState::default() });
    (states.len() - 1) as StateId
}

fn add_eps(states: &mut [EnfaState], from: StateId, to: StateId) {
    states[from as usize].eps.push(to);
}

type Frag = (StateId, StateId);

fn compile(node: &Node, states: &mut Vec<EnfaState>) -> Result<Frag, Infeasibility> {
    let span = node.span();
    match node {
        Node::Empty => {
            let a = new_state(states, span.clone());
            let b = new_state(states, span);
            add_eps(states, a, b);
            Ok((a, b))
        }
        Node::Literal { ch, .. } => {
            let a = new_state(states, span.clone());
            let b = new_state(states, span);
            states[a as usize].trans.push((ClassSet::single(*ch), b));
            Ok((a, b))
        }
        Node::Dot { dotall, .. } => {
            let a = new_state(states, span.clone());
            let b = new_state(states, span);
            let set = if *dotall {
                ClassSet::from_range('\0', char::MAX)
            } else {
                ClassSet::single('\n').negate()
            };
            states[a as usize].trans.push((set, b));
            Ok((a, b))
        }
        Node::Class { set, .. } => {
            let a = new_state(states, span.clone());
            let b = new_state(states, span);
            states[a as usize].trans.push((set.clone(), b));
            Ok((a, b))
        }
        Node::Anchor { .. } => {
            let a = new_state(states, span.clone());
            let b = new_state(states, span);
            add_eps(states, a, b);
            Ok((a, b))
        }
        Node::Backref { .. } => Err(Infeasibility::Backreference),
        Node::Lookaround { .. } => Err(Infeasibility::LookAround),
        Node::Group { node, .. } => compile(node, states),
        Node::Concat(nodes) => {
            let mut frags = Vec::with_capacity(nodes.len());
            for n in nodes {
                frags.push(compile(n, states)?);
            }
            Ok(chain(frags, span, states))
        }
        Node::Alt(branches) => {
            let in_state = new_state(states, span.clone());
            let out_state = new_state(states, span);
            for b in branches {
                let (b_in, b_out) = compile(b, states)?;
                add_eps(states, in_state, b_in);
                add_eps(states, b_out, out_state);
            }
            Ok((in_state, out_state))
        }
        Node::Repeat { node, min, max, greedy, .. } => compile_repeat(node, *min, *max, *greedy, span, states),
    }
}

fn chain(frags: Vec<Frag>, span: Span, states: &mut Vec<EnfaState>) -> Frag {
    if frags.is_empty() {
        let a = new_state(states, span.clone());
        let b = new_state(states, span);
        add_eps(states, a, b);
        return (a, b);
    }
    for w in frags.windows(2) {
        add_eps(states, w[0].1, w[1].0);
    }
    (frags.first().unwrap().0, frags.last().unwrap().1)
}

fn compile_star(node: &Node, greedy: bool, span: Span, states: &mut Vec<EnfaState>) -> Result<Frag, Infeasibility> {
    let in_state = new_state(states, span.clone());
    let out_state = new_state(states, span);
    let (b_in, b_out) = compile(node, states)?;
    if greedy {
        add_eps(states, in_state, b_in);
        add_eps(states, in_state, out_state);
    } else {
        add_eps(states, in_state, out_state);
        add_eps(states, in_state, b_in);
    }
    add_eps(states, b_out, in_state);
    Ok((in_state, out_state))
}

fn compile_plus(node: &Node, greedy: bool, span: Span, states: &mut Vec<EnfaState>) -> Result<Frag, Infeasibility> {
    let (b_in, b_out) = compile(node, states)?;
    let (s_in, s_out) = compile_star(node, greedy, span, states)?;
    add_eps(states, b_out, s_in);
    Ok((b_in, s_out))
}

/// A single optional copy of `node`, then `count - 1` more optional copies
/// nested after it: `(node(node(node)?)?)?`.
fn compile_optional_run(
    node: &Node,
    count: u32,
    greedy: bool,
    span: Span,
    states: &mut Vec<EnfaState>,
) -> Result<Frag, Infeasibility> {
    if count == 0 {
        let a = new_state(states, span.clone());
        let b = new_state(states, span);
        add_eps(states, a, b);
        return Ok((a, b));
    }
    let (b_in, b_out) = compile(node, states)?;
    let (inner_in, inner_out) = compile_optional_run(node, count - 1, greedy, span.clone(), states)?;
    add_eps(states, b_out, inner_in);
    let in_state = new_state(states, span.clone());
    let out_state = new_state(states, span);
    if greedy {
        add_eps(states, in_state, b_in);
        add_eps(states, in_state, out_state);
    } else {
        add_eps(states, in_state, out_state);
        add_eps(states, in_state, b_in);
    }
    add_eps(states, inner_out, out_state);
    Ok((in_state, out_state))
}

fn compile_repeat(
    node: &Node,
    min: u32,
    max: Option<u32>,
    greedy: bool,
    span: Span,
    states: &mut Vec<EnfaState>,
) -> Result<Frag, Infeasibility> {
    match max {
        None => {
            if min == 0 {
                compile_star(node, greedy, span, states)
            } else {
                let mut frags = Vec::new();
                for _ in 0..(min - 1) {
                    frags.push(compile(node, states)?);
                }
                frags.push(compile_plus(node, greedy, span.clone(), states)?);
                Ok(chain(frags, span, states))
            }
        }
        Some(max) => {
            let mut frags = Vec::new();
            for _ in 0..min {
                frags.push(compile(node, states)?);
            }
            if max > min {
                frags.push(compile_optional_run(node, max - min, greedy, span.clone(), states)?);
            }
            Ok(chain(frags, span, states))
        }
    }
}

/// Refines a list of (possibly overlapping) character sets into the
/// coarsest common set of pairwise-disjoint pieces ("minterms") such that
/// every input set is exactly a union of some subset of the result.
///
/// Used by subset construction ([`look_ahead`]) to pick representative
/// symbols without enumerating the full Unicode alphabet.
pub(crate) fn minterms(sets: &[ClassSet]) -> Vec<ClassSet> {
    let mut result: Vec<ClassSet> = Vec::new();
    for s in sets {
        if s.is_empty() {
            continue;
        }
        let mut next = Vec::with_capacity(result.len() + 1);
        let mut remaining = s.clone();
        for r in &result {
            let inter = r.intersection(&remaining);
            if !inter.is_empty() {
                remaining = remaining.difference(&inter);
                next.push(inter);
            }
            let only_r = r.difference(s);
            if !only_r.is_empty() {
                next.push(only_r);
            }
        }
        if !remaining.is_empty() {
            next.push(remaining);
        }
        result = next;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::parser;

    fn build_from(src: &str) -> Enfa {
        let pattern = parser::parse(src, Flags::default()).unwrap();
        build(&pattern.root).unwrap()
    }

    #[test]
    fn literal_has_two_states_and_one_transition() {
        let enfa = build_from("a");
        assert_eq!(enfa.state_count(), 2);
        assert_eq!(enfa.states[enfa.start as usize].trans.len(), 1);
    }

    #[test]
    fn star_loops_back_to_entry() {
        let enfa = build_from("a*");
        // entry state must have an eps back-edge reachable from the body's exit
        let body_trans_state = enfa
            .states
            .iter()
            .position(|s| !s.trans.is_empty())
            .expect("body state with char transition");
        let body_exit = enfa.states[body_trans_state].trans[0].1;
        assert!(enfa.states[body_exit as usize].eps.contains(&enfa.start));
    }

    #[test]
    fn backreference_is_infeasible() {
        let pattern = parser::parse(r"(a)\1", Flags::default()).unwrap();
        assert!(matches!(build(&pattern.root), Err(Infeasibility::Backreference)));
    }

    #[test]
    fn bounded_repeat_produces_finite_states() {
        let enfa = build_from("a{2,4}");
        // 2 mandatory + 3 optional copies => bounded, finite state growth
        assert!(enfa.state_count() < 40);
    }

    #[test]
    fn states_are_tagged_with_source_spans() {
        let enfa = build_from("ab");
        assert!(enfa.states.iter().all(|s| s.span.is_some()));
        // the two literal states' spans should point at 'a' and 'b' respectively
        let spans: Vec<Span> = enfa.states.iter().map(|s| s.span.clone().unwrap()).collect();
        assert!(spans.iter().any(|s| *s == (0..1)));
        assert!(spans.iter().any(|s| *s == (1..2)));
    }

    #[test]
    fn minterms_partitions_overlapping_ranges() {
        let a = ClassSet::from_range('a', 'm');
        let b = ClassSet::from_range('g', 'z');
        let parts = minterms(&[a.clone(), b.clone()]);
        let total: u32 = parts.iter().map(|p| p.ranges().iter().map(|r| r.len()).sum::<u32>()).sum();
        assert_eq!(total, a.union(&b).ranges().iter().map(|r| r.len()).sum::<u32>());
        for i in 0..parts.len() {
            for j in (i + 1)..parts.len() {
                assert!(!parts[i].intersects(&parts[j]));
            }
        }
    }
}
