//! Strongly connected component analysis of a [`NfaWithLookAhead`]: the
//! source of both EDA (exponential degree of ambiguity) and IDA (polynomial
//! degree of ambiguity) evidence (spec §4.5).
//!
//! Tarjan's algorithm is implemented iteratively — an explicit stack of
//! work frames rather than recursion — since an attacker-controlled pattern
//! can produce automata deep enough that a recursive implementation would
//! risk overflowing the call stack on exactly the inputs this crate exists
//! to flag.

use std::collections::{HashMap, HashSet};

use crate::complexity::Complexity;
use crate::nfa::look_ahead::NfaWithLookAhead;

/// Evidence that a pattern's automaton exhibits super-linear ambiguity.
#[derive(Debug, Clone)]
pub struct AmbiguityWitness {
    pub complexity: Complexity,
    /// Look-ahead-NFA state ids that make up the ambiguous region.
    pub scc_states: Vec<usize>,
    /// A look-ahead-NFA state id inside the ambiguous region that is
    /// reachable from the automaton's start; [`crate::witness`] grows a
    /// prefix up to here.
    pub entry_state: usize,
    /// For EDA evidence: the pair of distinct states whose self-product
    /// cycle proves exponential ambiguity.
    pub branch_pair: Option<(usize, usize)>,
}

/// Computes the strongly connected components of a directed graph given as
/// an adjacency list, returning a component id per node. Iterative Tarjan.
pub fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Vec<usize> {
    let n = adjacency.len();
    const UNVISITED: usize = usize::MAX;
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut comp = vec![UNVISITED; n];
    let mut next_index = 0usize;
    let mut next_comp = 0usize;

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        // work frames: (node, next child index to examine)
        let mut work: Vec<(usize, usize)> = vec![(root, 0)];
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(&mut (v, ref mut ci)) = work.last_mut() {
            if *ci < adjacency[v].len() {
                let w = adjacency[v][*ci];
                *ci += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    work.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
            } else {
                work.pop();
                if let Some(&(parent, _)) = work.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
                if lowlink[v] == index[v] {
                    loop {
                        let w = stack.pop().unwrap();
                        on_stack[w] = false;
                        comp[w] = next_comp;
                        if w == v {
                            break;
                        }
                    }
                    next_comp += 1;
                }
            }
        }
    }

    comp
}

fn adjacency_from_la(la: &NfaWithLookAhead) -> Vec<Vec<usize>> {
    la.edges.iter().map(|edges| edges.iter().map(|(_, t)| *t).collect()).collect()
}

/// Tests whether the sub-automaton restricted to `members` exhibits
/// exponential ambiguity: a pair of distinct states `(p, q)` reachable from
/// one another such that both can simultaneously consume the same input and
/// return to `(p, q)` — the classic "cross product has a non-trivial cycle
/// off the diagonal" EDA test.
fn has_eda(la: &NfaWithLookAhead, members: &HashSet<usize>) -> Option<(usize, usize)> {
    let members_vec: Vec<usize> = members.iter().copied().collect();
    let n = members_vec.len();
    if n == 0 {
        return None;
    }
    let pos: HashMap<usize, usize> = members_vec.iter().enumerate().map(|(i, &s)| (s, i)).collect();

    // product node id = p_idx * n + q_idx
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n * n];
    for (pi, &p) in members_vec.iter().enumerate() {
        for (qi, &q) in members_vec.iter().enumerate() {
            for (set_p, p2) in &la.edges[p] {
                if !members.contains(p2) {
                    continue;
                }
                for (set_q, q2) in &la.edges[q] {
                    if !members.contains(q2) || !set_p.intersects(set_q) {
                        continue;
                    }
                    let p2i = pos[p2];
                    let q2i = pos[q2];
                    adjacency[pi * n + qi].push(p2i * n + q2i);
                }
            }
        }
    }

    let comp = strongly_connected_components(&adjacency);
    let mut comp_sizes: HashMap<usize, usize> = HashMap::new();
    for &c in &comp {
        *comp_sizes.entry(c).or_insert(0) += 1;
    }

    for (pi, &p) in members_vec.iter().enumerate() {
        for (qi, &q) in members_vec.iter().enumerate() {
            if p == q {
                continue;
            }
            let node = pi * n + qi;
            let self_loop = adjacency[node].contains(&node);
            let in_nontrivial_scc = comp_sizes.get(&comp[node]).copied().unwrap_or(0) > 1;
            if self_loop || in_nontrivial_scc {
                return Some((p, q));
            }
        }
    }
    None
}

/// Runs the full EDA/IDA analysis over `la`. Returns `None` if the pattern
/// is safe (at most linear).
pub fn analyze(la: &NfaWithLookAhead) -> Option<AmbiguityWitness> {
    let adjacency = adjacency_from_la(la);
    let comp = strongly_connected_components(&adjacency);
    let comp_count = comp.iter().copied().max().map(|m| m + 1).unwrap_or(0);

    let mut members_by_comp: Vec<HashSet<usize>> = vec![HashSet::new(); comp_count];
    for (state, &c) in comp.iter().enumerate() {
        members_by_comp[c].insert(state);
    }

    let is_nontrivial = |c: usize| -> bool {
        let members = &members_by_comp[c];
        if members.len() > 1 {
            return true;
        }
        if let Some(&only) = members.iter().next() {
            return adjacency[only].contains(&only);
        }
        false
    };

    // EDA takes precedence over IDA (spec §4.5).
    for c in 0..comp_count {
        if !is_nontrivial(c) {
            continue;
        }
        if let Some(pair) = has_eda(la, &members_by_comp[c]) {
            let entry_state = *members_by_comp[c].iter().min().unwrap();
            return Some(AmbiguityWitness {
                complexity: Complexity::Exponential,
                scc_states: members_by_comp[c].iter().copied().collect(),
                entry_state,
                branch_pair: Some(pair),
            });
        }
    }

    // IDA: count the longest chain of distinct nontrivial SCCs reachable
    // from one another along the condensation DAG. Each such SCC is an
    // unbounded loop whose boundary a backtracking matcher must
    // re-negotiate against every loop chained after it, contributing one
    // degree of polynomial blowup (`.*a.*a.*` chains two, giving degree 2).
    let mut condensation_edges: Vec<HashSet<usize>> = vec![HashSet::new(); comp_count];
    for (state, edges) in la.edges.iter().enumerate() {
        let from = comp[state];
        for (_, target) in edges {
            let to = comp[*target];
            if from != to {
                condensation_edges[from].insert(to);
            }
        }
    }

    let mut in_degree = vec![0usize; comp_count];
    for edges in &condensation_edges {
        for &to in edges {
            in_degree[to] += 1;
        }
    }
    let mut queue: Vec<usize> = (0..comp_count).filter(|&c| in_degree[c] == 0).collect();
    let mut topo = Vec::with_capacity(comp_count);
    let mut in_degree_mut = in_degree.clone();
    while let Some(c) = queue.pop() {
        topo.push(c);
        for &to in &condensation_edges[c] {
            in_degree_mut[to] -= 1;
            if in_degree_mut[to] == 0 {
                queue.push(to);
            }
        }
    }

    let mut best_chain = vec![1usize; comp_count];
    let mut best_source = vec![usize::MAX; comp_count];
    for &c in &topo {
        let own = if is_nontrivial(c) { 1 } else { 0 };
        best_chain[c] = own.max(1);
        for &to in &condensation_edges[c] {
            let candidate = best_chain[c] + if is_nontrivial(to) { 1 } else { 0 };
            if own > 0 && candidate > best_chain[to] {
                best_chain[to] = candidate;
                best_source[to] = c;
            }
        }
    }

    let _ = best_source;
    let (best_comp, degree) = (0..comp_count)
        .map(|c| (c, best_chain[c]))
        .max_by_key(|&(_, d)| d)
        .unwrap_or((0, 0));

    if degree >= 2 {
        let entry_state = *members_by_comp[best_comp].iter().min().unwrap();
        Some(AmbiguityWitness {
            complexity: Complexity::Polynomial(degree as u32),
            scc_states: members_by_comp[best_comp].iter().copied().collect(),
            entry_state,
            branch_pair: None,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::{nfa, parser};

    fn analyze_src(src: &str) -> Option<AmbiguityWitness> {
        let pattern = parser::parse(src, Flags::default()).unwrap();
        let enfa = nfa::build(&pattern.root).unwrap();
        let ordered = nfa::ordered::build(&enfa);
        let la = nfa::look_ahead::build(&ordered);
        analyze(&la)
    }

    #[test]
    fn plain_literal_is_safe() {
        assert!(analyze_src("abc").is_none());
    }

    #[test]
    fn single_star_is_safe() {
        assert!(analyze_src("a*").is_none());
    }

    #[test]
    fn nested_quantifier_is_exponential() {
        let w = analyze_src("(a+)+").expect("expected ambiguity");
        assert_eq!(w.complexity, Complexity::Exponential);
    }

    #[test]
    fn chained_dot_stars_are_polynomial_degree_two() {
        let w = analyze_src(".*a.*a.*").expect("expected ambiguity");
        assert_eq!(w.complexity, Complexity::Polynomial(2));
    }

    #[test]
    fn chained_dot_stars_three_times_is_polynomial_degree_three() {
        let w = analyze_src(".*a.*a.*a.*").expect("expected ambiguity");
        assert_eq!(w.complexity, Complexity::Polynomial(3));
    }
}
