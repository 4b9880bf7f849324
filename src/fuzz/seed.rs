//! Structural seeding: turns repetition nodes in the AST into initial
//! pump-string candidates, the way a human triaging a suspicious pattern
//! would look for nested or chained quantifiers first.

use rand::SeedableRng;

use crate::ast::Node;
use crate::config::{Config, SeederMode};
use crate::witness::AttackPattern;

/// Finds every [`Node::Repeat`] in `root` and proposes a one-character pump
/// built from a character that node's body can consume, bounding the
/// corpus size at `config.max_fuzz_iterations` candidates.
///
/// Under `SeederMode::Dynamic`, one extra candidate is appended: the first
/// structural seed mutated once under `config.fuzz_seed`, giving the fuzz
/// loop a second, still fully deterministic, starting point to diverge
/// from.
pub fn seed_corpus(root: &Node, config: &Config) -> Vec<AttackPattern> {
    let mut reps = Vec::new();
    collect_repeats(root, &mut reps);
    reps.truncate(config.max_fuzz_iterations.max(1) as usize);

    let mut corpus: Vec<AttackPattern> = reps
        .into_iter()
        .filter_map(|node| {
            representative_char(node).map(|c| AttackPattern {
                prefix: String::new(),
                pump: c.to_string(),
                suffix: String::new(),
                base: 0,
                repeat: config.attack_limit,
            })
        })
        .collect();

    if config.seeder == SeederMode::Dynamic {
        if let Some(first) = corpus.first().cloned() {
            let mut rng = rand::rngs::StdRng::seed_from_u64(config.fuzz_seed);
            corpus.push(super::mutate::mutate(&first, &mut rng, config.acceleration));
        }
    }

    corpus
}

fn collect_repeats<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    if matches!(node, Node::Repeat { .. }) {
        out.push(node);
    }
    match node {
        Node::Repeat { node, .. } | Node::Group { node, .. } | Node::Lookaround { node, .. } => {
            collect_repeats(node, out)
        }
        Node::Concat(nodes) | Node::Alt(nodes) => {
            for n in nodes {
                collect_repeats(n, out);
            }
        }
        _ => {}
    }
}

/// A character this node can consume, used as a pump unit.
fn representative_char(node: &Node) -> Option<char> {
    match node {
        Node::Literal { ch, .. } => Some(*ch),
        Node::Class { set, .. } => set.min_char(),
        Node::Dot { .. } => Some('a'),
        Node::Repeat { node, .. } | Node::Group { node, .. } => representative_char(node),
        Node::Concat(nodes) | Node::Alt(nodes) => nodes.iter().find_map(representative_char),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::parser;

    #[test]
    fn seeds_one_candidate_per_repeat() {
        let pattern = parser::parse(r"(a+)\1", Flags::default()).unwrap();
        let corpus = seed_corpus(&pattern.root, &Config::default());
        assert!(!corpus.is_empty());
        assert_eq!(corpus[0].pump, "a");
    }

    #[test]
    fn dynamic_seeder_appends_one_mutated_candidate() {
        let pattern = parser::parse(r"(a+)\1", Flags::default()).unwrap();
        let static_config = Config::default();
        let dynamic_config = Config::builder().seeder(SeederMode::Dynamic).build();
        let static_corpus = seed_corpus(&pattern.root, &static_config);
        let dynamic_corpus = seed_corpus(&pattern.root, &dynamic_config);
        assert_eq!(dynamic_corpus.len(), static_corpus.len() + 1);
    }
}
