//! AST-level exploitability pre-pass (spec §4.4 "anchor and continuation
//! filtering").
//!
//! An NFA can have exponential ambiguity in isolation yet still be safe in
//! practice if every ambiguous path is forced through a right anchor that
//! only a specific suffix can satisfy, or if the ambiguous loop can only be
//! entered with a continuation that is itself unsatisfiable. Rather than
//! bake anchor semantics into the NFA transition relation, this module
//! answers those questions directly on the [`crate::ast::Node`] tree and
//! hands the answer to [`crate::witness`] as a filter over candidate
//! hotspots.

use crate::ast::{AnchorKind, Node};
use crate::config::MatchMode;

/// Conservative textual properties of a node, used to decide whether an
/// ambiguous sub-pattern is actually reachable from an attacker-controlled
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationInfo {
    /// This node can match the empty string.
    pub nullable: bool,
    /// This node always consumes at least one character on every path
    /// (the complement of a more precise "nullable" check across alternation
    /// branches; used to bound pump-loop minimum width).
    pub min_width: u32,
    /// This node ends in an unconditional text/line anchor that must match
    /// literally at the tail of the overall pattern.
    pub right_anchored: bool,
}

/// Walks `node` bottom-up, computing nullability, minimum match width, and
/// right-anchoring.
pub fn analyze(node: &Node) -> ContinuationInfo {
    match node {
        Node::Empty => ContinuationInfo { nullable: true, min_width: 0, right_anchored: false },
        Node::Literal { .. } | Node::Dot { .. } | Node::Class { .. } => {
            ContinuationInfo { nullable: false, min_width: 1, right_anchored: false }
        }
        Node::Anchor { kind, .. } => ContinuationInfo {
            nullable: true,
            min_width: 0,
            right_anchored: matches!(kind, AnchorKind::TextEnd | AnchorKind::LineEnd),
        },
        Node::Backref { .. } => {
            // Could match empty (if the group did), be conservative.
            ContinuationInfo { nullable: true, min_width: 0, right_anchored: false }
        }
        Node::Lookaround { negative, .. } => ContinuationInfo {
            nullable: true,
            min_width: 0,
            // A negative look-around can never itself be "the" anchor,
            // since its failure mode has no fixed shape.
            right_anchored: !*negative && false,
        },
        Node::Group { node, .. } => analyze(node),
        Node::Repeat { node, min, .. } => {
            let inner = analyze(node);
            ContinuationInfo {
                nullable: *min == 0 || inner.nullable,
                min_width: inner.min_width.saturating_mul(*min),
                // A repeated node is right-anchored only in the degenerate
                // case where it always runs exactly once.
                right_anchored: *min >= 1 && inner.right_anchored,
            }
        }
        Node::Concat(nodes) => {
            let mut nullable = true;
            let mut min_width = 0u32;
            let mut right_anchored = false;
            for (i, n) in nodes.iter().enumerate() {
                let info = analyze(n);
                min_width = min_width.saturating_add(info.min_width);
                if i == nodes.len() - 1 {
                    right_anchored = info.right_anchored;
                } else if !info.nullable {
                    // A non-nullable node before the end means nothing after
                    // it can be "the" right anchor unless every subsequent
                    // node is also consumed literally; conservatively require
                    // the final node to carry the anchor.
                }
                nullable = nullable && info.nullable;
            }
            ContinuationInfo { nullable, min_width, right_anchored }
        }
        Node::Alt(nodes) => {
            let mut nullable = false;
            let mut min_width = u32::MAX;
            let mut right_anchored = !nodes.is_empty();
            for n in nodes {
                let info = analyze(n);
                nullable = nullable || info.nullable;
                min_width = min_width.min(info.min_width);
                right_anchored = right_anchored && info.right_anchored;
            }
            if nodes.is_empty() {
                min_width = 0;
                nullable = true;
                right_anchored = false;
            }
            ContinuationInfo { nullable, min_width, right_anchored }
        }
    }
}

/// Decides whether an ambiguous region `info` describes is actually
/// reachable by a backtracking engine, under `match_mode` (spec §4.4).
///
/// `AUTO` is the disjunction the source uses: a right anchor forces the
/// engine to keep retrying on failure, and so does any continuation that
/// can't itself match empty. `PARTIAL` tightens this to a conjunction,
/// trading false negatives for fewer false positives. `FULL` treats every
/// match as if it must consume the whole input, so ambiguity is always
/// reachable.
pub fn is_exploitable(info: &ContinuationInfo, match_mode: MatchMode) -> bool {
    match match_mode {
        MatchMode::Auto => info.right_anchored || !info.nullable,
        MatchMode::Full => true,
        MatchMode::Partial => info.right_anchored && !info.nullable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn lit(c: char) -> Node {
        Node::Literal { ch: c, span: 0..1 }
    }

    #[test]
    fn plain_literal_has_width_one() {
        let info = analyze(&lit('a'));
        assert!(!info.nullable);
        assert_eq!(info.min_width, 1);
        assert!(!info.right_anchored);
    }

    #[test]
    fn trailing_text_end_anchor_is_right_anchored() {
        let span: Span = 0..1;
        let n = Node::Concat(vec![lit('a'), Node::Anchor { kind: AnchorKind::TextEnd, span }]);
        assert!(analyze(&n).right_anchored);
    }

    #[test]
    fn star_repeat_is_nullable() {
        let n = Node::Repeat { node: Box::new(lit('a')), min: 0, max: None, greedy: true, span: 0..2 };
        assert!(analyze(&n).nullable);
        assert_eq!(analyze(&n).min_width, 0);
    }

    #[test]
    fn auto_mode_exploitable_on_anchor_or_continuation() {
        let anchored = ContinuationInfo { nullable: true, min_width: 0, right_anchored: true };
        assert!(is_exploitable(&anchored, MatchMode::Auto));

        let forced = ContinuationInfo { nullable: false, min_width: 1, right_anchored: false };
        assert!(is_exploitable(&forced, MatchMode::Auto));

        let neither = ContinuationInfo { nullable: true, min_width: 0, right_anchored: false };
        assert!(!is_exploitable(&neither, MatchMode::Auto));
    }

    #[test]
    fn partial_mode_requires_both_anchor_and_continuation() {
        let only_anchor = ContinuationInfo { nullable: true, min_width: 0, right_anchored: true };
        assert!(!is_exploitable(&only_anchor, MatchMode::Partial));

        let both = ContinuationInfo { nullable: false, min_width: 1, right_anchored: true };
        assert!(is_exploitable(&both, MatchMode::Partial));
    }

    #[test]
    fn full_mode_is_always_exploitable() {
        let neither = ContinuationInfo { nullable: true, min_width: 0, right_anchored: false };
        assert!(is_exploitable(&neither, MatchMode::Full));
    }
}
