//! AST → bytecode compiler.

use crate::ast::{BackrefTarget, Node, Pattern};

use super::{Inst, Program};

/// Compiles `pattern` into a [`Program`]. Unlike [`crate::nfa::build`], this
/// never fails — backreferences and look-around, which the automaton path
/// cannot express, are exactly what this VM exists to execute.
pub fn compile(pattern: &Pattern) -> Program {
    let mut main = Vec::new();
    let mut subs = Vec::new();
    main.push(Inst::Save(0));
    compile_node(&pattern.root, &mut main, &mut subs, &pattern.group_names);
    main.push(Inst::Save(1));
    main.push(Inst::Match);
    Program {
        main,
        subs,
        multiline: pattern.flags.contains(crate::flags::Flags::MULTILINE),
        save_slots: 2 * (pattern.group_count as usize + 1),
    }
}

fn resolve_backref(target: &BackrefTarget, group_names: &std::collections::HashMap<String, u32>) -> u32 {
    match target {
        BackrefTarget::Index(i) => *i,
        BackrefTarget::Name(name) => *group_names.get(name).expect("parser guarantees defined name"),
    }
}

fn compile_node(
    node: &Node,
    out: &mut Vec<Inst>,
    subs: &mut Vec<Vec<Inst>>,
    group_names: &std::collections::HashMap<String, u32>,
) {
    match node {
        Node::Empty => {}
        Node::Literal { ch, .. } => out.push(Inst::Char(*ch)),
        Node::Dot { dotall, .. } => {
            if *dotall {
                out.push(Inst::Any);
            } else {
                out.push(Inst::Class(crate::ast::ClassSet::single('\n').negate()));
            }
        }
        Node::Class { set, .. } => out.push(Inst::Class(set.clone())),
        Node::Anchor { kind, .. } => out.push(Inst::CheckAnchor(*kind)),
        Node::Backref { target, .. } => out.push(Inst::Backref(resolve_backref(target, group_names))),
        Node::Group { node, capture, .. } => {
            if let Some(idx) = capture {
                out.push(Inst::Save(2 * (*idx as usize)));
                compile_node(node, out, subs, group_names);
                out.push(Inst::Save(2 * (*idx as usize) + 1));
            } else {
                compile_node(node, out, subs, group_names);
            }
        }
        Node::Concat(nodes) => {
            for n in nodes {
                compile_node(n, out, subs, group_names);
            }
        }
        Node::Alt(branches) => compile_alt(branches, out, subs, group_names),
        Node::Repeat { node, min, max, greedy, .. } => compile_repeat(node, *min, *max, *greedy, out, subs, group_names),
        Node::Lookaround { direction, negative, node, .. } => {
            let mut sub = Vec::new();
            compile_node(node, &mut sub, subs, group_names);
            sub.push(Inst::Match);
            let idx = subs.len();
            subs.push(sub);
            out.push(Inst::LookAround { program: idx, negative: *negative, direction: *direction });
        }
    }
}

fn compile_alt(
    branches: &[Node],
    out: &mut Vec<Inst>,
    subs: &mut Vec<Vec<Inst>>,
    group_names: &std::collections::HashMap<String, u32>,
) {
    if branches.is_empty() {
        return;
    }
    if branches.len() == 1 {
        compile_node(&branches[0], out, subs, group_names);
        return;
    }
    let split_pos = out.len();
    out.push(Inst::Split(0, 0)); // patched below
    compile_node(&branches[0], out, subs, group_names);
    let jmp_pos = out.len();
    out.push(Inst::Jmp(0)); // patched below
    let second_branch_start = out.len();
    compile_alt(&branches[1..], out, subs, group_names);
    let end = out.len();
    out[split_pos] = Inst::Split(split_pos + 1, second_branch_start);
    out[jmp_pos] = Inst::Jmp(end);
}

fn compile_repeat(
    node: &Node,
    min: u32,
    max: Option<u32>,
    greedy: bool,
    out: &mut Vec<Inst>,
    subs: &mut Vec<Vec<Inst>>,
    group_names: &std::collections::HashMap<String, u32>,
) {
    for _ in 0..min {
        compile_node(node, out, subs, group_names);
    }
    match max {
        None => compile_star(node, greedy, out, subs, group_names),
        Some(max) => {
            for _ in 0..(max.saturating_sub(min)) {
                compile_optional(node, greedy, out, subs, group_names);
            }
        }
    }
}

fn compile_star(
    node: &Node,
    greedy: bool,
    out: &mut Vec<Inst>,
    subs: &mut Vec<Vec<Inst>>,
    group_names: &std::collections::HashMap<String, u32>,
) {
    let split_pos = out.len();
    out.push(Inst::Split(0, 0));
    let body_start = out.len();
    compile_node(node, out, subs, group_names);
    out.push(Inst::Jmp(split_pos));
    let end = out.len();
    out[split_pos] =
        if greedy { Inst::Split(body_start, end) } else { Inst::Split(end, body_start) };
}

fn compile_optional(
    node: &Node,
    greedy: bool,
    out: &mut Vec<Inst>,
    subs: &mut Vec<Vec<Inst>>,
    group_names: &std::collections::HashMap<String, u32>,
) {
    let split_pos = out.len();
    out.push(Inst::Split(0, 0));
    let body_start = out.len();
    compile_node(node, out, subs, group_names);
    let end = out.len();
    out[split_pos] =
        if greedy { Inst::Split(body_start, end) } else { Inst::Split(end, body_start) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::parser;

    #[test]
    fn compiles_literal_to_char_then_match() {
        let pattern = parser::parse("a", Flags::default()).unwrap();
        let prog = compile(&pattern);
        assert!(matches!(prog.main[0], Inst::Save(0)));
        assert!(prog.main.iter().any(|i| matches!(i, Inst::Char('a'))));
        assert!(matches!(prog.main.last(), Some(Inst::Match)));
    }

    #[test]
    fn compiles_lookaround_into_subprogram() {
        let pattern = parser::parse("(?=a)b", Flags::default()).unwrap();
        let prog = compile(&pattern);
        assert_eq!(prog.subs.len(), 1);
        assert!(prog.main.iter().any(|i| matches!(i, Inst::LookAround { .. })));
    }

    #[test]
    fn compiles_backreference() {
        let pattern = parser::parse(r"(a)\1", Flags::default()).unwrap();
        let prog = compile(&pattern);
        assert!(prog.main.iter().any(|i| matches!(i, Inst::Backref(1))));
    }
}
