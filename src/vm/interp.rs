//! Step-counting backtracking interpreter.

use crate::ast::{AnchorKind, LookDirection};

use super::{Inst, MatchResult, Program};

/// Runs `program` against `input`, counting one step per instruction
/// dispatch and per character comparison, aborting once `budget` is
/// exceeded.
pub fn run(program: &Program, input: &str, budget: u64) -> MatchResult {
    let chars: Vec<char> = input.chars().collect();
    let mut steps = 0u64;
    let mut saves = vec![None; program.save_slots];
    let end = backtrack(&program.main, &program.subs, &chars, 0, 0, &mut saves, &mut steps, budget, program.multiline);
    match end {
        Outcome::Matched(_) => MatchResult { matched: true, steps, exhausted: false },
        Outcome::Failed => MatchResult { matched: false, steps, exhausted: false },
        Outcome::BudgetExceeded => MatchResult { matched: false, steps, exhausted: true },
    }
}

enum Outcome {
    Matched(usize),
    Failed,
    BudgetExceeded,
}

impl Outcome {
    fn end_pos(&self) -> Option<usize> {
        match self {
            Outcome::Matched(p) => Some(*p),
            _ => None,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn backtrack(
    prog: &[Inst],
    subs: &[Vec<Inst>],
    input: &[char],
    mut pc: usize,
    mut pos: usize,
    saves: &mut Vec<Option<usize>>,
    steps: &mut u64,
    budget: u64,
    multiline: bool,
) -> Outcome {
    loop {
        *steps += 1;
        if *steps > budget {
            return Outcome::BudgetExceeded;
        }
        match &prog[pc] {
            Inst::Match => return Outcome::Matched(pos),
            Inst::Char(c) => {
                if pos < input.len() && input[pos] == *c {
                    pos += 1;
                    pc += 1;
                } else {
                    return Outcome::Failed;
                }
            }
            Inst::Any => {
                if pos < input.len() {
                    pos += 1;
                    pc += 1;
                } else {
                    return Outcome::Failed;
                }
            }
            Inst::Class(set) => {
                if pos < input.len() && set.contains(input[pos]) {
                    pos += 1;
                    pc += 1;
                } else {
                    return Outcome::Failed;
                }
            }
            Inst::Jmp(t) => pc = *t,
            Inst::Split(t1, t2) => {
                let saved = saves.clone();
                let first = backtrack(prog, subs, input, *t1, pos, saves, steps, budget, multiline);
                match first {
                    Outcome::Matched(p) => return Outcome::Matched(p),
                    Outcome::BudgetExceeded => return Outcome::BudgetExceeded,
                    Outcome::Failed => {
                        *saves = saved;
                        pc = *t2;
                    }
                }
            }
            Inst::Save(slot) => {
                if *slot < saves.len() {
                    saves[*slot] = Some(pos);
                }
                pc += 1;
            }
            Inst::Backref(idx) => {
                let lo = saves.get(*idx as usize * 2).copied().flatten();
                let hi = saves.get(*idx as usize * 2 + 1).copied().flatten();
                match (lo, hi) {
                    (Some(lo), Some(hi)) if hi >= lo => {
                        let len = hi - lo;
                        if pos + len <= input.len() && input[pos..pos + len] == input[lo..hi] {
                            pos += len;
                            pc += 1;
                        } else {
                            return Outcome::Failed;
                        }
                    }
                    _ => pc += 1,
                }
            }
            Inst::CheckAnchor(kind) => {
                if check_anchor(*kind, input, pos, multiline) {
                    pc += 1;
                } else {
                    return Outcome::Failed;
                }
            }
            Inst::LookAround { program, negative, direction } => {
                let sub = &subs[*program];
                let ok = match direction {
                    LookDirection::Ahead => {
                        let mut sub_saves = saves.clone();
                        matches!(
                            backtrack(sub, subs, input, 0, pos, &mut sub_saves, steps, budget, multiline),
                            Outcome::Matched(_)
                        )
                    }
                    LookDirection::Behind => {
                        let mut found = false;
                        for start in (0..=pos).rev() {
                            let mut sub_saves = saves.clone();
                            let outcome = backtrack(sub, subs, input, 0, start, &mut sub_saves, steps, budget, multiline);
                            if let Outcome::BudgetExceeded = outcome {
                                return Outcome::BudgetExceeded;
                            }
                            if outcome.end_pos() == Some(pos) {
                                found = true;
                                break;
                            }
                        }
                        found
                    }
                };
                if ok != *negative {
                    pc += 1;
                } else {
                    return Outcome::Failed;
                }
            }
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn check_anchor(kind: AnchorKind, input: &[char], pos: usize, _multiline: bool) -> bool {
    match kind {
        AnchorKind::TextStart => pos == 0,
        AnchorKind::TextEnd => pos == input.len(),
        AnchorKind::LineStart => pos == 0 || input[pos - 1] == '\n',
        AnchorKind::LineEnd => pos == input.len() || input[pos] == '\n',
        AnchorKind::WordBoundary | AnchorKind::NonWordBoundary => {
            let before = pos > 0 && is_word_char(input[pos - 1]);
            let after = pos < input.len() && is_word_char(input[pos]);
            let boundary = before != after;
            if kind == AnchorKind::WordBoundary {
                boundary
            } else {
                !boundary
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::vm::compiler;
    use crate::parser;

    fn run_src(src: &str, flags: Flags, input: &str) -> MatchResult {
        let pattern = parser::parse(src, flags).unwrap();
        let prog = compiler::compile(&pattern);
        run(&prog, input, 1_000_000)
    }

    #[test]
    fn matches_simple_literal() {
        assert!(run_src("abc", Flags::default(), "abc").matched);
        assert!(!run_src("abc", Flags::default(), "abd").matched);
    }

    #[test]
    fn greedy_star_consumes_maximally_then_backtracks() {
        assert!(run_src("a*a", Flags::default(), "aaaa").matched);
    }

    #[test]
    fn backreference_requires_equal_text() {
        assert!(run_src(r"(a+)\1", Flags::default(), "aaaa").matched);
        assert!(!run_src(r"(a+)\1", Flags::default(), "aaa").matched);
    }

    #[test]
    fn positive_lookahead_does_not_consume() {
        assert!(run_src("(?=ab)a", Flags::default(), "ab").matched);
        assert!(!run_src("(?=ab)a", Flags::default(), "ac").matched);
    }

    #[test]
    fn negative_lookbehind_blocks_match() {
        assert!(!run_src(r"(?<!x)a", Flags::default(), "xa").matched);
        assert!(run_src(r"(?<!x)a", Flags::default(), "ya").matched);
    }

    #[test]
    fn budget_exhaustion_reports_exhausted() {
        let result = run_src("(a*)*b", Flags::default(), &"a".repeat(30));
        if !result.matched {
            // with a tiny budget this pattern must report exhaustion, not a clean failure
            let pattern = parser::parse("(a*)*b", Flags::default()).unwrap();
            let prog = compiler::compile(&pattern);
            let tiny = run(&prog, &"a".repeat(30), 100);
            assert!(tiny.exhausted);
        }
    }
}
