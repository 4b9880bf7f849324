/*!
This crate detects Regular-Expression Denial-of-Service (ReDoS) vulnerabilities
in user-supplied regular expressions. Given a pattern and optional match flags,
it classifies the worst-case matching time of a typical backtracking engine as
one of `Safe` (linear), `Polynomial(k)` for `k >= 2`, or `Exponential`, and when
vulnerable, produces a structured witness: a `(prefix, pump, suffix)` triple
such that `prefix + pump^n + suffix` induces super-linear work.

# Design

The core is a **hybrid vulnerability analyzer**:

1. [`parser`] parses a pattern into a compact [`ast::Pattern`].
2. [`gate`] inspects the AST for backreferences, look-around, and size
   blow-ups, and picks either the automaton path or the fuzz path.
3. [`nfa`] builds a Thompson-style ε-NFA from the AST, reduces it to an
   [`nfa::ordered::OrderedNfa`], then augments it with a reverse-DFA
   look-ahead component ([`nfa::look_ahead::NfaWithLookAhead`]) that prunes
   transitions which cannot lead to acceptance.
4. [`scc`] partitions the look-ahead NFA into strongly connected components
   and tests each (and pairs of them) for EDA (exponential degree of
   ambiguity) or IDA (polynomial degree `k`).
5. [`witness`] turns ambiguity evidence, filtered through anchor/continuation
   exploitability checks, into an [`witness::AttackPattern`].
6. [`vm`] compiles the AST to a small step-counting bytecode interpreter,
   used by [`fuzz`] as a fallback when the automaton path is infeasible
   (backreferences, look-around, oversize NFA), and by [`recall`] to confirm
   automaton-derived witnesses empirically.

Everything is synchronous, single-threaded, and free of global mutable state:
see [`checker::check`] for the entry point that wires these stages together
into a [`diagnostics::Diagnostics`] value.

# Usage

```
use redos_sentinel::{check, Flags};

let diag = check(r"^(a+)+$", Flags::default(), Default::default());
assert!(diag.is_vulnerable());
```
*/
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod ast;
pub mod checker;
pub mod complexity;
pub mod config;
pub mod continuation;
pub mod diagnostics;
pub mod error;
pub mod flags;
pub mod fuzz;
pub mod gate;
pub mod nfa;
pub mod parser;
pub mod recall;
pub mod scc;
pub mod vm;
pub mod witness;

pub use checker::{check, is_safe, is_vulnerable};
pub use complexity::Complexity;
pub use config::Config;
pub use diagnostics::{Diagnostics, Status};
pub use error::ParseError;
pub use flags::Flags;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readme_example() {
        let diag = check(r"^(a+)+$", Flags::default(), Config::default());
        assert!(diag.is_vulnerable());
        assert!(diag.complexity.unwrap().is_exponential());
    }
}
