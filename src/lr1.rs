//! Stepwise LR automaton driving over grmtools tables.
//!
//! grmtools' own runtime only parses whole inputs, so the interactive surface
//! (feed one terminal, query the acceptance set, copy/restore state) is built
//! directly on the `lrtable` action/goto tables. A state is just the LR state
//! stack; copying it is a deep clone with no aliasing into the live session.

use anyhow::{anyhow, Result};
use cfgrammar::yacc::{YaccGrammar, YaccKind, YaccOriginalActionKind};
use cfgrammar::TIdx;
use indexmap::{IndexMap, IndexSet};
use lrtable::{from_yacc, Action, Minimiser, StIdx, StateTable};

use crate::grammar::Grammar;
use crate::{Automaton, FeedOutcome};

/// Name under which end-of-input appears in acceptance sets.
pub const EOF_TERMINAL: &str = "$END";

/// Table family to build. Both resolve to grmtools' Pager-compressed LR(1)
/// construction, which answers the acceptance-set query identically; the kind
/// is kept for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatonKind {
    Lalr1,
    Lr1,
}

/// LR parse state: the state stack. The start state is always at the bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lr1State {
    stack: Vec<StIdx<u32>>,
}

pub struct Lr1Automaton {
    grm: YaccGrammar<u32>,
    stable: StateTable<u32>,
    start: StIdx<u32>,
    tokens: IndexMap<String, TIdx<u32>>,
    kind: AutomatonKind,
}

impl Lr1Automaton {
    pub fn from_grammar(grammar: &Grammar, kind: AutomatonKind) -> Result<Self> {
        Self::from_yacc(&grammar.productions, kind)
    }

    /// Build the automaton from Yacc-syntax productions (no actions).
    pub fn from_yacc(productions: &str, kind: AutomatonKind) -> Result<Self> {
        let grm =
            YaccGrammar::<u32>::new(YaccKind::Original(YaccOriginalActionKind::NoAction), productions)
                .map_err(|es| anyhow!("invalid grammar: {es:?}"))?;
        let (_, stable) =
            from_yacc(&grm, Minimiser::Pager).map_err(|e| anyhow!("table construction: {e:?}"))?;
        let start = stable.start_state();
        let mut tokens = IndexMap::new();
        for tidx in grm.iter_tidxs() {
            if tidx == grm.eof_token_idx() {
                tokens.insert(EOF_TERMINAL.to_string(), tidx);
            } else if let Some(name) = grm.token_name(tidx) {
                tokens.insert(name.to_string(), tidx);
            }
        }
        Ok(Lr1Automaton {
            grm,
            stable,
            start,
            tokens,
            kind,
        })
    }

    pub fn kind(&self) -> AutomatonKind {
        self.kind
    }

    /// Whether `name` is a terminal of the underlying grammar.
    pub fn knows_terminal(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    /// Apply reduces for lookahead `tidx` and then shift it. On failure the
    /// scratch stack is abandoned by the caller, so spurious LALR-style
    /// reduces never leak into committed state.
    fn drive(&self, stack: &mut Vec<StIdx<u32>>, tidx: TIdx<u32>) -> bool {
        loop {
            let top = *stack.last().expect("LR state stack is never empty");
            match self.stable.action(top, tidx) {
                Action::Shift(to) => {
                    stack.push(to);
                    return true;
                }
                Action::Accept => return true,
                Action::Error => return false,
                Action::Reduce(pidx) => {
                    let rhs_len = self.grm.prod(pidx).len();
                    let keep = stack.len().saturating_sub(rhs_len).max(1);
                    stack.truncate(keep);
                    let top = *stack.last().expect("LR state stack is never empty");
                    match self.stable.goto(top, self.grm.prod_to_rule(pidx)) {
                        Some(to) => stack.push(to),
                        None => return false,
                    }
                }
            }
        }
    }
}

impl Automaton for Lr1Automaton {
    type State = Lr1State;

    fn start_state(&self) -> Lr1State {
        Lr1State {
            stack: vec![self.start],
        }
    }

    fn feed(&self, state: &mut Lr1State, terminal: &str) -> FeedOutcome {
        let Some(&tidx) = self.tokens.get(terminal) else {
            return FeedOutcome::Halted;
        };
        let mut scratch = state.stack.clone();
        if self.drive(&mut scratch, tidx) {
            state.stack = scratch;
            FeedOutcome::Continue
        } else {
            FeedOutcome::Halted
        }
    }

    fn accepts(&self, state: &Lr1State) -> IndexSet<String> {
        let mut out = IndexSet::new();
        for (name, &tidx) in &self.tokens {
            let mut scratch = state.stack.clone();
            if self.drive(&mut scratch, tidx) {
                out.insert(name.clone());
            }
        }
        out
    }
}
