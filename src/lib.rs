//! Incremental, indentation-aware acceptance-set computation for LR grammars.
//!
//! Given a growing prefix of source text, an [`Acceptor`] reports which
//! terminal kinds may legally appear next together with the lexeme currently
//! being typed, doing work proportional to the text added since the previous
//! call. This is the query loop behind grammar-constrained generation.

mod grammar;
mod incremental;
mod lex;
mod lr1;
mod re;
mod utils;

pub use grammar::{Grammar, IndentationConfig, TerminalDef, TerminalPattern};
pub use incremental::{Acceptance, Acceptor};
pub use indexmap::IndexSet;
pub use lex::{Lexer, Token, TokenStream};
pub use lr1::{AutomatonKind, Lr1Automaton, Lr1State, EOF_TERMINAL};
pub use re::TerminalMatcher;

/// An [`Acceptor`] over grmtools-built LR tables.
pub type Lr1Acceptor = Acceptor<Lr1Automaton>;

/// Outcome of feeding one terminal. A halt is the expected steady state for
/// any partial program, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    Continue,
    Halted,
}

/// The interactive-session capability the driver needs from an automaton:
/// stepwise feeding, acceptance-set introspection and state copy/restore.
/// State is passed explicitly; implementations hold only immutable tables.
pub trait Automaton {
    type State: Clone;

    fn start_state(&self) -> Self::State;

    /// Deep copy; the result must not alias mutable internals of `state`.
    fn copy_state(&self, state: &Self::State) -> Self::State {
        state.clone()
    }

    /// Feed one terminal by name. On [`FeedOutcome::Halted`] the state must
    /// be left exactly as it was.
    fn feed(&self, state: &mut Self::State, terminal: &str) -> FeedOutcome;

    /// Terminal names acceptable as the next token in `state`.
    fn accepts(&self, state: &Self::State) -> IndexSet<String>;
}
