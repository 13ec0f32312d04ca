//! The incremental driver: re-lex, diff, restore, feed, post-process.
//!
//! A session owns everything that persists between calls: live automaton
//! state, indentation depth, the pending-dedent queue, the checkpoint store
//! and the last-seen token sequence. Each call re-lexes the full text, diffs
//! the token run against the previous call, restores the nearest surviving
//! checkpoint and feeds only the tokens after it, so the work done is
//! proportional to the new text rather than the total length.
//!
//! Automaton rejection is the normal terminal state for a partial program:
//! feeding simply stops and the state reached so far is the result.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexSet;

use crate::grammar::{Grammar, IndentationConfig};
use crate::lex::{Lexer, Token};
use crate::lr1::{AutomatonKind, Lr1Automaton};
use crate::re::TerminalMatcher;
use crate::utils::{common_prefix_len, trailing_tabs};
use crate::{Automaton, FeedOutcome};

/// Result of one [`Acceptor::compute_acceptance`] call.
///
/// `current` is the acceptance set as of the token before the most recently
/// fed one; `next` is the forward-looking set, `None` while a lexeme is still
/// in progress; `partial_lexeme` is the in-progress lexeme text, or the text
/// of the just-completed lexeme when the input ends on a token boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptance {
    pub current: IndexSet<String>,
    pub next: Option<IndexSet<String>>,
    pub partial_lexeme: String,
}

/// Snapshot taken after feeding the token at some position, with all dedents
/// due at or before it already flushed (the dedent queue is empty at every
/// checkpoint by construction).
struct Checkpoint<S> {
    /// The token this snapshot was recorded for; restoration verifies it
    /// still matches the token now at the same index.
    token: Token,
    state: S,
    depth: usize,
    /// Raw acceptance set after this token (frozen).
    accepts: Arc<IndexSet<String>>,
    /// Raw acceptance set one token earlier, to restore both generations.
    prev_accepts: Arc<IndexSet<String>>,
}

struct Session<S> {
    state: S,
    depth: usize,
    dedents: VecDeque<Token>,
    checkpoints: BTreeMap<usize, Checkpoint<S>>,
    current: Arc<IndexSet<String>>,
    next: Arc<IndexSet<String>>,
    last_fed: Option<Token>,
    prev_tokens: Vec<Token>,
}

/// Incremental acceptance-set computation over an interactive automaton.
///
/// One instance serves one generation stream; calls mutate shared session
/// state, and the matcher caches make the type `!Sync` on purpose.
pub struct Acceptor<A: Automaton> {
    automaton: A,
    lexer: Lexer,
    matcher: TerminalMatcher,
    indent: IndentationConfig,
    session: Session<A::State>,
}

impl Acceptor<Lr1Automaton> {
    pub fn new(grammar: &Grammar, kind: AutomatonKind) -> Result<Self> {
        let automaton = Lr1Automaton::from_grammar(grammar, kind)?;
        Self::with_automaton(automaton, grammar)
    }
}

impl<A: Automaton> Acceptor<A> {
    pub fn with_automaton(automaton: A, grammar: &Grammar) -> Result<Self> {
        grammar.validate()?;
        let lexer = Lexer::new(grammar)?;
        let matcher = TerminalMatcher::new(grammar)?;
        let state = automaton.start_state();
        let initial = Arc::new(automaton.accepts(&state));
        Ok(Acceptor {
            automaton,
            lexer,
            matcher,
            indent: grammar.indentation.clone(),
            session: Session {
                state,
                depth: 0,
                dedents: VecDeque::new(),
                checkpoints: BTreeMap::new(),
                current: Arc::clone(&initial),
                next: initial,
                last_fed: None,
                prev_tokens: Vec::new(),
            },
        })
    }

    pub fn automaton(&self) -> &A {
        &self.automaton
    }

    /// See [`TerminalMatcher::match_exact`].
    pub fn match_exact(&self, s: &str) -> Option<&str> {
        self.matcher.match_exact(s)
    }

    /// See [`TerminalMatcher::prefix_match`].
    pub fn prefix_match(&self, accumulated: &str, addition: &str) -> Option<&str> {
        self.matcher.prefix_match(accumulated, addition)
    }

    /// Compute the acceptance sets for (a prefix of a program given as) the
    /// full text seen so far. Supplying text that diverges from the previous
    /// call earlier than its end is a rewind, handled by the same diff and
    /// restore path; it is never an error.
    pub fn compute_acceptance(&mut self, text: &str) -> Acceptance {
        let lexed = self.lexer.lex(text);
        let diverge = common_prefix_len(&self.session.prev_tokens, &lexed.tokens);
        // Positions at and after the divergence point no longer describe the
        // current stream; drop them before anything can read them.
        self.session.checkpoints.split_off(&diverge);
        let resume = self.restore(diverge, &lexed.tokens);
        self.feed_from(resume, &lexed.tokens);
        self.session.prev_tokens = lexed.tokens;

        let complete = lexed.cursor >= text.len();
        let (partial_lexeme, next) = if complete {
            let lexeme = self
                .session
                .last_fed
                .as_ref()
                .map(|t| t.text.clone())
                .unwrap_or_default();
            (lexeme, Some(self.next_acceptance()))
        } else {
            // The tail from the last confirmed boundary is still being typed;
            // no forward-looking set until it completes.
            (text[lexed.cursor..].to_string(), None)
        };
        Acceptance {
            current: (*self.session.current).clone(),
            next,
            partial_lexeme,
        }
    }

    /// Restore the nearest checkpoint strictly before `diverge` whose
    /// recorded token still matches the current stream, and return the
    /// position to resume feeding from. Falls back to a full reset.
    fn restore(&mut self, diverge: usize, tokens: &[Token]) -> usize {
        let mut upper = diverge;
        loop {
            let Some(pos) = self
                .session
                .checkpoints
                .range(..upper)
                .next_back()
                .map(|(&pos, _)| pos)
            else {
                self.reset_session();
                return 0;
            };
            if self.session.checkpoints[&pos].token != tokens[pos] {
                // Stale snapshot for a token that is no longer there.
                self.session.checkpoints.split_off(&pos);
                upper = pos;
                continue;
            }
            let checkpoint = &self.session.checkpoints[&pos];
            self.session.state = self.automaton.copy_state(&checkpoint.state);
            self.session.depth = checkpoint.depth;
            self.session.current = Arc::clone(&checkpoint.prev_accepts);
            self.session.next = Arc::clone(&checkpoint.accepts);
            self.session.last_fed = Some(checkpoint.token.clone());
            self.session.dedents.clear();
            return pos + 1;
        }
    }

    fn reset_session(&mut self) {
        let state = self.automaton.start_state();
        let initial = Arc::new(self.automaton.accepts(&state));
        let session = &mut self.session;
        session.state = state;
        session.depth = 0;
        session.dedents.clear();
        session.checkpoints.clear();
        session.current = Arc::clone(&initial);
        session.next = initial;
        session.last_fed = None;
    }

    fn feed_from(&mut self, from: usize, tokens: &[Token]) {
        for (pos, token) in tokens.iter().enumerate().skip(from) {
            if token.kind == self.indent.dedent {
                // Defer: dedents are only committed once something follows
                // on a shallower line.
                self.session.dedents.push_back(token.clone());
                continue;
            }
            if token.kind == self.indent.indent {
                self.session.depth += 1;
            }
            if !self.flush_dedents() {
                return;
            }
            match self.automaton.feed(&mut self.session.state, &token.kind) {
                FeedOutcome::Halted => return,
                FeedOutcome::Continue => self.record(pos, token),
            }
        }
    }

    /// Feed every queued dedent in order. No checkpoints are recorded for
    /// them; the next real token's checkpoint captures the flushed state.
    fn flush_dedents(&mut self) -> bool {
        while let Some(dedent) = self.session.dedents.pop_front() {
            self.session.depth = self
                .session
                .depth
                .checked_sub(1)
                .expect("dedent flush would drop indentation depth below zero");
            match self.automaton.feed(&mut self.session.state, &dedent.kind) {
                FeedOutcome::Halted => return false,
                FeedOutcome::Continue => self.session.last_fed = Some(dedent),
            }
        }
        true
    }

    fn record(&mut self, pos: usize, token: &Token) {
        let accepts = Arc::new(self.automaton.accepts(&self.session.state));
        let prev = std::mem::replace(&mut self.session.next, Arc::clone(&accepts));
        self.session.current = Arc::clone(&prev);
        self.session.checkpoints.insert(
            pos,
            Checkpoint {
                token: token.clone(),
                state: self.automaton.copy_state(&self.session.state),
                depth: self.session.depth,
                accepts,
                prev_accepts: prev,
            },
        );
        self.session.last_fed = Some(token.clone());
    }

    /// Forward-looking set for a completed lexeme. After a line terminator
    /// the raw set is rewritten so indentation is surfaced solely through the
    /// synthetic tab terminal.
    fn next_acceptance(&self) -> IndexSet<String> {
        let raw = self.session.next.as_ref();
        let after_newline = self
            .session
            .last_fed
            .as_ref()
            .is_some_and(|t| t.kind == self.indent.newline);
        if !after_newline {
            return raw.clone();
        }
        let depth = self.session.depth as isize;
        let max_expected = if raw.contains(self.indent.indent.as_str()) {
            depth + 1
        } else if raw.len() == 1 && raw.contains(self.indent.dedent.as_str()) {
            depth - 1
        } else {
            depth
        };
        let mut out = raw.clone();
        out.shift_remove(self.indent.indent.as_str());
        out.shift_remove(self.indent.dedent.as_str());
        out.insert(self.indent.newline.clone());
        let tabs = self
            .session
            .last_fed
            .as_ref()
            .map(|t| trailing_tabs(&t.text))
            .unwrap_or(0) as isize;
        if tabs < max_expected {
            out.insert(self.indent.tab.clone());
        }
        out
    }
}
