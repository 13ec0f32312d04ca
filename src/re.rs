//! Terminal classification: exact (full-match) and viable-prefix matching.
//!
//! Prefix matching is the automaton form of regex derivatives: each eligible
//! pattern is compiled once into an anchored, minimized dense DFA, and a
//! candidate is a viable prefix iff walking it never reaches the dead state.
//! In a minimized DFA every state from which no match is reachable *is* the
//! dead state, so the walk is exact, not a heuristic.
//!
//! Both entry points sit on the hot path of a decoding loop (the same
//! candidate strings come back over and over), so results are memoized in
//! bounded LRU caches. The interior mutability makes the matcher `!Sync`,
//! matching the one-stream-per-instance model.

use std::cell::RefCell;
use std::num::NonZeroUsize;

use anyhow::{Context, Result};
use indexmap::IndexSet;
use lru::LruCache;
use regex::Regex;
use regex_automata::dfa::{dense, Automaton as DfaAutomaton, StartKind};
use regex_automata::{Anchored, Input};

use crate::grammar::{Grammar, TerminalPattern};

const CACHE_CAPACITY: usize = 4096;

enum MatchPattern {
    Literal(String),
    Regex {
        full: Regex,
        /// Anchored minimized DFA for prefix viability; absent for
        /// prefix-opaque terminals.
        prefix: Option<dense::DFA<Vec<u32>>>,
    },
}

struct MatchRule {
    name: String,
    pattern: MatchPattern,
}

pub struct TerminalMatcher {
    rules: Vec<MatchRule>,
    tab: String,
    exact_cache: RefCell<LruCache<String, Option<usize>>>,
    prefix_cache: RefCell<LruCache<String, Option<usize>>>,
}

impl TerminalMatcher {
    pub fn new(grammar: &Grammar) -> Result<Self> {
        let opaque: IndexSet<&str> = grammar.prefix_opaque.iter().map(|s| s.as_str()).collect();
        let mut rules = Vec::with_capacity(grammar.terminals.len());
        for def in &grammar.terminals {
            let pattern = match &def.pattern {
                TerminalPattern::Literal(s) => MatchPattern::Literal(s.clone()),
                TerminalPattern::Regex(s) => {
                    let full = Regex::new(&format!(r"\A(?:{s})\z"))
                        .with_context(|| format!("invalid pattern for terminal {}", def.name))?;
                    let prefix = if opaque.contains(def.name.as_str()) {
                        None
                    } else {
                        Some(prefix_dfa(s).with_context(|| {
                            format!("prefix automaton for terminal {}", def.name)
                        })?)
                    };
                    MatchPattern::Regex { full, prefix }
                }
            };
            rules.push(MatchRule {
                name: def.name.clone(),
                pattern,
            });
        }
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).expect("cache capacity is non-zero");
        Ok(TerminalMatcher {
            rules,
            tab: grammar.indentation.tab.clone(),
            exact_cache: RefCell::new(LruCache::new(capacity)),
            prefix_cache: RefCell::new(LruCache::new(capacity)),
        })
    }

    /// Classify a complete string: the synthetic tab terminal first, then
    /// literal terminals by equality, then regex terminals by full match, in
    /// catalog order.
    pub fn match_exact(&self, s: &str) -> Option<&str> {
        if s == "\t" {
            return Some(&self.tab);
        }
        if let Some(cached) = self.exact_cache.borrow_mut().get(s) {
            return (*cached).map(|idx| self.rules[idx].name.as_str());
        }
        let found = self
            .rules
            .iter()
            .position(|r| matches!(&r.pattern, MatchPattern::Literal(lit) if lit == s))
            .or_else(|| {
                self.rules.iter().position(
                    |r| matches!(&r.pattern, MatchPattern::Regex { full, .. } if full.is_match(s)),
                )
            });
        self.exact_cache
            .borrow_mut()
            .put(s.to_string(), found);
        found.map(|idx| self.rules[idx].name.as_str())
    }

    /// First regex terminal (catalog order, prefix-opaque excluded) for which
    /// `accumulated + addition` is a viable prefix of a full match.
    pub fn prefix_match(&self, accumulated: &str, addition: &str) -> Option<&str> {
        let s = format!("{accumulated}{addition}");
        if let Some(cached) = self.prefix_cache.borrow_mut().get(&s) {
            return (*cached).map(|idx| self.rules[idx].name.as_str());
        }
        let found = self.rules.iter().position(|r| match &r.pattern {
            MatchPattern::Regex {
                prefix: Some(dfa), ..
            } => is_viable_prefix(dfa, &s),
            _ => false,
        });
        self.prefix_cache.borrow_mut().put(s, found);
        found.map(|idx| self.rules[idx].name.as_str())
    }
}

fn prefix_dfa(pattern: &str) -> Result<dense::DFA<Vec<u32>>> {
    dense::Builder::new()
        .configure(
            dense::Config::new()
                .start_kind(StartKind::Anchored)
                .minimize(true),
        )
        .build(pattern)
        .map_err(|e| anyhow::anyhow!("{e}"))
}

fn is_viable_prefix(dfa: &dense::DFA<Vec<u32>>, s: &str) -> bool {
    let input = Input::new(s).anchored(Anchored::Yes);
    let Ok(mut sid) = dfa.start_state_forward(&input) else {
        return false;
    };
    if dfa.is_dead_state(sid) {
        return false;
    }
    for &byte in s.as_bytes() {
        sid = dfa.next_state(sid, byte);
        if dfa.is_dead_state(sid) || dfa.is_quit_state(sid) {
            return false;
        }
    }
    true
}
