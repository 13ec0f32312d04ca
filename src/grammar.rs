//! Grammar descriptions: Yacc productions plus an ordered terminal catalog.
//!
//! The automaton tables are built from the `productions` source by grmtools;
//! everything lexical (patterns, skip list, indentation behavior) lives here,
//! since the grammar's token declarations only carry names.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// How a terminal's lexeme is recognized.
///
/// Catalog order is significant: it breaks ties between equal-length matches
/// in the lexer and picks the first hit in the exact/prefix matchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "pattern")]
pub enum TerminalPattern {
    /// Matched by string equality.
    Literal(String),
    /// Matched by a regex (anchored by the consumers; do not anchor here).
    Regex(String),
}

/// One entry of the terminal catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalDef {
    pub name: String,
    #[serde(flatten)]
    pub pattern: TerminalPattern,
}

impl TerminalDef {
    pub fn literal(name: &str, pattern: &str) -> Self {
        TerminalDef {
            name: name.to_string(),
            pattern: TerminalPattern::Literal(pattern.to_string()),
        }
    }

    pub fn regex(name: &str, pattern: &str) -> Self {
        TerminalDef {
            name: name.to_string(),
            pattern: TerminalPattern::Regex(pattern.to_string()),
        }
    }
}

/// Names and measurements driving the off-side rule.
///
/// The line-terminator, indent and dedent names must match the grammar's
/// token declarations; the tab terminal is synthetic and must not appear in
/// the grammar at all; it only ever shows up in caller-facing sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentationConfig {
    pub newline: String,
    pub indent: String,
    pub dedent: String,
    pub tab: String,
    pub open_brackets: Vec<String>,
    pub close_brackets: Vec<String>,
    /// Columns one tab character counts for when measuring indentation.
    pub tab_width: usize,
}

impl Default for IndentationConfig {
    fn default() -> Self {
        IndentationConfig {
            newline: "_NL".to_string(),
            indent: "_INDENT".to_string(),
            dedent: "_DEDENT".to_string(),
            tab: "_TAB".to_string(),
            open_brackets: vec!["LPAR".to_string(), "LSQB".to_string(), "LBRACE".to_string()],
            close_brackets: vec!["RPAR".to_string(), "RSQB".to_string(), "RBRACE".to_string()],
            tab_width: 4,
        }
    }
}

fn default_prefix_opaque() -> Vec<String> {
    // Multiline/escape handling makes naive prefix reasoning unsound for
    // these; the names mirror the reference Python grammar.
    ["_NL", "COMMENT", "STRING", "IMAG_NUMBER"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// A complete grammar description: productions for the automaton, the
/// terminal catalog for the lexer and matchers, and lexical policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    /// Yacc-syntax productions (grmtools `YaccKind::Original`, no actions).
    pub productions: String,
    /// Ordered terminal catalog.
    pub terminals: Vec<TerminalDef>,
    /// Terminals matched and consumed but never emitted (whitespace, comments).
    #[serde(default)]
    pub skip: Vec<String>,
    /// Terminals excluded from prefix matching.
    #[serde(default = "default_prefix_opaque")]
    pub prefix_opaque: Vec<String>,
    #[serde(default)]
    pub indentation: IndentationConfig,
}

impl Grammar {
    pub fn from_json(s: &str) -> Result<Self> {
        let grammar: Grammar =
            serde_json::from_str(s).context("failed to parse grammar description")?;
        grammar.validate()?;
        Ok(grammar)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar from {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Check catalog coherence. Called by the loaders; constructors building
    /// a `Grammar` by hand should call it once before use.
    pub fn validate(&self) -> Result<()> {
        let dupes: Vec<&str> = self
            .terminals
            .iter()
            .map(|t| t.name.as_str())
            .duplicates()
            .collect();
        if !dupes.is_empty() {
            bail!("duplicate terminal definitions: {}", dupes.iter().join(", "));
        }
        if self.terminals.iter().any(|t| t.name == self.indentation.tab) {
            bail!(
                "terminal {} is synthetic and must not appear in the catalog",
                self.indentation.tab
            );
        }
        for name in &self.skip {
            if !self.terminals.iter().any(|t| &t.name == name) {
                bail!("skip terminal {name} is not in the catalog");
            }
        }
        Ok(())
    }

    pub fn terminal(&self, name: &str) -> Option<&TerminalDef> {
        self.terminals.iter().find(|t| t.name == name)
    }
}
