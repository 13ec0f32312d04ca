//! Maximal-munch lexer with off-side-rule indentation tracking.
//!
//! The lexer re-derives all of its state (bracket nesting, indentation level
//! stack) from scratch on every call; nothing lexical persists between calls.
//! Structural indent/dedent tokens are synthesized when a line-terminator is
//! scanned at bracket depth zero, the way the reference Python setup treats
//! newlines inside parentheses as plain whitespace.

use anyhow::{Context, Result};
use indexmap::IndexSet;
use regex::Regex;

use crate::grammar::{Grammar, IndentationConfig, TerminalPattern};

/// A lexed token. Positions are byte offsets into the scanned text.
///
/// Equality compares kind and text only: two runs over different inputs that
/// produce the same token run are interchangeable for checkpoint reuse even
/// when skipped text shifted the offsets.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: String,
    pub text: String,
    pub pos: usize,
}

impl Token {
    pub(crate) fn new(kind: &str, text: &str, pos: usize) -> Self {
        Token {
            kind: kind.to_string(),
            text: text.to_string(),
            pos,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}

impl Eq for Token {}

/// One call's lexing result: the token sequence and the byte offset just past
/// the last emitted token. Text beyond `cursor` is an in-progress lexeme (or
/// unscannable tail) the driver reports back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub cursor: usize,
}

enum ScanPattern {
    Literal(String),
    Regex(Regex),
}

struct ScanRule {
    name: String,
    pattern: ScanPattern,
}

pub struct Lexer {
    rules: Vec<ScanRule>,
    skip: IndexSet<String>,
    indent: IndentationConfig,
}

impl Lexer {
    pub fn new(grammar: &Grammar) -> Result<Self> {
        let mut rules = Vec::with_capacity(grammar.terminals.len());
        for def in &grammar.terminals {
            let pattern = match &def.pattern {
                TerminalPattern::Literal(s) => ScanPattern::Literal(s.clone()),
                TerminalPattern::Regex(s) => {
                    let re = Regex::new(&format!(r"\A(?:{s})"))
                        .with_context(|| format!("invalid pattern for terminal {}", def.name))?;
                    ScanPattern::Regex(re)
                }
            };
            rules.push(ScanRule {
                name: def.name.clone(),
                pattern,
            });
        }
        Ok(Lexer {
            rules,
            skip: grammar.skip.iter().cloned().collect(),
            indent: grammar.indentation.clone(),
        })
    }

    /// Tokenize `text` from the start, truncating at the first character that
    /// matches no terminal. Truncation is the expected outcome for a partial
    /// program, not a failure.
    pub fn lex(&self, text: &str) -> TokenStream {
        let mut tokens = Vec::new();
        let mut cursor = 0;
        let mut pos = 0;
        let mut bracket_depth = 0usize;
        // Indentation widths, innermost last. Level zero is always present.
        let mut levels = vec![0usize];

        while pos < text.len() {
            let rest = &text[pos..];
            let Some((rule_idx, len)) = self.scan_one(rest) else {
                break;
            };
            let rule = &self.rules[rule_idx];
            let lexeme = &rest[..len];
            let start = pos;
            pos += len;

            if self.skip.contains(&rule.name) {
                // Consumed, never emitted; the cursor stays at the last
                // emitted token so a trailing skip run reads as in-progress.
                continue;
            }

            if rule.name == self.indent.newline {
                if bracket_depth > 0 {
                    // Inside brackets a line break is ordinary whitespace.
                    cursor = pos;
                    continue;
                }
                tokens.push(Token::new(&rule.name, lexeme, start));
                cursor = pos;
                if !self.track_indentation(lexeme, start, &mut levels, &mut tokens) {
                    break;
                }
                continue;
            }

            if self.indent.open_brackets.contains(&rule.name) {
                bracket_depth += 1;
            } else if self.indent.close_brackets.contains(&rule.name) {
                // A stray closer in a partial program; the automaton will
                // reject the token itself.
                bracket_depth = bracket_depth.saturating_sub(1);
            }

            tokens.push(Token::new(&rule.name, lexeme, start));
            cursor = pos;
        }

        TokenStream { tokens, cursor }
    }

    /// Compare the width of the line-terminator's trailing line against the
    /// level stack and synthesize indent/dedent tokens. Returns false when
    /// the new width lands between stack levels (inconsistent dedent), which
    /// truncates the scan like an unscannable character.
    fn track_indentation(
        &self,
        lexeme: &str,
        pos: usize,
        levels: &mut Vec<usize>,
        tokens: &mut Vec<Token>,
    ) -> bool {
        let last_line = lexeme.rsplit('\n').next().unwrap_or("");
        let width = last_line
            .chars()
            .map(|c| if c == '\t' { self.indent.tab_width } else { 1 })
            .sum::<usize>();
        let top = *levels.last().unwrap_or(&0);
        if width > top {
            levels.push(width);
            tokens.push(Token::new(&self.indent.indent, last_line, pos));
            return true;
        }
        while width < *levels.last().unwrap_or(&0) {
            levels.pop();
            tokens.push(Token::new(&self.indent.dedent, last_line, pos));
        }
        width == *levels.last().unwrap_or(&0)
    }

    /// Longest match over the catalog at the start of `rest`. Equal lengths:
    /// a literal beats a regex, then catalog order decides.
    fn scan_one(&self, rest: &str) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, bool)> = None;
        for (idx, rule) in self.rules.iter().enumerate() {
            let (len, is_literal) = match &rule.pattern {
                ScanPattern::Literal(s) => {
                    if !rest.starts_with(s.as_str()) {
                        continue;
                    }
                    (s.len(), true)
                }
                ScanPattern::Regex(re) => match re.find(rest) {
                    Some(m) => (m.end(), false),
                    None => continue,
                },
            };
            if len == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_len, best_lit)) => {
                    len > best_len || (len == best_len && is_literal && !best_lit)
                }
            };
            if better {
                best = Some((idx, len, is_literal));
            }
        }
        best.map(|(idx, len, _)| (idx, len))
    }
}
