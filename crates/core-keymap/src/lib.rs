//! core-keymap: key sequence parser.
//!
//! Design principles:
//! - Pure and deterministic: the outcome depends only on the pattern and the
//!   key buffer handed in. Calling `parse` again with a longer buffer never
//!   depends on an earlier call (no hidden state).
//! - Ambiguity is surfaced as `ParseOutcome::NeedsMoreKeys` whenever the buffer
//!   is a strict prefix of something the pattern could still accept.
//! - Two pattern kinds: literal token prefixes (`dd`, `gE`, `<C-r>`) and a
//!   single-placeholder regex (`f{char}`) matched against the `<C-r>` rendering
//!   of the buffer.
//! - No side effects: logging only at TRACE for outcomes.

use std::fmt;

use core_events::{KeyNotationError, KeyToken, format_keys, parse_keys};
use regex::Regex;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

/// Inline storage for the short literal sequences that make up nearly every binding.
pub type KeySeq = SmallVec<[KeyToken; 4]>;

/// One key token in rendered form: either a `<...>` group or a single character.
const TOKEN_RE: &str = r"<[^<>]+>|.";

// -------------------------------------------------------------------------------------------------
// Parse outcome
// -------------------------------------------------------------------------------------------------

/// Named variables captured by a placeholder pattern (e.g. the target of `f`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    vars: SmallVec<[(String, KeyToken); 1]>,
}

impl Captures {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, token: KeyToken) {
        self.vars.push((name.into(), token));
    }

    pub fn get(&self, name: &str) -> Option<&KeyToken> {
        self.vars.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Captured variable as a printable character (`<Space>` and `<lt>` included).
    pub fn char(&self, name: &str) -> Option<char> {
        self.get(name).and_then(KeyToken::as_char)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Tri-state result of matching a key buffer against a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The buffer starts with a complete match; `remainder` holds the keys after it.
    Match {
        vars: Captures,
        remainder: Vec<KeyToken>,
    },
    /// The buffer is a strict prefix of something the pattern accepts.
    NeedsMoreKeys,
    NoMatch,
}

impl ParseOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, ParseOutcome::Match { .. })
    }

    pub fn needs_more(&self) -> bool {
        matches!(self, ParseOutcome::NeedsMoreKeys)
    }
}

// -------------------------------------------------------------------------------------------------
// Patterns
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid key pattern regex: {0}")]
    Regex(#[from] regex::Error),
    #[error("placeholder pattern must have exactly one capture group, found {found}")]
    CaptureGroups { found: usize },
    #[error(transparent)]
    Notation(#[from] KeyNotationError),
}

/// Regex pattern with exactly one capture group standing for a single key.
#[derive(Debug, Clone)]
pub struct PlaceholderPattern {
    full: Regex,
    partial: Regex,
    var: String,
}

impl PlaceholderPattern {
    /// Build from a literal lead-in (`f`, `gr`, `<C-k>`) followed by one placeholder key.
    pub fn new(lead: &str, var: &str) -> Result<Self, PatternError> {
        let lead_keys = if lead.is_empty() {
            Vec::new()
        } else {
            parse_keys(lead)?
        };
        let rendered = format_keys(&lead_keys);
        let full = format!(
            "^{}(?P<{var}>{TOKEN_RE})",
            regex::escape(&rendered),
            var = var
        );
        let prefixes: Vec<String> = (1..=lead_keys.len())
            .map(|n| regex::escape(&format_keys(&lead_keys[..n])))
            .collect();
        let partial = if prefixes.is_empty() {
            "^$".to_string()
        } else {
            format!("^(?:{})$", prefixes.join("|"))
        };
        Self::from_regex(&full, &partial)
    }

    /// Build from explicit `full` / `partial` regexes (both anchored by the caller or here).
    pub fn from_regex(full: &str, partial: &str) -> Result<Self, PatternError> {
        let full = Regex::new(full)?;
        let partial = Regex::new(partial)?;
        let found = full.captures_len() - 1;
        if found != 1 {
            return Err(PatternError::CaptureGroups { found });
        }
        let var = full
            .capture_names()
            .flatten()
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| "1".to_string());
        Ok(Self { full, partial, var })
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    fn parse(&self, keys: &[KeyToken]) -> ParseOutcome {
        let rendered = format_keys(keys);
        if let Some(caps) = self.full.captures(&rendered)
            && let Some(whole) = caps.get(0)
            && whole.start() == 0
            && let Some(group) = caps.get(1)
        {
            let Some(token) = parse_keys(group.as_str())
                .ok()
                .filter(|toks| toks.len() == 1)
                .and_then(|mut toks| toks.pop())
            else {
                return ParseOutcome::NoMatch;
            };
            let mut vars = Captures::none();
            vars.insert(self.var.clone(), token);
            return ParseOutcome::Match {
                vars,
                remainder: remainder_after(keys, whole.end()),
            };
        }
        if self.partial.is_match(&rendered) {
            ParseOutcome::NeedsMoreKeys
        } else {
            ParseOutcome::NoMatch
        }
    }
}

/// Tokens left over once `consumed` bytes of the rendered buffer have matched.
fn remainder_after(keys: &[KeyToken], consumed: usize) -> Vec<KeyToken> {
    let mut acc = 0usize;
    for (idx, key) in keys.iter().enumerate() {
        if acc >= consumed {
            return keys[idx..].to_vec();
        }
        acc += key.to_string().len();
    }
    Vec::new()
}

/// A key pattern as stored in a registry entry.
#[derive(Debug, Clone)]
pub enum KeyPattern {
    Literal(KeySeq),
    Placeholder(PlaceholderPattern),
}

impl KeyPattern {
    pub fn literal(keys: impl IntoIterator<Item = KeyToken>) -> Self {
        KeyPattern::Literal(keys.into_iter().collect())
    }

    /// Literal pattern from key notation (`"gE"`, `"<C-r>"`).
    pub fn keys(notation: &str) -> Result<Self, PatternError> {
        Ok(Self::literal(parse_keys(notation)?))
    }

    /// Single placeholder after a literal lead-in: `placeholder("f", "char")`.
    pub fn placeholder(lead: &str, var: &str) -> Result<Self, PatternError> {
        Ok(KeyPattern::Placeholder(PlaceholderPattern::new(lead, var)?))
    }

    pub fn parse(&self, keys: &[KeyToken]) -> ParseOutcome {
        let outcome = match self {
            KeyPattern::Literal(pattern) => parse_literal(pattern, keys),
            KeyPattern::Placeholder(p) => {
                if keys.is_empty() {
                    ParseOutcome::NeedsMoreKeys
                } else {
                    p.parse(keys)
                }
            }
        };
        trace!(target: "input.keys", pattern = %self, keys = %format_keys(keys), ?outcome, "parse");
        outcome
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPattern::Literal(seq) => f.write_str(&format_keys(seq)),
            KeyPattern::Placeholder(p) => write!(f, "/{}/", p.full.as_str()),
        }
    }
}

fn parse_literal(pattern: &[KeyToken], keys: &[KeyToken]) -> ParseOutcome {
    if keys.len() >= pattern.len() {
        if keys[..pattern.len()] == *pattern {
            ParseOutcome::Match {
                vars: Captures::none(),
                remainder: keys[pattern.len()..].to_vec(),
            }
        } else {
            ParseOutcome::NoMatch
        }
    } else if pattern[..keys.len()] == *keys {
        ParseOutcome::NeedsMoreKeys
    } else {
        ParseOutcome::NoMatch
    }
}

/// Free-function form of [`KeyPattern::parse`].
pub fn parse(pattern: &KeyPattern, keys: &[KeyToken]) -> ParseOutcome {
    pattern.parse(keys)
}
