//! Lexical matcher: anchored literal and regex matching at a byte offset.
//!
//! Regexes run over the whole text with the search anchored at the offset,
//! so assertions like `\b` and `^` see the bytes before it. Among the matches
//! starting at the offset the longest wins.
//!
//! Every scan also reports its *reach*: one past the last byte position it
//! examined, where the end of input counts as position `text.len()`. The
//! parser uses it to tell which parts of a tree depend on which bytes.

use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::{Anchored, Input, MatchKind, meta};

use super::error::GrammarError;
use super::rule::Pattern;

/// A compiled [`Pattern`].
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(Box<str>),
    Regex(RegexMatcher),
}

/// Outcome of examining the text at one offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// Length of the match, if any.
    pub len: Option<usize>,
    /// Exclusive end of the examined positions.
    pub reach: usize,
}

#[derive(Debug, Clone)]
pub struct RegexMatcher {
    /// Anchored longest-match DFA. `None` when determinization failed.
    dfa: Option<dense::DFA<Vec<u32>>>,
    /// Used when the DFA gives up, e.g. on non-ASCII text around `\b`.
    fallback: meta::Regex,
    nullable: bool,
    looks_around: bool,
}

impl Matcher {
    pub fn compile(pattern: &Pattern) -> Result<Self, GrammarError> {
        match pattern {
            Pattern::Literal(text) => Ok(Matcher::Literal(text.as_str().into())),
            Pattern::Regex(source) => {
                let invalid = |message: String| GrammarError::InvalidPattern {
                    pattern: source.clone(),
                    message,
                };
                let fallback = meta::Regex::builder()
                    .configure(meta::Regex::config().match_kind(MatchKind::All))
                    .build(source)
                    .map_err(|err| invalid(err.to_string()))?;
                let hir = regex_automata::util::syntax::parse(source)
                    .map_err(|err| invalid(err.to_string()))?;
                let dfa = dense::Builder::new()
                    .configure(
                        dense::Config::new()
                            .match_kind(MatchKind::All)
                            .start_kind(StartKind::Anchored)
                            .unicode_word_boundary(true),
                    )
                    .build(source)
                    .map_err(|err| tracing::debug!(%source, %err, "no DFA for pattern"))
                    .ok();
                Ok(Matcher::Regex(RegexMatcher {
                    dfa,
                    fallback,
                    nullable: hir.properties().minimum_len() == Some(0),
                    looks_around: !hir.properties().look_set().is_empty(),
                }))
            }
        }
    }

    /// Length of the longest match starting exactly at `offset`, if any.
    ///
    /// Offsets past the end or inside a char never match.
    pub fn match_at(&self, text: &str, offset: usize) -> Option<usize> {
        self.scan(text, offset).len
    }

    /// [`match_at`](Self::match_at), also reporting how far the text was read.
    pub fn scan(&self, text: &str, offset: usize) -> Scan {
        if !text.is_char_boundary(offset) {
            return Scan {
                len: None,
                reach: offset,
            };
        }
        match self {
            Matcher::Literal(literal) => {
                let common = text.as_bytes()[offset..]
                    .iter()
                    .zip(literal.as_bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                if common == literal.len() {
                    Scan {
                        len: Some(common),
                        reach: offset + common,
                    }
                } else {
                    // The first differing byte, or the end of input.
                    Scan {
                        len: None,
                        reach: offset + common + 1,
                    }
                }
            }
            Matcher::Regex(regex) => regex.scan(text, offset),
        }
    }

    /// Whether the pattern can match the empty string somewhere.
    pub fn matches_empty(&self) -> bool {
        match self {
            Matcher::Literal(literal) => literal.is_empty(),
            Matcher::Regex(regex) => regex.nullable,
        }
    }

    /// Whether matching can depend on text before the offset.
    pub fn looks_behind(&self) -> bool {
        match self {
            Matcher::Literal(_) => false,
            Matcher::Regex(regex) => regex.looks_around,
        }
    }
}

impl RegexMatcher {
    fn scan(&self, text: &str, offset: usize) -> Scan {
        let scan = self
            .dfa
            .as_ref()
            .and_then(|dfa| scan_dfa(dfa, text, offset))
            .unwrap_or_else(|| {
                let input = Input::new(text).range(offset..).anchored(Anchored::Yes);
                Scan {
                    len: self.fallback.find(input).map(|m| m.end()),
                    reach: text.len() + 1,
                }
            });
        Scan {
            len: scan
                .len
                .filter(|&end| text.is_char_boundary(end))
                .map(|end| end - offset),
            ..scan
        }
    }
}

/// Step the DFA from `offset` until it dies or the input ends. `len` holds
/// the absolute end of the longest match. `None` if the DFA quit.
fn scan_dfa(dfa: &dense::DFA<Vec<u32>>, text: &str, offset: usize) -> Option<Scan> {
    let input = Input::new(text).range(offset..).anchored(Anchored::Yes);
    let mut state = dfa.start_state_forward(&input).ok()?;
    let bytes = text.as_bytes();
    let mut end = None;
    for (at, &byte) in bytes.iter().enumerate().skip(offset) {
        state = dfa.next_state(state, byte);
        if dfa.is_special_state(state) {
            // Matches are reported one byte late.
            if dfa.is_match_state(state) {
                end = Some(at);
            } else if dfa.is_dead_state(state) {
                return Some(Scan {
                    len: end,
                    reach: at + 1,
                });
            } else if dfa.is_quit_state(state) {
                return None;
            }
        }
    }
    state = dfa.next_eoi_state(state);
    if dfa.is_match_state(state) {
        end = Some(bytes.len());
    }
    Some(Scan {
        len: end,
        reach: bytes.len() + 1,
    })
}
