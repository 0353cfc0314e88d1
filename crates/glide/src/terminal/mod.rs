//! # Terminals
//!
//! Compiled terminal matchers.
//!
//! A grammar names terminals with [`Pattern`]s. The graph compiler interns
//! every distinct pattern into a [`Terminal`] and hands out a dense
//! [`TerminalId`]; transitions and conditions refer to terminals by id only.
//!
//! Regular expressions are delegated to the `regex` crate and anchored at the
//! current position. Matching is leftmost-first: a regex terminal yields the
//! single match the `regex` engine reports, not every possible length.

mod pattern;

pub use pattern::{CharSet, Pattern, TerminalMatcher};

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use regex::Regex;

use crate::error::GrammarError;
use crate::input::Input;

/// Dense identifier of an interned terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(u32);

impl TerminalId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

enum Matcher {
    Literal(Box<[char]>),
    Class(CharSet),
    Regex(Regex),
    Any,
    Custom(Arc<dyn TerminalMatcher>),
}

/// A terminal ready to be matched against input
pub struct Terminal {
    name: CompactString,
    matcher: Matcher,
}

impl Terminal {
    /// Compile a pattern
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::InvalidRegex`] for a malformed regular
    /// expression and [`GrammarError::EmptyCharClass`] for a class that
    /// matches nothing. `nonterminal` names the rule being compiled.
    pub fn compile(pattern: &Pattern, nonterminal: &str) -> Result<Self, GrammarError> {
        let matcher = match pattern {
            Pattern::Literal(text) => Matcher::Literal(text.chars().collect()),
            Pattern::CharClass(set) => {
                if set.is_empty() {
                    return Err(GrammarError::EmptyCharClass {
                        nonterminal: nonterminal.into(),
                    });
                }
                Matcher::Class(set.clone())
            }
            Pattern::Regex(source) => {
                let anchored = format!("^(?:{source})");
                let regex = Regex::new(&anchored).map_err(|error| GrammarError::InvalidRegex {
                    pattern: source.clone(),
                    reason: error.to_string(),
                })?;
                Matcher::Regex(regex)
            }
            Pattern::Any => Matcher::Any,
            Pattern::Custom { matcher, .. } => Matcher::Custom(Arc::clone(matcher)),
        };
        Ok(Self {
            name: pattern.to_string().into(),
            matcher,
        })
    }

    /// Display name, unique per interned terminal
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in code points of the match starting at `index`
    #[must_use]
    pub fn match_at(&self, input: &Input, index: usize) -> Option<usize> {
        match &self.matcher {
            Matcher::Literal(chars) => {
                let end = index.checked_add(chars.len())?;
                let window = input.chars().get(index..end)?;
                (window == &chars[..]).then_some(chars.len())
            }
            Matcher::Class(set) => set.match_at(input, index),
            Matcher::Any => input.char_at(index).map(|_| 1),
            Matcher::Regex(regex) => {
                if index > input.len() {
                    return None;
                }
                let found = regex.find(input.rest(index))?;
                let end = input.index_of_byte(input.byte_offset(index) + found.end())?;
                Some(end - index)
            }
            Matcher::Custom(matcher) => matcher.match_at(input, index),
        }
    }

    /// Whether some match of this terminal ends exactly at `end`
    #[must_use]
    pub fn matches_ending_at(&self, input: &Input, end: usize) -> bool {
        match &self.matcher {
            Matcher::Literal(chars) => end
                .checked_sub(chars.len())
                .is_some_and(|start| self.match_at(input, start).is_some()),
            Matcher::Class(_) | Matcher::Any => {
                end > 0 && self.match_at(input, end - 1).is_some()
            }
            Matcher::Regex(_) | Matcher::Custom(_) => {
                (0..=end.min(input.len())).any(|start| self.match_at(input, start) == Some(end - start))
            }
        }
    }

    /// Whether a match could begin with `c`
    #[must_use]
    pub fn may_start_with(&self, c: char) -> bool {
        match &self.matcher {
            Matcher::Literal(chars) => chars.first().is_none_or(|&first| first == c),
            Matcher::Class(set) => set.matches(c),
            Matcher::Any | Matcher::Regex(_) => true,
            Matcher::Custom(matcher) => matcher.may_start_with(c),
        }
    }

    /// Whether the terminal can match the empty string
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match &self.matcher {
            Matcher::Literal(chars) => chars.is_empty(),
            Matcher::Class(_) | Matcher::Any => false,
            Matcher::Regex(regex) => regex.is_match(""),
            Matcher::Custom(matcher) => matcher.matches_empty(),
        }
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Terminal").field(&self.name).finish()
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
