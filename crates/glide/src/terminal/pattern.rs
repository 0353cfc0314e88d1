//! Terminal patterns as written in a grammar.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;

use crate::input::Input;

/// Matches a terminal at a position of the input
///
/// Implement this to plug an external automaton into a grammar through
/// [`Pattern::Custom`]. The matcher must be deterministic: the same input and
/// index always give the same answer.
pub trait TerminalMatcher: Send + Sync {
    /// Length in code points of the match starting at `index`
    fn match_at(&self, input: &Input, index: usize) -> Option<usize>;

    /// Whether a match could begin with `c`; used for first-set pruning
    fn may_start_with(&self, _c: char) -> bool {
        true
    }

    /// Whether the matcher can succeed without consuming input
    fn matches_empty(&self) -> bool {
        true
    }
}

/// A terminal as it appears in a grammar rule
#[derive(Clone)]
pub enum Pattern {
    /// Exact text
    Literal(CompactString),
    /// A single code point from a set
    CharClass(CharSet),
    /// A regular expression, anchored at the current position
    Regex(CompactString),
    /// Any single code point
    Any,
    /// An external matcher, identified by name
    Custom {
        name: CompactString,
        matcher: Arc<dyn TerminalMatcher>,
    },
}

impl Pattern {
    /// Create a custom pattern
    #[must_use]
    pub fn custom(name: impl Into<CompactString>, matcher: impl TerminalMatcher + 'static) -> Self {
        Self::Custom {
            name: name.into(),
            matcher: Arc::new(matcher),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "'{}'", text.escape_debug()),
            Self::CharClass(set) => write!(f, "{set}"),
            Self::Regex(source) => write!(f, "/{source}/"),
            Self::Any => f.write_str("."),
            Self::Custom { name, .. } => write!(f, "<{name}>"),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({self})")
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Self::Literal(text.into())
    }
}

/// A set of code points given as inclusive ranges
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: Vec<(char, char)>,
    negated: bool,
}

impl CharSet {
    /// Create a character set from inclusive ranges
    #[must_use]
    pub const fn new(ranges: Vec<(char, char)>) -> Self {
        Self {
            ranges,
            negated: false,
        }
    }

    /// A set of individual characters
    #[must_use]
    pub fn of(chars: &str) -> Self {
        Self::new(chars.chars().map(|c| (c, c)).collect())
    }

    /// `[0-9]`
    #[must_use]
    pub fn digits() -> Self {
        Self::new(vec![('0', '9')])
    }

    /// `[a-zA-Z]`
    #[must_use]
    pub fn letters() -> Self {
        Self::new(vec![('a', 'z'), ('A', 'Z')])
    }

    /// Space, tab, carriage return and newline
    #[must_use]
    pub fn whitespace() -> Self {
        Self::new(vec![(' ', ' '), ('\t', '\t'), ('\r', '\r'), ('\n', '\n')])
    }

    /// The complement of this set
    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Whether the set can match nothing at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.negated && self.ranges.iter().all(|(start, end)| start > end)
    }

    /// Check if a character matches this character set
    #[must_use]
    pub fn matches(&self, c: char) -> bool {
        let inside = self
            .ranges
            .iter()
            .any(|(start, end)| c >= *start && c <= *end);
        inside != self.negated
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        if self.negated {
            f.write_str("^")?;
        }
        for &(start, end) in &self.ranges {
            if start == end {
                write!(f, "{}", start.escape_debug())?;
            } else {
                write!(f, "{}-{}", start.escape_debug(), end.escape_debug())?;
            }
        }
        f.write_str("]")
    }
}

impl TerminalMatcher for CharSet {
    fn match_at(&self, input: &Input, index: usize) -> Option<usize> {
        input.char_at(index).filter(|&c| self.matches(c)).map(|_| 1)
    }

    fn may_start_with(&self, c: char) -> bool {
        self.matches(c)
    }

    fn matches_empty(&self) -> bool {
        false
    }
}
