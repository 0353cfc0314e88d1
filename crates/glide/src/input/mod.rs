//! # Input
//!
//! Parser input as a sequence of Unicode code points.
//!
//! Every position the engine talks about (descriptor indices, SPPF extents,
//! label accessors) is a code point index in `0..=len`. The input keeps the
//! original text and a byte offset table so yields can be sliced without
//! copying, and precomputes line/column for every index so diagnostics and the
//! `indent`/`line` built-ins run in O(1).

use std::fmt;

/// A line and column position in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// Zero-based line number
    pub line: u32,
    /// Zero-based column number (in code points)
    pub column: u32,
}

impl LineCol {
    /// Create a new line/column position
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for LineCol {
    /// One-based `line:column`, the way editors show it
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Text to be parsed, indexed by code point
///
/// # Example
///
/// ```rust
/// use glide::input::Input;
///
/// let input = Input::new("ab\ncd");
/// assert_eq!(input.len(), 5);
/// assert_eq!(input.char_at(3), Some('c'));
/// assert_eq!(input.line_col(4).column, 1);
/// assert_eq!(input.slice(3, 5), "cd");
/// ```
#[derive(Clone)]
pub struct Input {
    text: String,
    chars: Vec<char>,
    /// Byte offset of every code point, plus the text length at the end
    byte_offsets: Vec<usize>,
    /// Line/column of every index in `0..=len`
    positions: Vec<LineCol>,
    /// Code point index of every line start
    line_starts: Vec<usize>,
}

impl Input {
    /// Decode `text` and build the position tables
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut chars = Vec::with_capacity(text.len());
        let mut byte_offsets = Vec::with_capacity(text.len() + 1);
        for (offset, c) in text.char_indices() {
            chars.push(c);
            byte_offsets.push(offset);
        }
        byte_offsets.push(text.len());

        let mut positions = Vec::with_capacity(chars.len() + 1);
        let mut line_starts = vec![0];
        let (mut line, mut column) = (0u32, 0u32);
        for (index, &c) in chars.iter().enumerate() {
            positions.push(LineCol::new(line, column));
            // `\r\n` ends the line on the `\n`
            let breaks = c == '\n' || (c == '\r' && chars.get(index + 1) != Some(&'\n'));
            if breaks {
                line += 1;
                column = 0;
                line_starts.push(index + 1);
            } else {
                column += 1;
            }
        }
        positions.push(LineCol::new(line, column));

        Self {
            text,
            chars,
            byte_offsets,
            positions,
            line_starts,
        }
    }

    /// Number of code points
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the input has no code points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The original text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The decoded code points
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Code point at `index`, `None` at or past the end
    #[must_use]
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Byte offset of a code point index (clamped to the end of the text)
    #[must_use]
    pub fn byte_offset(&self, index: usize) -> usize {
        self.byte_offsets[index.min(self.len())]
    }

    /// Code point index of a byte offset, if the offset is a char boundary
    #[must_use]
    pub fn index_of_byte(&self, offset: usize) -> Option<usize> {
        self.byte_offsets.binary_search(&offset).ok()
    }

    /// Text between two code point indices
    #[must_use]
    pub fn slice(&self, left: usize, right: usize) -> &str {
        let right = right.min(self.len());
        let left = left.min(right);
        &self.text[self.byte_offsets[left]..self.byte_offsets[right]]
    }

    /// Text from `index` to the end
    #[must_use]
    pub fn rest(&self, index: usize) -> &str {
        &self.text[self.byte_offset(index)..]
    }

    /// Line/column of an index (clamped to the end)
    #[must_use]
    pub fn line_col(&self, index: usize) -> LineCol {
        self.positions[index.min(self.len())]
    }

    /// Zero-based line of an index
    #[must_use]
    pub fn line(&self, index: usize) -> u32 {
        self.line_col(index).line
    }

    /// Zero-based column of an index
    #[must_use]
    pub fn column(&self, index: usize) -> u32 {
        self.line_col(index).column
    }

    /// Number of lines (an empty input has one)
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a zero-based line without its terminator
    #[must_use]
    pub fn line_text(&self, line: u32) -> &str {
        let Some(&start) = self.line_starts.get(line as usize) else {
            return "";
        };
        let mut end = self
            .line_starts
            .get(line as usize + 1)
            .copied()
            .unwrap_or(self.len());
        while end > start && matches!(self.chars[end - 1], '\n' | '\r') {
            end -= 1;
        }
        self.slice(start, end)
    }

    /// Whether `index` is at the start of a line
    #[must_use]
    pub fn is_start_of_line(&self, index: usize) -> bool {
        self.line_col(index).column == 0
    }

    /// Whether `index` is just before a line break or at the end
    #[must_use]
    pub fn is_end_of_line(&self, index: usize) -> bool {
        matches!(self.char_at(index), None | Some('\n' | '\r'))
    }

    /// Whether `index` is at the end of the input
    #[must_use]
    pub fn is_end(&self, index: usize) -> bool {
        index >= self.len()
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("text", &self.text)
            .field("len", &self.len())
            .finish()
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
