//! Source locations.
//!
//! A [`Location`] identifies a span of source text: the file it came from,
//! the byte offset of its first character, the 1-based line and column of
//! that character, and the span length in bytes.

use std::fmt;

use serde::Serialize;

/// A span of source text.
///
/// `offset` and `size` are byte based so a location can be used to slice the
/// original `&str` directly. `line` and `column` are 1-based and counted in
/// characters, with `\r\n`, `\r` and `\n` each ending a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Location {
    /// Name of the source the span belongs to (`"inline"` for plain strings).
    pub filename: String,
    /// Byte offset of the first character.
    pub offset: usize,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub column: usize,
    /// Length of the span in bytes.
    pub size: usize,
}

impl Location {
    /// Create a new location.
    #[must_use]
    pub fn new(filename: impl Into<String>, offset: usize, line: usize, column: usize, size: usize) -> Self {
        Self {
            filename: filename.into(),
            offset,
            line,
            column,
            size,
        }
    }

    /// A zero-sized location at the first character of `filename`.
    #[must_use]
    pub fn start_of(filename: impl Into<String>) -> Self {
        Self::new(filename, 0, 1, 1, 0)
    }

    /// Return a copy of this location with a different size.
    #[must_use]
    pub fn with_size(&self, size: usize) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Move the start of this location past `text`, updating offset, line and
    /// column. The size is left untouched.
    pub fn advance(&mut self, text: &str) {
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' if chars.peek() == Some(&'\n') => {}
                '\r' | '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
        }
        self.offset += text.len();
    }

    /// Narrow this location to a sub-span.
    ///
    /// `text` is the source text this location covers (starting at
    /// `self.offset`); `begin` and `end` are byte indices into it. When `end`
    /// is `None` the slice extends to the end of the original span.
    #[must_use]
    pub fn slice(&self, text: &str, begin: usize, end: Option<usize>) -> Self {
        let end = end.unwrap_or(self.size).max(begin);
        let mut sliced = self.clone();
        sliced.advance(text.get(..begin).unwrap_or(text));
        sliced.size = end - begin;
        sliced
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}
