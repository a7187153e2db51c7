//! Source positions.

use core::fmt;

/// Position of a token or node in the source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-based and count
/// characters, so a tab advances the column by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(offset: u32, line: u32, column: u32) -> Self {
        Span {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
