//! Diagnostics produced by the three front-end stages.
//!
//! Each stage has its own taxonomy. Errors are plain data: a stage appends
//! them to its list and keeps going, so none of these types is ever used as
//! a control-flow signal inside a stage.

use thiserror::Error;

use crate::span::Span;

const TAB_WIDTH: usize = 4;

/// Common view over lexical, syntax and semantic errors.
pub trait Diagnostic {
    fn line(&self) -> u32;
    fn column(&self) -> u32;
    /// Human message without the position prefix.
    fn message(&self) -> String;
}

// ---------------------------------------------------------------------
// Lexical
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated block comment: expected '###'")]
    UnterminatedComment,
    #[error("malformed number literal '{0}'")]
    MalformedNumber(String),
    #[error("invalid delimiter '{found}' after '{lexeme}'")]
    InvalidDelimiter { lexeme: String, found: char },
    #[error("integer literal '{0}' exceeds 19 digits")]
    IntegerTooLong(String),
    #[error("float literal '{0}' exceeds 6 fraction digits")]
    FractionTooLong(String),
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column} {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: u32,
    pub column: u32,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        LexError {
            kind,
            line: span.line,
            column: span.column,
        }
    }
}

impl Diagnostic for LexError {
    fn line(&self) -> u32 {
        self.line
    }

    fn column(&self) -> u32 {
        self.column
    }

    fn message(&self) -> String {
        self.kind.to_string()
    }
}

// ---------------------------------------------------------------------
// Syntax
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unexpected token in {context}: {found}; expected any: {}", quote_list(.expected))]
    UnexpectedToken {
        context: &'static str,
        found: String,
        expected: Vec<&'static str>,
    },
    #[error("unexpected end of input in {context}; expected any: {}", quote_list(.expected))]
    MissingToken {
        context: &'static str,
        expected: Vec<&'static str>,
    },
    #[error("function definitions must come before any statement")]
    MisplacedFunction,
    #[error("arrays support at most two index dimensions")]
    TooManyDimensions,
    #[error("nesting too deep (limit {limit})")]
    NestingTooDeep { limit: usize },
    #[error("integer literal '{0}' is out of range")]
    InvalidLiteral(String),
    #[error("float literal '{0}' is out of range")]
    FloatOutOfRange(String),
}

fn quote_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column} {kind}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: u32,
    pub column: u32,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: Span) -> Self {
        SyntaxError {
            kind,
            line: span.line,
            column: span.column,
        }
    }
}

impl Diagnostic for SyntaxError {
    fn line(&self) -> u32 {
        self.line
    }

    fn column(&self) -> u32 {
        self.column
    }

    fn message(&self) -> String {
        self.kind.to_string()
    }
}

// ---------------------------------------------------------------------
// Semantic
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorKind {
    UndefinedVariable,
    TypeMismatch,
    FunctionNotDefined,
    ArgumentCountMismatch,
    VariableAlreadyDefined,
    FunctionAlreadyDefined,
    NestingTooDeep,
    /// An implementation fault, not a problem in the analyzed program.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line {line}, Col {column}: {message}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, message: impl Into<String>, span: Span) -> Self {
        SemanticError {
            kind,
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }
}

impl Diagnostic for SemanticError {
    fn line(&self) -> u32 {
        self.line
    }

    fn column(&self) -> u32 {
        self.column
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

// ---------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------

/// Render the source line at `line` with a caret under `column`.
///
/// ```text
/// 3    |x = 1 @ 2
///      |      ^
/// ```
///
/// Tabs are expanded so the caret lines up with what a terminal shows.
/// Positions past the end of the line put the caret just after it.
pub fn caret_snippet(source: &str, line: u32, column: u32) -> String {
    let text = source
        .lines()
        .nth(line.saturating_sub(1) as usize)
        .unwrap_or("");

    let mut display = String::with_capacity(text.len());
    let mut caret_at = None;
    for (index, ch) in text.chars().enumerate() {
        if index + 1 == column as usize {
            caret_at = Some(display.chars().count());
        }
        if ch == '\t' {
            let width = TAB_WIDTH - display.chars().count() % TAB_WIDTH;
            display.extend(core::iter::repeat_n(' ', width));
        } else {
            display.push(ch);
        }
    }
    let caret_at = caret_at.unwrap_or_else(|| display.chars().count());

    format!("{line:<5}|{display}\n     |{}^", " ".repeat(caret_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_displays_position_first() {
        let err = LexError::new(LexErrorKind::InvalidCharacter('@'), Span::new(4, 1, 5));
        assert_eq!(err.to_string(), "1:5 invalid character '@'");
    }

    #[test]
    fn semantic_error_uses_line_col_format() {
        let err = SemanticError::new(
            SemanticErrorKind::UndefinedVariable,
            "undefined variable 'missing'",
            Span::new(8, 1, 9),
        );
        assert_eq!(
            err.to_string(),
            "Line 1, Col 9: undefined variable 'missing'"
        );
        assert_eq!(err.message(), "undefined variable 'missing'");
    }

    #[test]
    fn syntax_error_lists_expected_tokens() {
        let err = SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken {
                context: "function_statement",
                found: "'='".to_string(),
                expected: vec!["(", "id"],
            },
            Span::new(0, 2, 7),
        );
        assert_eq!(
            err.to_string(),
            "2:7 unexpected token in function_statement: '='; expected any: '(', 'id'"
        );
    }

    #[test]
    fn caret_points_at_column() {
        let snippet = caret_snippet("show x\nx = 1 @ 2\n", 2, 7);
        assert_eq!(snippet, "2    |x = 1 @ 2\n     |      ^");
    }

    #[test]
    fn caret_accounts_for_tabs() {
        let snippet = caret_snippet("\tx = $", 1, 6);
        assert_eq!(snippet, "1    |    x = $\n     |        ^");
    }

    #[test]
    fn caret_past_end_of_line_sits_after_text() {
        let snippet = caret_snippet("fn f(", 1, 6);
        assert_eq!(snippet, "1    |fn f(\n     |     ^");
    }
}
