//! Lexer for Chungus source text.
//!
//! The character-level work is done by the automaton in [`crate::dfa`];
//! this module feeds it characters, tracks positions, classifies accepted
//! lexemes into [`TokenKind`]s and records lexical errors.

use tracing::{debug, trace};

use crate::dfa::{self, Accepted, Rejection, State, Step};
use crate::diagnostic::{LexError, LexErrorKind};
use crate::span::Span;

/// Longest accepted integer literal, in digits.
pub const MAX_INT_DIGITS: usize = 19;

/// Most digits after the decimal point of a float literal.
pub const MAX_FRACTION_DIGITS: usize = 6;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    Eof,

    // Identifiers and literals
    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    BoolLiteral, // true / false

    // Keywords
    Always,
    And,
    ArrayAdd,
    ArrayRemove,
    Close,
    Elif,
    Else,
    Fail,
    Float,
    Fn,
    For,
    If,
    In,
    Int,
    Or,
    Range,
    Read,
    Ret,
    Show,
    Todo,
    Try,
    While,

    // Operators
    Plus,         // +
    PlusPlus,     // ++
    Minus,        // -
    MinusMinus,   // --
    Star,         // *
    StarStar,     // **
    Slash,        // /
    SlashSlash,   // //
    Percent,      // %
    Equal,        // =
    EqualEqual,   // ==
    Bang,         // !
    BangEqual,    // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=

    // Delimiters
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
}

impl TokenKind {
    /// Name used in diagnostics: the surface spelling for keywords and
    /// symbols, a category name for everything else.
    pub fn as_str(self) -> &'static str {
        use TokenKind::*;
        match self {
            Eof => "EOF",
            Ident => "id",
            IntLiteral => "int_literal",
            FloatLiteral => "float_literal",
            StringLiteral => "str_literal",
            BoolLiteral => "bool_literal",
            Always => "always",
            And => "and",
            ArrayAdd => "array_add",
            ArrayRemove => "array_remove",
            Close => "close",
            Elif => "elif",
            Else => "else",
            Fail => "fail",
            Float => "float",
            Fn => "fn",
            For => "for",
            If => "if",
            In => "in",
            Int => "int",
            Or => "or",
            Range => "range",
            Read => "read",
            Ret => "ret",
            Show => "show",
            Todo => "todo",
            Try => "try",
            While => "while",
            Plus => "+",
            PlusPlus => "++",
            Minus => "-",
            MinusMinus => "--",
            Star => "*",
            StarStar => "**",
            Slash => "/",
            SlashSlash => "//",
            Percent => "%",
            Equal => "=",
            EqualEqual => "==",
            Bang => "!",
            BangEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            Comma => ",",
            Colon => ":",
            Semicolon => ";",
        }
    }

    pub fn is_keyword(self) -> bool {
        keyword(self.as_str()) == Some(self)
    }
}

/// Resolve an identifier-shaped lexeme against the keyword table.
pub fn keyword(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "always" => TokenKind::Always,
        "and" => TokenKind::And,
        "array_add" => TokenKind::ArrayAdd,
        "array_remove" => TokenKind::ArrayRemove,
        "close" => TokenKind::Close,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "fail" => TokenKind::Fail,
        "float" => TokenKind::Float,
        "fn" => TokenKind::Fn,
        "for" => TokenKind::For,
        "if" => TokenKind::If,
        "in" => TokenKind::In,
        "int" => TokenKind::Int,
        "or" => TokenKind::Or,
        "range" => TokenKind::Range,
        "read" => TokenKind::Read,
        "ret" => TokenKind::Ret,
        "show" => TokenKind::Show,
        "todo" => TokenKind::Todo,
        "try" => TokenKind::Try,
        "while" => TokenKind::While,
        "true" | "false" => TokenKind::BoolLiteral,
        _ => return None,
    };
    Some(kind)
}

/// Digits between `.` and the exponent, if any.
fn fraction_digits(text: &str) -> usize {
    text.split_once('.')
        .map(|(_, rest)| rest.chars().take_while(char::is_ascii_digit).count())
        .unwrap_or(0)
}

fn symbol(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "+" => TokenKind::Plus,
        "++" => TokenKind::PlusPlus,
        "-" => TokenKind::Minus,
        "--" => TokenKind::MinusMinus,
        "*" => TokenKind::Star,
        "**" => TokenKind::StarStar,
        "/" => TokenKind::Slash,
        "//" => TokenKind::SlashSlash,
        "%" => TokenKind::Percent,
        "=" => TokenKind::Equal,
        "==" => TokenKind::EqualEqual,
        "!" => TokenKind::Bang,
        "!=" => TokenKind::BangEqual,
        "<" => TokenKind::Less,
        "<=" => TokenKind::LessEqual,
        ">" => TokenKind::Greater,
        ">=" => TokenKind::GreaterEqual,
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        "[" => TokenKind::LBracket,
        "]" => TokenKind::RBracket,
        "," => TokenKind::Comma,
        ":" => TokenKind::Colon,
        ";" => TokenKind::Semicolon,
        _ => return None,
    };
    Some(kind)
}

/// A single token.
///
/// For string literals `lexeme` holds the unescaped value without quotes;
/// for everything else it is the source text of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }
}

/// Result of lexing a source string.
#[derive(Debug)]
pub struct LexResult {
    /// Always ends with exactly one [`TokenKind::Eof`] token.
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

/// Lex a source string into tokens.
pub fn lex(source: &str) -> LexResult {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        index: 0,
        offset: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    debug!(
        tokens = lexer.tokens.len(),
        errors = lexer.errors.len(),
        "lexing finished"
    );
    LexResult {
        tokens: lexer.tokens,
        errors: lexer.errors,
    }
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    offset: u32,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl Lexer {
    fn run(&mut self) {
        while self.peek_char().is_some() {
            let start_index = self.index;
            let start = self.position();
            let mut state = State::Start;

            loop {
                match dfa::step(state, self.peek_char()) {
                    Step::Continue(next) => {
                        self.consume_char();
                        state = next;
                    }
                    Step::Accept(accepted) => {
                        self.accept(accepted, start_index, start);
                        break;
                    }
                    Step::Reject(rejection) => {
                        self.reject(rejection, start_index, start);
                        break;
                    }
                }
            }
        }

        let end = self.position();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            span: end,
        });
    }

    fn accept(&mut self, accepted: Accepted, start_index: usize, start: Span) {
        let text = self.text(start_index);
        let kind = match accepted {
            Accepted::Skip => return,
            Accepted::Ident => keyword(&text).unwrap_or(TokenKind::Ident),
            Accepted::Int => {
                let digits = text.trim_start_matches('~').len();
                if digits > MAX_INT_DIGITS {
                    self.error(LexErrorKind::IntegerTooLong(text), start);
                    return;
                }
                TokenKind::IntLiteral
            }
            Accepted::Float => {
                if fraction_digits(&text) > MAX_FRACTION_DIGITS {
                    self.error(LexErrorKind::FractionTooLong(text), start);
                    return;
                }
                TokenKind::FloatLiteral
            }
            Accepted::Str => {
                let value = self.unescape(start_index, start);
                self.push(TokenKind::StringLiteral, value, start);
                return;
            }
            Accepted::Symbol => match symbol(&text) {
                Some(kind) => kind,
                None => {
                    let ch = text.chars().next().unwrap_or('\0');
                    self.error(LexErrorKind::InvalidCharacter(ch), start);
                    return;
                }
            },
        };
        self.push(kind, text, start);
    }

    fn reject(&mut self, rejection: Rejection, start_index: usize, start: Span) {
        let kind = match rejection {
            Rejection::InvalidCharacter => {
                let ch = self.peek_char().unwrap_or('\0');
                self.consume_char();
                LexErrorKind::InvalidCharacter(ch)
            }
            Rejection::UnterminatedString => LexErrorKind::UnterminatedString,
            Rejection::UnterminatedComment => LexErrorKind::UnterminatedComment,
            Rejection::MalformedNumber => {
                let mut lexeme = self.text(start_index);
                if let Some(ch) = self.peek_char().filter(|ch| !dfa::is_boundary(*ch)) {
                    lexeme.push(ch);
                }
                LexErrorKind::MalformedNumber(lexeme)
            }
            Rejection::InvalidDelimiter => LexErrorKind::InvalidDelimiter {
                lexeme: self.text(start_index),
                found: self.peek_char().unwrap_or('\0'),
            },
        };
        self.error(kind, start);
        self.resync();
    }

    /// Skip to the next whitespace / delimiter boundary.
    fn resync(&mut self) {
        let from = self.position();
        while let Some(ch) = self.peek_char() {
            if dfa::is_boundary(ch) {
                break;
            }
            self.consume_char();
        }
        if self.position() != from {
            trace!(%from, to = %self.position(), "lexer resynchronized");
        }
    }

    /// Decode the body of the string literal that starts at `start_index`.
    /// Invalid escapes are reported and kept verbatim.
    fn unescape(&mut self, start_index: usize, start: Span) -> String {
        let body = &self.chars[start_index + 1..self.index - 1];
        let mut value = String::with_capacity(body.len());
        let mut bad_escapes = Vec::new();
        let mut column = start.column + 1;
        let mut offset = start.offset + 1;

        let mut chars = body.iter().copied();
        while let Some(ch) = chars.next() {
            // String literals never span lines.
            let here = Span::new(offset, start.line, column);
            offset += ch.len_utf8() as u32;
            column += 1;
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            let Some(escaped) = chars.next() else {
                break;
            };
            offset += escaped.len_utf8() as u32;
            column += 1;
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                '\\' | '\'' | '"' => value.push(escaped),
                other => {
                    bad_escapes.push((other, here));
                    value.push('\\');
                    value.push(other);
                }
            }
        }

        for (ch, span) in bad_escapes {
            self.error(LexErrorKind::InvalidEscape(ch), span);
        }
        value
    }

    fn push(&mut self, kind: TokenKind, lexeme: String, span: Span) {
        self.tokens.push(Token { kind, lexeme, span });
    }

    fn error(&mut self, kind: LexErrorKind, span: Span) {
        trace!(%span, %kind, "lexical error");
        self.errors.push(LexError::new(kind, span));
    }

    fn text(&self, start_index: usize) -> String {
        self.chars[start_index..self.index].iter().collect()
    }

    fn position(&self) -> Span {
        Span::new(self.offset, self.line, self.column)
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn consume_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.index += 1;
            self.offset += ch.len_utf8() as u32;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_assignment_statement() {
        let result = lex("total = price * 2");
        assert!(result.errors.is_empty());
        assert_eq!(
            kinds("total = price * 2"),
            vec![
                TokenKind::Ident,
                TokenKind::Equal,
                TokenKind::Ident,
                TokenKind::Star,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
        assert_eq!(result.tokens[2].lexeme, "price");
    }

    #[test]
    fn resolves_keywords_after_matching() {
        assert_eq!(
            kinds("fn show shows close closed true"),
            vec![
                TokenKind::Fn,
                TokenKind::Show,
                TokenKind::Ident,
                TokenKind::Close,
                TokenKind::Ident,
                TokenKind::BoolLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_lines_and_columns() {
        let result = lex("x = 1\n  show x");
        let show = &result.tokens[3];
        assert_eq!(show.kind, TokenKind::Show);
        assert_eq!((show.line(), show.column()), (2, 3));
        let eof = result.tokens.last().expect("eof");
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!((eof.line(), eof.column()), (2, 9));
    }

    #[test]
    fn skips_comments() {
        let source = "# heading\nx = 1 # trailing\n###\nblock ###\nshow x";
        let result = lex(source);
        assert!(result.errors.is_empty());
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Equal,
                TokenKind::IntLiteral,
                TokenKind::Show,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unescapes_string_literals() {
        let result = lex(r#"show 'a\tb\'c' "q""#);
        assert!(result.errors.is_empty());
        assert_eq!(result.tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(result.tokens[1].lexeme, "a\tb'c");
        assert_eq!(result.tokens[2].lexeme, "q");
    }

    #[test]
    fn invalid_escape_is_reported_once_and_string_is_kept() {
        let result = lex(r"s = 'a\qb'");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, LexErrorKind::InvalidEscape('q'));
        assert_eq!(result.errors[0].column, 7);
        assert_eq!(result.tokens[2].lexeme, "a\\qb");
    }

    #[test]
    fn one_invalid_character_keeps_surrounding_tokens() {
        let result = lex("a = 1 @ b = 2");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, LexErrorKind::InvalidCharacter('@'));
        assert_eq!((result.errors[0].line, result.errors[0].column), (1, 7));
        let lexemes: Vec<&str> = result.tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["a", "=", "1", "b", "=", "2", ""]);
    }

    #[test]
    fn resynchronizes_to_the_next_boundary() {
        let result = lex("x = $$junk + 1");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            kinds("x = $$junk + 1"),
            vec![
                TokenKind::Ident,
                TokenKind::Equal,
                TokenKind::Plus,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_does_not_swallow_next_line() {
        let result = lex("show 'oops\nshow x");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, LexErrorKind::UnterminatedString);
        assert_eq!(result.errors[0].to_string(), "1:6 unterminated string literal");
        assert_eq!(
            kinds("show 'oops\nshow x"),
            vec![TokenKind::Show, TokenKind::Show, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let result = lex("x = 1\n### never closed");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, LexErrorKind::UnterminatedComment);
        assert_eq!(result.errors[0].line, 2);
    }

    #[test]
    fn number_followed_by_letters_is_an_invalid_delimiter() {
        let result = lex("x = 12ab + 3");
        assert_eq!(
            result.errors[0].kind,
            LexErrorKind::InvalidDelimiter {
                lexeme: "12".to_string(),
                found: 'a',
            }
        );
        assert_eq!(
            kinds("x = 12ab + 3"),
            vec![
                TokenKind::Ident,
                TokenKind::Equal,
                TokenKind::Plus,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn negative_and_float_literals() {
        let result = lex("a = ~42 + 3.5e2 - 0.25");
        assert!(result.errors.is_empty());
        let literals: Vec<(TokenKind, &str)> = result
            .tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::IntLiteral | TokenKind::FloatLiteral))
            .map(|t| (t.kind, t.lexeme.as_str()))
            .collect();
        assert_eq!(
            literals,
            vec![
                (TokenKind::IntLiteral, "~42"),
                (TokenKind::FloatLiteral, "3.5e2"),
                (TokenKind::FloatLiteral, "0.25"),
            ]
        );
    }

    #[test]
    fn rejects_overlong_integers() {
        let result = lex("n = 12345678901234567890");
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0].kind,
            LexErrorKind::IntegerTooLong(_)
        ));
        assert!(lex("n = 1234567890123456789").errors.is_empty());
    }

    #[test]
    fn rejects_overlong_fractions() {
        let result = lex("f = 0.1234567 + 1.5");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].kind,
            LexErrorKind::FractionTooLong("0.1234567".to_string())
        );
        assert_eq!(result.errors[0].column, 5);
        assert_eq!(
            kinds("f = 0.1234567 + 1.5"),
            vec![
                TokenKind::Ident,
                TokenKind::Equal,
                TokenKind::Plus,
                TokenKind::FloatLiteral,
                TokenKind::Eof,
            ]
        );
        assert!(lex("f = 0.123456 + 2.5e10").errors.is_empty());
    }

    #[test]
    fn literals_and_closers_need_a_delimiter_after_them() {
        let cases = [
            ("x = f 1(2)", "1", '('),
            ("s = 'a'b", "'a'", 'b'),
            ("show x'y'", "x", '\''),
            ("v = (1)2", ")", '2'),
        ];
        for (source, lexeme, found) in cases {
            let result = lex(source);
            assert_eq!(result.errors.len(), 1, "{source}");
            assert_eq!(
                result.errors[0].kind,
                LexErrorKind::InvalidDelimiter {
                    lexeme: lexeme.to_string(),
                    found,
                },
                "{source}"
            );
        }
        assert!(lex("g[0][1] = f(x) + 'a'").errors.is_empty());
    }

    #[test]
    fn malformed_float_is_reported() {
        let result = lex("x = 1. + 2");
        assert_eq!(
            result.errors[0].kind,
            LexErrorKind::MalformedNumber("1.".to_string())
        );
    }

    #[test]
    fn operators_use_longest_match() {
        assert_eq!(
            kinds("a ** b // c != d <= e ++"),
            vec![
                TokenKind::Ident,
                TokenKind::StarStar,
                TokenKind::Ident,
                TokenKind::SlashSlash,
                TokenKind::Ident,
                TokenKind::BangEqual,
                TokenKind::Ident,
                TokenKind::LessEqual,
                TokenKind::Ident,
                TokenKind::PlusPlus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn empty_source_yields_only_eof() {
        let result = lex("");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Eof);
        assert_eq!((result.tokens[0].line(), result.tokens[0].column()), (1, 1));
    }

    #[test]
    fn keyword_table_round_trips_through_names() {
        assert!(TokenKind::ArrayRemove.is_keyword());
        assert!(!TokenKind::Ident.is_keyword());
        assert!(!TokenKind::Plus.is_keyword());
    }
}
