//! Transition function of the lexer automaton.
//!
//! The automaton is deterministic: every `(State, CharClass)` pair maps to
//! exactly one [`Step`]. Accepting is always decided on lookahead, so an
//! accepted token never includes the character that was inspected to accept
//! it. The lexer driver in [`crate::lexer`] owns positions and output; this
//! module only knows about characters.

/// Character classes that select transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Letter,
    Underscore,
    Digit,
    Dot,
    Quote(char),
    Backslash,
    Hash,
    Tilde,
    /// `+ - * / % = ! < >`
    Operator(char),
    /// `( ) [ ] , : ;`
    Delimiter(char),
    Space,
    Newline,
    Other(char),
    End,
}

pub fn classify(ch: Option<char>) -> CharClass {
    let Some(ch) = ch else {
        return CharClass::End;
    };
    match ch {
        'a'..='z' | 'A'..='Z' => CharClass::Letter,
        '_' => CharClass::Underscore,
        '0'..='9' => CharClass::Digit,
        '.' => CharClass::Dot,
        '\'' | '"' => CharClass::Quote(ch),
        '\\' => CharClass::Backslash,
        '#' => CharClass::Hash,
        '~' => CharClass::Tilde,
        '+' | '-' | '*' | '/' | '%' | '=' | '!' | '<' | '>' => CharClass::Operator(ch),
        '(' | ')' | '[' | ']' | ',' | ':' | ';' => CharClass::Delimiter(ch),
        ' ' | '\t' | '\r' => CharClass::Space,
        '\n' => CharClass::Newline,
        other => CharClass::Other(other),
    }
}

/// Whether `ch` ends a run of garbage during error resynchronization.
pub fn is_boundary(ch: char) -> bool {
    matches!(
        classify(Some(ch)),
        CharClass::Space
            | CharClass::Newline
            | CharClass::Operator(_)
            | CharClass::Delimiter(_)
            | CharClass::Quote(_)
            | CharClass::Hash
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    Blank,
    Ident,
    /// Saw `~`, a digit must follow.
    NegSign,
    Int,
    /// Saw `digits .`
    FracStart,
    Frac,
    /// Saw `e` / `E` after a number.
    ExpStart,
    ExpSign,
    Exp,
    Str { quote: char },
    StrEscape { quote: char },
    StrClose,
    /// Saw `#`.
    Hash1,
    /// Saw `##`.
    Hash2,
    LineComment,
    BlockComment,
    BlockHash1,
    BlockHash2,
    BlockEnd,
    Symbol { first: char, second: Option<char> },
}

/// What kind of lexeme an accepting transition completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Ident,
    Int,
    Float,
    Str,
    Symbol,
    /// Whitespace, newlines and comments: consumed but not emitted.
    Skip,
}

/// Why the automaton gave up on the current lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidCharacter,
    UnterminatedString,
    UnterminatedComment,
    MalformedNumber,
    InvalidDelimiter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Consume the character and move to the state.
    Continue(State),
    /// The lexeme ended before the inspected character.
    Accept(Accepted),
    /// The inspected character cannot continue the lexeme.
    Reject(Rejection),
}

pub fn step(state: State, ch: Option<char>) -> Step {
    use CharClass as C;
    use State as S;
    use Step::{Accept, Continue, Reject};

    let class = classify(ch);
    match state {
        S::Start => match class {
            C::Letter | C::Underscore => Continue(S::Ident),
            C::Digit => Continue(S::Int),
            C::Tilde => Continue(S::NegSign),
            C::Quote(quote) => Continue(S::Str { quote }),
            C::Hash => Continue(S::Hash1),
            C::Operator(first) | C::Delimiter(first) => Continue(S::Symbol {
                first,
                second: None,
            }),
            C::Space | C::Newline => Continue(S::Blank),
            C::Dot | C::Backslash | C::Other(_) | C::End => Reject(Rejection::InvalidCharacter),
        },

        S::Blank => match class {
            C::Space | C::Newline => Continue(S::Blank),
            _ => Accept(Accepted::Skip),
        },

        S::Ident => match class {
            C::Letter | C::Underscore | C::Digit => Continue(S::Ident),
            C::Quote(_) | C::Dot | C::Tilde => Reject(Rejection::InvalidDelimiter),
            _ => Accept(Accepted::Ident),
        },

        // Numbers.
        S::NegSign => match class {
            C::Digit => Continue(S::Int),
            _ => Reject(Rejection::MalformedNumber),
        },
        S::Int => match class {
            C::Digit => Continue(S::Int),
            C::Dot => Continue(S::FracStart),
            C::Letter if is_exponent_marker(ch) => Continue(S::ExpStart),
            _ if !follows_literal(class) => Reject(Rejection::InvalidDelimiter),
            _ => Accept(Accepted::Int),
        },
        S::FracStart => match class {
            C::Digit => Continue(S::Frac),
            _ => Reject(Rejection::MalformedNumber),
        },
        S::Frac => match class {
            C::Digit => Continue(S::Frac),
            C::Letter if is_exponent_marker(ch) => Continue(S::ExpStart),
            _ if !follows_literal(class) => Reject(Rejection::InvalidDelimiter),
            _ => Accept(Accepted::Float),
        },
        S::ExpStart => match class {
            C::Digit => Continue(S::Exp),
            C::Operator('+') | C::Operator('-') => Continue(S::ExpSign),
            _ => Reject(Rejection::MalformedNumber),
        },
        S::ExpSign => match class {
            C::Digit => Continue(S::Exp),
            _ => Reject(Rejection::MalformedNumber),
        },
        S::Exp => match class {
            C::Digit => Continue(S::Exp),
            _ if !follows_literal(class) => Reject(Rejection::InvalidDelimiter),
            _ => Accept(Accepted::Float),
        },

        // Strings. Escapes are validated by the driver when it unescapes the
        // lexeme; here a backslash only protects the next character.
        S::Str { quote } => match class {
            C::Quote(q) if q == quote => Continue(S::StrClose),
            C::Backslash => Continue(S::StrEscape { quote }),
            C::Newline | C::End => Reject(Rejection::UnterminatedString),
            _ => Continue(S::Str { quote }),
        },
        S::StrEscape { quote } => match class {
            C::Newline | C::End => Reject(Rejection::UnterminatedString),
            _ => Continue(S::Str { quote }),
        },
        S::StrClose if !follows_literal(class) => Reject(Rejection::InvalidDelimiter),
        S::StrClose => Accept(Accepted::Str),

        // Comments: `# ...` to end of line, `### ... ###` blocks.
        S::Hash1 => match class {
            C::Hash => Continue(S::Hash2),
            C::Newline | C::End => Accept(Accepted::Skip),
            _ => Continue(S::LineComment),
        },
        S::Hash2 => match class {
            C::Hash => Continue(S::BlockComment),
            C::Newline | C::End => Accept(Accepted::Skip),
            _ => Continue(S::LineComment),
        },
        S::LineComment => match class {
            C::Newline | C::End => Accept(Accepted::Skip),
            _ => Continue(S::LineComment),
        },
        S::BlockComment => match class {
            C::Hash => Continue(S::BlockHash1),
            C::End => Reject(Rejection::UnterminatedComment),
            _ => Continue(S::BlockComment),
        },
        S::BlockHash1 => match class {
            C::Hash => Continue(S::BlockHash2),
            C::End => Reject(Rejection::UnterminatedComment),
            _ => Continue(S::BlockComment),
        },
        S::BlockHash2 => match class {
            C::Hash => Continue(S::BlockEnd),
            C::End => Reject(Rejection::UnterminatedComment),
            _ => Continue(S::BlockComment),
        },
        S::BlockEnd => Accept(Accepted::Skip),

        S::Symbol {
            first,
            second: None,
        } => match ch {
            Some(next) if forms_pair(first, next) => Continue(S::Symbol {
                first,
                second: Some(next),
            }),
            _ if matches!(first, ')' | ']') && !follows_closer(class) => {
                Reject(Rejection::InvalidDelimiter)
            }
            _ => Accept(Accepted::Symbol),
        },
        S::Symbol { .. } => Accept(Accepted::Symbol),
    }
}

/// What may directly follow a number or string literal: blanks, comments,
/// operators and the delimiters that can close or separate an operand.
fn follows_literal(class: CharClass) -> bool {
    match class {
        CharClass::Space | CharClass::Newline | CharClass::Hash | CharClass::End => true,
        CharClass::Operator(_) | CharClass::Other(_) => true,
        CharClass::Delimiter(ch) => !matches!(ch, '(' | '['),
        CharClass::Letter
        | CharClass::Underscore
        | CharClass::Digit
        | CharClass::Dot
        | CharClass::Quote(_)
        | CharClass::Backslash
        | CharClass::Tilde => false,
    }
}

/// What may directly follow `)` or `]`. Brackets chain (`grid[0][1]`).
fn follows_closer(class: CharClass) -> bool {
    match class {
        CharClass::Delimiter(_) => true,
        CharClass::Letter
        | CharClass::Underscore
        | CharClass::Digit
        | CharClass::Dot
        | CharClass::Quote(_)
        | CharClass::Tilde => false,
        _ => true,
    }
}

fn is_exponent_marker(ch: Option<char>) -> bool {
    matches!(ch, Some('e' | 'E'))
}

/// Two-character operators: `++ -- ** // == != <= >=`.
fn forms_pair(first: char, second: char) -> bool {
    matches!(
        (first, second),
        ('+', '+') | ('-', '-') | ('*', '*') | ('/', '/') | ('=', '=') | ('!', '=') | ('<', '=') | ('>', '=')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the automaton over `input` from `Start` and report how the
    /// first lexeme ended together with the number of characters consumed.
    fn run(input: &str) -> (Step, usize) {
        let chars: Vec<char> = input.chars().collect();
        let mut state = State::Start;
        let mut consumed = 0;
        loop {
            match step(state, chars.get(consumed).copied()) {
                Step::Continue(next) => {
                    state = next;
                    consumed += 1;
                }
                done => return (done, consumed),
            }
        }
    }

    #[test]
    fn identifiers_stop_at_operators() {
        assert_eq!(run("abc_1+"), (Step::Accept(Accepted::Ident), 5));
    }

    #[test]
    fn numbers_take_fraction_and_exponent() {
        assert_eq!(run("12 "), (Step::Accept(Accepted::Int), 2));
        assert_eq!(run("~12)"), (Step::Accept(Accepted::Int), 3));
        assert_eq!(run("3.25,"), (Step::Accept(Accepted::Float), 4));
        assert_eq!(run("1.5e-3 "), (Step::Accept(Accepted::Float), 6));
        assert_eq!(run("2E8"), (Step::Accept(Accepted::Float), 3));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert_eq!(run("1. "), (Step::Reject(Rejection::MalformedNumber), 2));
        assert_eq!(run("1e+"), (Step::Reject(Rejection::MalformedNumber), 3));
        assert_eq!(run("~x"), (Step::Reject(Rejection::MalformedNumber), 1));
        assert_eq!(run("12ab"), (Step::Reject(Rejection::InvalidDelimiter), 2));
    }

    #[test]
    fn tokens_check_what_follows_them() {
        assert_eq!(run("1("), (Step::Reject(Rejection::InvalidDelimiter), 1));
        assert_eq!(run("2.5["), (Step::Reject(Rejection::InvalidDelimiter), 3));
        assert_eq!(run("'a'b"), (Step::Reject(Rejection::InvalidDelimiter), 3));
        assert_eq!(run("x'y'"), (Step::Reject(Rejection::InvalidDelimiter), 1));
        assert_eq!(run(")x"), (Step::Reject(Rejection::InvalidDelimiter), 1));
        assert_eq!(run("]5"), (Step::Reject(Rejection::InvalidDelimiter), 1));

        assert_eq!(run("f("), (Step::Accept(Accepted::Ident), 1));
        assert_eq!(run("1)"), (Step::Accept(Accepted::Int), 1));
        assert_eq!(run("'a',"), (Step::Accept(Accepted::Str), 3));
        assert_eq!(run("][1]"), (Step::Accept(Accepted::Symbol), 1));
        assert_eq!(run(") and"), (Step::Accept(Accepted::Symbol), 1));
    }

    #[test]
    fn strings_respect_their_quote_and_escapes() {
        assert_eq!(run("'it\\'s' "), (Step::Accept(Accepted::Str), 7));
        assert_eq!(run("\"a'b\""), (Step::Accept(Accepted::Str), 5));
        assert_eq!(
            run("'open\nnext"),
            (Step::Reject(Rejection::UnterminatedString), 5)
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(run("# note\nx"), (Step::Accept(Accepted::Skip), 6));
        assert_eq!(run("### a\n# b ###x"), (Step::Accept(Accepted::Skip), 13));
        assert_eq!(
            run("### never closed"),
            (Step::Reject(Rejection::UnterminatedComment), 16)
        );
    }

    #[test]
    fn two_character_operators_use_longest_match() {
        assert_eq!(run("**2"), (Step::Accept(Accepted::Symbol), 2));
        assert_eq!(run("<=x"), (Step::Accept(Accepted::Symbol), 2));
        assert_eq!(run("=!"), (Step::Accept(Accepted::Symbol), 1));
        assert_eq!(run("(("), (Step::Accept(Accepted::Symbol), 1));
    }

    #[test]
    fn stray_characters_are_rejected_at_start() {
        assert_eq!(run("@"), (Step::Reject(Rejection::InvalidCharacter), 0));
        assert_eq!(run("."), (Step::Reject(Rejection::InvalidCharacter), 0));
    }
}
