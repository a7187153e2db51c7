use thiserror::Error;

use crate::diagnostic::{LexError, SemanticError, SyntaxError};

/// Failure of a whole front-end run, as seen by the driver.
///
/// Each stage variant carries the complete, ordered error list of the first
/// stage that reported anything; later stages were not run.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("lexical analysis failed with {} error(s)", .0.len())]
    Lexical(Vec<LexError>),
    #[error("syntax analysis failed with {} error(s)", .0.len())]
    Syntax(Vec<SyntaxError>),
    #[error("semantic analysis failed with {} error(s)", .0.len())]
    Semantic(Vec<SemanticError>),
}

impl CoreError {
    /// Name of the stage that failed, for reporting.
    pub fn stage(&self) -> &'static str {
        match self {
            CoreError::SourceIo(_) => "input",
            CoreError::Lexical(_) => "lexical",
            CoreError::Syntax(_) => "syntax",
            CoreError::Semantic(_) => "semantic",
        }
    }
}
