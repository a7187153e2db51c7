//! Front-end driver.
//!
//! Runs lexer, parser and semantic analyzer in order. Each stage always runs
//! to completion and reports everything it found; the driver stops at the
//! first stage that reported anything and returns that stage's errors.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ast::Program;
use crate::config::FrontendConfig;
use crate::error::CoreError;
use crate::lexer::{Token, lex};
use crate::parser::parse_with_config;
use crate::semantic::analyze_with_config;

/// A program that passed every front-end stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedProgram {
    pub tokens: Vec<Token>,
    pub program: Program,
}

pub fn load_source(path: impl AsRef<Path>) -> Result<String, CoreError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = source.len(), "source loaded");
    Ok(source)
}

/// Lexical stage only.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CoreError> {
    let lexed = lex(source);
    if !lexed.errors.is_empty() {
        return Err(CoreError::Lexical(lexed.errors));
    }
    Ok(lexed.tokens)
}

/// Lexical and syntax stages.
pub fn parse_source(source: &str, config: &FrontendConfig) -> Result<CheckedProgram, CoreError> {
    let tokens = tokenize(source)?;
    let parsed = parse_with_config(&tokens, source, config);
    if !parsed.errors.is_empty() {
        return Err(CoreError::Syntax(parsed.errors));
    }
    // Without syntax errors there was at least an end-of-input token.
    let program = parsed.program.unwrap_or_default();
    Ok(CheckedProgram { tokens, program })
}

/// All three stages.
pub fn check_source(source: &str, config: &FrontendConfig) -> Result<CheckedProgram, CoreError> {
    let checked = parse_source(source, config)?;
    let analysis = analyze_with_config(&checked.program, config);
    if !analysis.errors.is_empty() {
        return Err(CoreError::Semantic(analysis.errors));
    }
    info!(
        functions = checked.program.functions.len(),
        statements = checked.program.statements.len(),
        "program checked"
    );
    Ok(checked)
}
