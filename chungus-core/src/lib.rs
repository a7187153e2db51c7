//! Core front end for the Chungus language.
//!
//! The pipeline is:
//!
//!   source .chg
//!     -> lexer         (tokens, driven by the dfa)
//!     -> parser        (AST)
//!     -> name_resolve  (symbol table, pass 1)
//!     -> typecheck     (inferred types, pass 2)
//!
//! Every stage collects all of its diagnostics instead of stopping at the
//! first one. The CLI and any other tool should go through [`compiler`]
//! rather than wiring the stages together themselves.

// ---------------------------------------------------------------------
// Error handling, diagnostics and configuration
// ---------------------------------------------------------------------

pub mod span;
pub mod diagnostic;
pub mod error;
pub mod config;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod dfa;
pub mod lexer;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, symbols, name resolution, type checking
// ---------------------------------------------------------------------

pub mod types;
pub mod symbols;
pub mod name_resolve;
pub mod typecheck;
pub mod semantic;

// ---------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------

pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CheckedProgram, check_source, load_source, parse_source, tokenize};
pub use config::FrontendConfig;
pub use diagnostic::{Diagnostic, caret_snippet};
pub use error::CoreError;
