//! Semantic analysis driver.
//!
//! Runs declaration collection ([`crate::name_resolve`]) and then type
//! checking ([`crate::typecheck`]) over one shared tree. The symbol table
//! built by the first pass is handed to the second by value. Problems in
//! the analyzed program are collected as [`SemanticError`]s and never stop
//! the run; only a [`Fault`] in the analyzer itself ends it early.

use thiserror::Error;
use tracing::{debug, warn};

use crate::ast::Program;
use crate::config::FrontendConfig;
use crate::diagnostic::{SemanticError, SemanticErrorKind};
use crate::name_resolve::Collector;
use crate::span::Span;
use crate::typecheck::Checker;

/// Where the analyzer is. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    CollectingDeclarations,
    TypeChecking,
    Done,
}

impl Phase {
    fn successor(self) -> Option<Phase> {
        match self {
            Phase::CollectingDeclarations => Some(Phase::TypeChecking),
            Phase::TypeChecking => Some(Phase::Done),
            Phase::Done => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::CollectingDeclarations => "declaration collection",
            Phase::TypeChecking => "type checking",
            Phase::Done => "done",
        }
    }
}

/// An inconsistency inside the analyzer, as opposed to an error in the
/// analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("scope stack underflow")]
    ScopeUnderflow,
    #[error("scope #{0} was not recorded by declaration collection")]
    MissingScope(usize),
    #[error("scopes unbalanced after {phase}: {open} still open")]
    Unbalanced { phase: &'static str, open: usize },
    #[error("cannot move from {} to {}", .from.as_str(), .to.as_str())]
    PhaseOrder { from: Phase, to: Phase },
}

impl Fault {
    /// The single entry a fault contributes to the error list.
    pub fn into_error(self) -> SemanticError {
        SemanticError::new(
            SemanticErrorKind::Internal,
            format!("internal error: {self}"),
            Span::new(0, 0, 0),
        )
    }
}

/// Outcome of analyzing one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Declaration errors first, then type errors, each in traversal order.
    pub errors: Vec<SemanticError>,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn analyze(program: &Program) -> Analysis {
    analyze_with_config(program, &FrontendConfig::default())
}

pub fn analyze_with_config(program: &Program, config: &FrontendConfig) -> Analysis {
    let mut errors = Vec::new();
    if let Err(fault) = run(program, config, &mut errors) {
        warn!(%fault, "semantic analysis aborted");
        errors.push(fault.into_error());
    }
    debug!(errors = errors.len(), "semantic analysis finished");
    Analysis { errors }
}

struct PhaseMachine {
    phase: Phase,
}

impl PhaseMachine {
    fn advance(&mut self, to: Phase) -> Result<(), Fault> {
        if self.phase.successor() != Some(to) {
            return Err(Fault::PhaseOrder {
                from: self.phase,
                to,
            });
        }
        debug!(from = self.phase.as_str(), to = to.as_str(), "semantic phase");
        self.phase = to;
        Ok(())
    }
}

fn run(
    program: &Program,
    config: &FrontendConfig,
    errors: &mut Vec<SemanticError>,
) -> Result<(), Fault> {
    let mut machine = PhaseMachine {
        phase: Phase::CollectingDeclarations,
    };

    let mut collector = Collector::new(config);
    let collected = collector.collect(program);
    let (table, declaration_errors) = collector.finish();
    errors.extend(declaration_errors);
    collected?;

    machine.advance(Phase::TypeChecking)?;
    let mut checker = Checker::new(table, config);
    let checked = checker.check(program);
    errors.extend(checker.finish());
    checked?;

    machine.advance(Phase::Done)
}
