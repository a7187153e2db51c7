//! Declaration collection, the first semantic pass.
//!
//! Walks the tree depth-first and fills the symbol table: functions and
//! their parameters, plus every variable the first time it is assigned.
//! Variables get a placeholder type here; type checking refines it.

use tracing::debug;

use crate::ast::{Function, Name, Program, Stmt, StmtKind};
use crate::config::FrontendConfig;
use crate::diagnostic::{SemanticError, SemanticErrorKind};
use crate::semantic::Fault;
use crate::symbols::{Symbol, SymbolTable};

pub struct Collector {
    table: SymbolTable,
    errors: Vec<SemanticError>,
    depth: usize,
    max_depth: usize,
}

impl Collector {
    pub fn new(config: &FrontendConfig) -> Self {
        Collector {
            table: SymbolTable::new(),
            errors: Vec::new(),
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    pub fn collect(&mut self, program: &Program) -> Result<(), Fault> {
        for function in &program.functions {
            self.declare_function(function)?;
        }
        self.collect_stmts(&program.statements);

        if !self.table.is_balanced() {
            return Err(Fault::Unbalanced {
                phase: "declaration collection",
                open: self.table.level(),
            });
        }
        debug!(
            scopes = self.table.scope_count(),
            errors = self.errors.len(),
            "declarations collected"
        );
        Ok(())
    }

    /// Hand the table over to type checking.
    pub fn finish(self) -> (SymbolTable, Vec<SemanticError>) {
        (self.table, self.errors)
    }

    fn declare_function(&mut self, function: &Function) -> Result<(), Fault> {
        let name = &function.name;
        let symbol = Symbol::function(&name.text, function.params.len(), name.span);
        if self.table.declare(symbol).is_err() {
            self.errors.push(SemanticError::new(
                SemanticErrorKind::FunctionAlreadyDefined,
                format!("function '{}' is already defined", name.text),
                name.span,
            ));
        }

        self.with_scope(|c| {
            for param in &function.params {
                if c.table.declare(Symbol::parameter(&param.text, param.span)).is_err() {
                    c.errors.push(SemanticError::new(
                        SemanticErrorKind::VariableAlreadyDefined,
                        format!("parameter '{}' is already defined", param.text),
                        param.span,
                    ));
                }
            }
            c.collect_stmts(&function.body);
        })
    }

    /// Run `body` in a fresh scope that is recorded for type checking.
    fn with_scope<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> Result<T, Fault> {
        self.table.enter_new();
        let result = body(self);
        self.table.exit()?;
        Ok(result)
    }

    fn collect_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.collect_stmt(stmt);
        }
    }

    /// Too-deep statements are skipped; type checking reports them.
    fn collect_stmt(&mut self, stmt: &Stmt) {
        if self.depth >= self.max_depth {
            return;
        }
        self.depth += 1;
        match &stmt.kind {
            StmtKind::Assign { target, .. } if target.indices.is_empty() => {
                self.declare_variable(&target.name);
            }
            StmtKind::For { var, body, .. } => {
                self.declare_variable(var);
                self.collect_stmts(body);
            }
            StmtKind::If {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    self.collect_stmts(&branch.body);
                }
                if let Some(body) = otherwise {
                    self.collect_stmts(body);
                }
            }
            StmtKind::While { body, .. } => self.collect_stmts(body),
            StmtKind::Try { body, fail, always } => {
                self.collect_stmts(body);
                self.collect_stmts(fail);
                if let Some(always) = always {
                    self.collect_stmts(always);
                }
            }
            StmtKind::Assign { .. }
            | StmtKind::Output(_)
            | StmtKind::Update { .. }
            | StmtKind::Call(_)
            | StmtKind::Todo
            | StmtKind::ArrayAdd { .. }
            | StmtKind::ArrayRemove { .. } => {}
        }
        self.depth -= 1;
    }

    /// Declare `name` unless some enclosing scope already has it.
    fn declare_variable(&mut self, name: &Name) {
        match self.table.lookup(&name.text) {
            None => {
                // Cannot clash: the name is not visible at all.
                let _ = self.table.declare(Symbol::variable(&name.text, name.span));
            }
            Some(existing) if existing.is_function() && existing.level == self.table.level() => {
                self.errors.push(SemanticError::new(
                    SemanticErrorKind::VariableAlreadyDefined,
                    format!("'{}' is already defined as a function", name.text),
                    name.span,
                ));
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::symbols::SymbolKind;

    fn collect_source(source: &str) -> (SymbolTable, Vec<SemanticError>) {
        let lexed = lex(source);
        let parsed = parse(&lexed.tokens, source);
        assert!(parsed.errors.is_empty(), "syntax errors: {:?}", parsed.errors);
        let program = parsed.program.expect("program");
        let mut collector = Collector::new(&FrontendConfig::default());
        collector.collect(&program).expect("no fault");
        collector.finish()
    }

    #[test]
    fn declares_functions_and_first_assignments() {
        let (table, errors) = collect_source("fn f(a)\n  local = a\nclose\nx = 1\nx = 2\nshow x");
        assert!(errors.is_empty());
        let f = table.lookup("f").expect("f");
        assert_eq!(f.kind, SymbolKind::Function);
        assert_eq!(f.signature.as_ref().map(|s| s.params.len()), Some(1));
        let x = table.lookup("x").expect("x");
        assert_eq!(x.ty, None);
        assert_eq!(x.span.line, 4);
        assert!(table.lookup("local").is_none());
        assert!(table.is_balanced());
        assert_eq!(table.scope_count(), 2);
    }

    #[test]
    fn duplicate_function_keeps_first_definition() {
        let (table, errors) = collect_source("fn f(a)\nclose\nfn f(a, b)\nclose\nshow 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, SemanticErrorKind::FunctionAlreadyDefined);
        assert_eq!((errors[0].line, errors[0].column), (3, 4));
        let f = table.lookup("f").expect("f");
        assert_eq!(f.span.line, 1);
        assert_eq!(f.signature.as_ref().map(|s| s.params.len()), Some(1));
        assert_eq!(table.scope_count(), 3);
    }

    #[test]
    fn duplicate_parameter_is_a_redeclaration() {
        let (_, errors) = collect_source("fn f(a, a)\nclose\nshow 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, SemanticErrorKind::VariableAlreadyDefined);
        assert_eq!(errors[0].column, 9);
    }

    #[test]
    fn assigning_over_a_function_in_its_scope_is_a_redeclaration() {
        let (table, errors) = collect_source("fn f()\nclose\nf = 3");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, SemanticErrorKind::VariableAlreadyDefined);
        assert_eq!(table.lookup("f").map(|s| s.kind), Some(SymbolKind::Function));
    }

    #[test]
    fn nested_blocks_and_loop_variables_are_collected() {
        let source = "\
while go
  if a
    inner = 1
  else
    other = 2
  close
close
for i in range(3)
  try
    t = read
  fail
    f = 0
  close
close";
        let (table, errors) = collect_source(source);
        assert!(errors.is_empty());
        for name in ["inner", "other", "i", "t", "f"] {
            assert!(table.lookup(name).is_some(), "{name} not declared");
        }
        assert!(table.lookup("go").is_none());
    }

    #[test]
    fn indexed_assignment_does_not_declare() {
        let (table, _) = collect_source("grid[0] = 1");
        assert!(table.lookup("grid").is_none());
    }
}
