//! Type inference and checking, the second semantic pass.
//!
//! Expressions are inferred bottom-up into [`Inferred`]. A failed check is
//! recorded and turns into `Unknown`, which later checks pass through
//! silently so one mistake is reported once.

use tracing::debug;

use crate::ast::{
    Call, Expr, ExprKind, Function, Name, Place, Program, Stmt, StmtKind, UpdateOp,
};
use crate::config::FrontendConfig;
use crate::diagnostic::{SemanticError, SemanticErrorKind};
use crate::semantic::Fault;
use crate::span::Span;
use crate::symbols::SymbolTable;
use crate::types::{Inferred, Type, binary_result, cast_result, is_compatible, unary_result};

pub struct Checker {
    table: SymbolTable,
    errors: Vec<SemanticError>,
    depth: usize,
    max_depth: usize,
}

impl Checker {
    /// Take over the table built by declaration collection.
    pub fn new(table: SymbolTable, config: &FrontendConfig) -> Self {
        Checker {
            table,
            errors: Vec::new(),
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    pub fn check(&mut self, program: &Program) -> Result<(), Fault> {
        self.table.rewind();
        for function in &program.functions {
            self.check_function(function)?;
        }
        self.check_stmts(&program.statements);

        if !self.table.is_balanced() {
            return Err(Fault::Unbalanced {
                phase: "type checking",
                open: self.table.level(),
            });
        }
        debug!(errors = self.errors.len(), "type checking finished");
        Ok(())
    }

    pub fn finish(self) -> Vec<SemanticError> {
        self.errors
    }

    fn error(&mut self, kind: SemanticErrorKind, span: Span, message: String) {
        self.errors.push(SemanticError::new(kind, message, span));
    }

    fn mismatch(&mut self, span: Span, message: String) {
        self.error(SemanticErrorKind::TypeMismatch, span, message);
    }

    /// Run `body` inside the next scope recorded by declaration collection.
    fn with_scope<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> Result<T, Fault> {
        self.table.reenter_next()?;
        let result = body(self);
        self.table.exit()?;
        Ok(result)
    }

    /// Run `check` one level deeper, or report and skip it past the limit.
    fn nested<T>(&mut self, span: Span, skipped: T, check: impl FnOnce(&mut Self) -> T) -> T {
        if self.depth >= self.max_depth {
            let limit = self.max_depth;
            self.error(
                SemanticErrorKind::NestingTooDeep,
                span,
                format!("nesting too deep (limit {limit})"),
            );
            return skipped;
        }
        self.depth += 1;
        let result = check(self);
        self.depth -= 1;
        result
    }

    // -----------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------

    fn check_function(&mut self, function: &Function) -> Result<(), Fault> {
        let ret = self.with_scope(|c| {
            c.check_stmts(&function.body);
            function.ret.as_ref().map(|expr| c.infer(expr))
        })?;

        let returns = match ret {
            Some(inferred) => inferred.or(Type::Any),
            None => Type::Void,
        };

        // A duplicate definition was checked, but the first one keeps its
        // signature.
        if let Some(symbol) = self.table.lookup_mut(&function.name.text) {
            if symbol.span == function.name.span {
                if let Some(signature) = symbol.signature.as_mut() {
                    signature.returns = returns;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn check_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.nested(stmt.span, (), |c| c.check_stmt(stmt));
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Output(expr) => {
                if self.infer(expr) == Inferred::Known(Type::Void) {
                    self.mismatch(expr.span, "cannot show a value of type void".to_string());
                }
            }
            StmtKind::Assign { target, value } => self.check_assign(target, value),
            StmtKind::Update { target, op } => self.check_update(target, *op),
            StmtKind::Call(call) => {
                self.infer_call(call, stmt.span);
            }
            StmtKind::If {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    self.infer(&branch.cond);
                    self.check_stmts(&branch.body);
                }
                if let Some(body) = otherwise {
                    self.check_stmts(body);
                }
            }
            StmtKind::While { cond, body } => {
                self.infer(cond);
                self.check_stmts(body);
            }
            StmtKind::For { var, range, body } => {
                self.check_loop_variable(var);
                for bound in range {
                    if let Inferred::Known(ty) = self.infer(bound) {
                        if !ty.is_index() {
                            self.mismatch(bound.span, format!("range bound must be int, found {ty}"));
                        }
                    }
                }
                self.check_stmts(body);
            }
            StmtKind::Try { body, fail, always } => {
                self.check_stmts(body);
                self.check_stmts(fail);
                if let Some(always) = always {
                    self.check_stmts(always);
                }
            }
            StmtKind::Todo => {}
            StmtKind::ArrayAdd { target, value } => self.check_array_update("array_add", target, value),
            StmtKind::ArrayRemove { target, value } => {
                self.check_array_update("array_remove", target, value)
            }
        }
    }

    fn check_assign(&mut self, target: &Place, value: &Expr) {
        if !target.indices.is_empty() {
            self.check_element(target, "assign into");
            self.infer_value(value);
            return;
        }

        let name = &target.name;
        let value_ty = self.infer_value(value);
        let level = self.table.level();
        let Some(symbol) = self.table.lookup_mut(&name.text) else {
            // Only statements skipped for depth are missing from the table.
            self.error(
                SemanticErrorKind::UndefinedVariable,
                name.span,
                format!("undefined variable '{}'", name.text),
            );
            return;
        };

        if symbol.is_function() {
            // In the same scope this was already reported as a redeclaration.
            if symbol.level != level {
                self.mismatch(name.span, format!("cannot assign to function '{}'", name.text));
            }
            return;
        }

        match symbol.ty {
            None => symbol.ty = Some(value_ty.or(Type::Any)),
            Some(target_ty) => {
                if let Inferred::Known(ty) = value_ty {
                    if !is_compatible(ty, target_ty) {
                        self.mismatch(
                            value.span,
                            format!("cannot assign {ty} to '{}' of type {target_ty}", name.text),
                        );
                    }
                }
            }
        }
    }

    /// Infer an assigned value; `void` is reported and becomes unknown.
    fn infer_value(&mut self, value: &Expr) -> Inferred {
        match self.infer(value) {
            Inferred::Known(Type::Void) => {
                self.mismatch(value.span, "cannot assign a value of type void".to_string());
                Inferred::Unknown
            }
            other => other,
        }
    }

    fn check_update(&mut self, target: &Name, op: UpdateOp) {
        if let Inferred::Known(ty) = self.resolve_variable(&target.text, target.span) {
            if !ty.is_numeric() {
                self.mismatch(target.span, format!("operator '{op}' cannot be applied to {ty}"));
            }
        }
    }

    fn check_loop_variable(&mut self, var: &Name) {
        let Some(symbol) = self.table.lookup_mut(&var.text) else {
            self.error(
                SemanticErrorKind::UndefinedVariable,
                var.span,
                format!("undefined variable '{}'", var.text),
            );
            return;
        };
        if symbol.is_function() {
            self.mismatch(var.span, format!("cannot assign to function '{}'", var.text));
            return;
        }
        match symbol.ty {
            None => symbol.ty = Some(Type::Int),
            Some(ty) if is_compatible(Type::Int, ty) => {}
            Some(ty) => self.mismatch(
                var.span,
                format!("loop variable '{}' must be int, found {ty}", var.text),
            ),
        }
    }

    fn check_array_update(&mut self, what: &str, target: &Place, value: &Expr) {
        if target.indices.is_empty() {
            if let Inferred::Known(ty) = self.resolve_variable(&target.name.text, target.name.span) {
                if !ty.is_array_like() {
                    self.mismatch(target.name.span, format!("{what} needs an array, found {ty}"));
                }
            }
        } else {
            self.check_element(target, what);
        }
        self.infer_value(value);
    }

    /// Check `name[i]...` used as a target.
    fn check_element(&mut self, target: &Place, what: &str) {
        let name = &target.name;
        if let Inferred::Known(ty) = self.resolve_variable(&name.text, name.span) {
            if !ty.is_array_like() {
                self.mismatch(name.span, format!("cannot {what} '{}' of type {ty}", name.text));
            }
        }
        self.check_indices(&target.indices);
    }

    fn check_indices(&mut self, indices: &[Expr]) {
        for index in indices {
            if let Inferred::Known(ty) = self.infer(index) {
                if !ty.is_index() {
                    self.mismatch(index.span, format!("array index must be int, found {ty}"));
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn infer(&mut self, expr: &Expr) -> Inferred {
        self.nested(expr.span, Inferred::Unknown, |c| c.infer_kind(expr))
    }

    fn infer_kind(&mut self, expr: &Expr) -> Inferred {
        match &expr.kind {
            ExprKind::Int(_) => Type::Int.into(),
            ExprKind::Float(_) => Type::Float.into(),
            ExprKind::Str(_) | ExprKind::Read => Type::Str.into(),
            ExprKind::Bool(_) => Type::Bool.into(),
            ExprKind::Ident(name) => self.resolve_variable(name, expr.span),
            ExprKind::Binary { op, lhs, rhs } => {
                let (Inferred::Known(left), Inferred::Known(right)) = (self.infer(lhs), self.infer(rhs))
                else {
                    return Inferred::Unknown;
                };
                match binary_result(*op, left, right) {
                    Some(ty) => ty.into(),
                    None => {
                        self.mismatch(
                            expr.span,
                            format!("operator '{op}' cannot be applied to {left} and {right}"),
                        );
                        Inferred::Unknown
                    }
                }
            }
            ExprKind::Unary { op, operand } => {
                let Inferred::Known(ty) = self.infer(operand) else {
                    return Inferred::Unknown;
                };
                match unary_result(*op, ty) {
                    Some(ty) => ty.into(),
                    None => {
                        self.mismatch(expr.span, format!("operator '{op}' cannot be applied to {ty}"));
                        Inferred::Unknown
                    }
                }
            }
            ExprKind::Call(call) => self.infer_call(call, expr.span),
            ExprKind::Index { base, indices } => {
                let base_ty = self.infer(base);
                self.check_indices(indices);
                match base_ty {
                    Inferred::Known(ty) if ty.is_array_like() => Type::Any.into(),
                    Inferred::Known(ty) => {
                        self.mismatch(base.span, format!("cannot index into a value of type {ty}"));
                        Inferred::Unknown
                    }
                    Inferred::Unknown => Inferred::Unknown,
                }
            }
            ExprKind::Cast { target, expr: inner } => {
                let Inferred::Known(ty) = self.infer(inner) else {
                    return Inferred::Unknown;
                };
                match cast_result(*target, ty) {
                    Some(ty) => ty.into(),
                    None => {
                        self.mismatch(expr.span, format!("cannot convert {ty} to {target}"));
                        Inferred::Unknown
                    }
                }
            }
            ExprKind::Array(items) => {
                for item in items {
                    self.infer_value(item);
                }
                Type::Array.into()
            }
        }
    }

    /// Resolve a name used as a value.
    fn resolve_variable(&mut self, name: &str, span: Span) -> Inferred {
        let level = self.table.level();
        let (is_function, ty, symbol_level) = match self.table.lookup(name) {
            Some(symbol) => (symbol.is_function(), symbol.ty, symbol.level),
            None => {
                self.error(
                    SemanticErrorKind::UndefinedVariable,
                    span,
                    format!("undefined variable '{name}'"),
                );
                return Inferred::Unknown;
            }
        };

        if is_function {
            self.mismatch(span, format!("function '{name}' cannot be used as a value"));
            return Inferred::Unknown;
        }
        match ty {
            Some(ty) => ty.into(),
            // An outer variable may be assigned before this body runs.
            None if symbol_level < level => Type::Any.into(),
            None => {
                self.error(
                    SemanticErrorKind::UndefinedVariable,
                    span,
                    format!("variable '{name}' is used before assignment"),
                );
                Inferred::Unknown
            }
        }
    }

    fn infer_call(&mut self, call: &Call, span: Span) -> Inferred {
        let name = &call.callee.text;
        let signature = match self.table.lookup(name) {
            Some(symbol) if symbol.is_function() => symbol.signature.clone(),
            _ => None,
        };
        if signature.is_none() {
            self.error(
                SemanticErrorKind::FunctionNotDefined,
                call.callee.span,
                format!("function '{name}' is not defined"),
            );
        }

        let args: Vec<Inferred> = call.args.iter().map(|arg| self.infer_value(arg)).collect();
        let Some(signature) = signature else {
            return Inferred::Unknown;
        };

        let arity_ok = args.len() == signature.params.len();
        if !arity_ok {
            self.error(
                SemanticErrorKind::ArgumentCountMismatch,
                span,
                format!(
                    "function '{name}' expects {} args, got {}",
                    signature.params.len(),
                    args.len()
                ),
            );
        }

        let mut fixed = signature.params.clone();
        let mut failed = false;
        for (position, (arg, param)) in args.iter().zip(fixed.iter_mut()).enumerate() {
            let Inferred::Known(arg_ty) = *arg else {
                continue;
            };
            match *param {
                // The first well-formed call with a known argument fixes the
                // parameter.
                None if arity_ok => *param = Some(arg_ty),
                None => {}
                Some(param_ty) if is_compatible(arg_ty, param_ty) => {}
                Some(param_ty) => {
                    failed = true;
                    self.mismatch(
                        call.args[position].span,
                        format!(
                            "argument {} of '{name}' expects {param_ty}, got {arg_ty}",
                            position + 1
                        ),
                    );
                }
            }
        }

        if fixed != signature.params {
            if let Some(sig) = self
                .table
                .lookup_mut(name)
                .and_then(|symbol| symbol.signature.as_mut())
            {
                sig.params = fixed;
            }
        }

        if failed || !arity_ok {
            Inferred::Unknown
        } else {
            signature.returns.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::name_resolve::Collector;
    use crate::parser::parse;

    fn check_source(source: &str) -> (SymbolTable, Vec<SemanticError>) {
        let lexed = lex(source);
        assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
        let parsed = parse(&lexed.tokens, source);
        assert!(parsed.errors.is_empty(), "syntax errors: {:?}", parsed.errors);
        let program = parsed.program.expect("program");

        let config = FrontendConfig::default();
        let mut collector = Collector::new(&config);
        collector.collect(&program).expect("no fault");
        let (table, mut errors) = collector.finish();
        let mut checker = Checker::new(table, &config);
        checker.check(&program).expect("no fault");
        let Checker { table, errors: type_errors, .. } = checker;
        errors.extend(type_errors);
        (table, errors)
    }

    fn messages(errors: &[SemanticError]) -> Vec<String> {
        errors.iter().map(|e| e.message.clone()).collect()
    }

    fn type_of(table: &SymbolTable, name: &str) -> Option<Type> {
        table.lookup(name).and_then(|symbol| symbol.ty)
    }

    #[test]
    fn first_assignment_fixes_the_variable_type() {
        let (table, errors) = check_source("n = 1\nf = 2.5\ns = 'hi'\nb = true\nl = [1, 2]\nr = read");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(type_of(&table, "n"), Some(Type::Int));
        assert_eq!(type_of(&table, "f"), Some(Type::Float));
        assert_eq!(type_of(&table, "s"), Some(Type::Str));
        assert_eq!(type_of(&table, "b"), Some(Type::Bool));
        assert_eq!(type_of(&table, "l"), Some(Type::Array));
        assert_eq!(type_of(&table, "r"), Some(Type::Str));
    }

    #[test]
    fn incompatible_reassignment_keeps_the_declared_type() {
        let (table, errors) = check_source("x = 1\nx = 'text'\ny = x + 1");
        assert_eq!(messages(&errors), vec!["cannot assign string to 'x' of type int"]);
        assert_eq!((errors[0].line, errors[0].column), (2, 5));
        assert_eq!(type_of(&table, "x"), Some(Type::Int));
        assert_eq!(type_of(&table, "y"), Some(Type::Int));
    }

    #[test]
    fn widening_assignments_follow_the_table() {
        let (_, errors) = check_source("f = 1.5\nf = 2\ns = 'a'\ns = 3\nb = true\nb = 1\nf = true");
        assert_eq!(messages(&errors), vec!["cannot assign bool to 'f' of type float"]);
    }

    #[test]
    fn binary_mismatch_is_reported_once_and_propagates_unknown() {
        let (table, errors) = check_source("x = 1 + 'a'\ny = x * 2");
        assert_eq!(
            messages(&errors),
            vec!["operator '+' cannot be applied to int and string"]
        );
        assert_eq!((errors[0].line, errors[0].column), (1, 7));
        assert_eq!(type_of(&table, "x"), Some(Type::Any));
    }

    #[test]
    fn unknown_operands_do_not_cascade() {
        let (_, errors) = check_source("x = (missing + 1) * 'a' - -other");
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == SemanticErrorKind::UndefinedVariable));
    }

    #[test]
    fn use_before_assignment_is_undefined() {
        let (_, errors) = check_source("show later\nlater = 1\nshow later");
        assert_eq!(messages(&errors), vec!["variable 'later' is used before assignment"]);
    }

    #[test]
    fn globals_are_dynamic_inside_functions() {
        let source = "\
fn report()
  show total + 1
close
total = 5
report()";
        let (_, errors) = check_source(source);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn function_locals_are_not_visible_outside() {
        let (_, errors) = check_source("fn f()\n  inner = 1\nclose\nf()\nshow inner");
        assert_eq!(messages(&errors), vec!["undefined variable 'inner'"]);
    }

    #[test]
    fn first_call_fixes_parameter_types() {
        let source = "\
fn greet(name, times)
  show name
close
greet('ada', 2)
greet('bob', 2.5)
greet(3, 1)";
        let (table, errors) = check_source(source);
        assert_eq!(
            messages(&errors),
            vec!["argument 2 of 'greet' expects int, got float"]
        );
        assert_eq!((errors[0].line, errors[0].column), (5, 14));
        let params = table
            .lookup("greet")
            .and_then(|s| s.signature.clone())
            .map(|sig| sig.params);
        assert_eq!(params, Some(vec![Some(Type::Str), Some(Type::Int)]));
    }

    #[test]
    fn wrong_arity_still_checks_the_matching_arguments() {
        let source = "\
fn f(a, b)
  show a
close
f(1, 2)
f('s', 2, 3)
r = f(1)";
        let (table, errors) = check_source(source);
        assert_eq!(
            messages(&errors),
            vec![
                "function 'f' expects 2 args, got 3",
                "argument 1 of 'f' expects int, got string",
                "function 'f' expects 2 args, got 1",
            ]
        );
        assert_eq!((errors[1].line, errors[1].column), (5, 3));
        // The failed call yields no type, so `r` falls back to `any`.
        assert_eq!(type_of(&table, "r"), Some(Type::Any));
    }

    #[test]
    fn wrong_arity_does_not_fix_parameter_types() {
        let source = "\
fn g(a, b)
  show a
close
g('x')
g(1, 2)";
        let (table, errors) = check_source(source);
        assert_eq!(messages(&errors), vec!["function 'g' expects 2 args, got 1"]);
        let params = table
            .lookup("g")
            .and_then(|s| s.signature.clone())
            .map(|sig| sig.params);
        assert_eq!(params, Some(vec![Some(Type::Int), Some(Type::Int)]));
    }

    #[test]
    fn calls_yield_the_checked_return_type() {
        let source = "\
fn half(v)
  ret float(v) / 2
close
fn log(msg)
  show msg
close
h = half(3)
h = 'x'
show log('hi')";
        let (table, errors) = check_source(source);
        assert_eq!(
            messages(&errors),
            vec![
                "cannot assign string to 'h' of type float",
                "cannot show a value of type void",
            ]
        );
        assert_eq!(type_of(&table, "h"), Some(Type::Float));
    }

    #[test]
    fn undefined_function_still_checks_arguments() {
        let (_, errors) = check_source("x = nope(missing, 1 + 'a')");
        assert_eq!(
            errors.iter().map(|e| e.kind).collect::<Vec<_>>(),
            vec![
                SemanticErrorKind::FunctionNotDefined,
                SemanticErrorKind::UndefinedVariable,
                SemanticErrorKind::TypeMismatch,
            ]
        );
    }

    #[test]
    fn calling_a_variable_is_not_a_function_call() {
        let (_, errors) = check_source("v = 1\nv()");
        assert_eq!(messages(&errors), vec!["function 'v' is not defined"]);
    }

    #[test]
    fn function_names_are_not_values() {
        let (_, errors) = check_source("fn f()\nclose\nshow f + 1");
        assert_eq!(messages(&errors), vec!["function 'f' cannot be used as a value"]);
    }

    #[test]
    fn recursion_sees_an_unchecked_return_as_any() {
        let source = "\
fn fact(n)
  r = 1
  if n > 1
    r = n * fact(n - 1)
  close
  ret r
close
show fact(5) + 1";
        let (_, errors) = check_source(source);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn arrays_indexes_and_updates() {
        let source = "\
grid = [[1, 2], [3, 4]]
grid[0][1] = 9
v = grid[1][0] + 1
array_add(grid, [5, 6])
array_remove(grid[0], 2)
i = 0
i++
s = 'abc'
show s[0]
show grid['k']
s--
array_add(s, 1)";
        let (_, errors) = check_source(source);
        assert_eq!(
            messages(&errors),
            vec![
                "cannot index into a value of type string",
                "array index must be int, found string",
                "operator '--' cannot be applied to string",
                "array_add needs an array, found string",
            ]
        );
    }

    #[test]
    fn loops_and_casts() {
        let source = "\
for i in range(0, 10, 2.5)
  show i
close
name = 'x'
for name in range(3)
  todo
close
n = int('42') + int(true)";
        let (table, errors) = check_source(source);
        assert_eq!(
            messages(&errors),
            vec![
                "range bound must be int, found float",
                "cannot convert bool to int",
            ]
        );
        assert_eq!(type_of(&table, "i"), Some(Type::Int));
    }

    #[test]
    fn unary_and_logical_operators() {
        let (_, errors) = check_source("a = !true and 1 < 2.5\nb = -'x'\nc = !3");
        assert_eq!(
            messages(&errors),
            vec![
                "operator '-' cannot be applied to string",
                "operator '!' cannot be applied to int",
            ]
        );
    }

    #[test]
    fn assigning_to_a_global_function_from_a_body_is_a_mismatch() {
        let source = "\
fn helper()
close
fn other()
  helper = 1
close
show 1";
        let (_, errors) = check_source(source);
        assert_eq!(messages(&errors), vec!["cannot assign to function 'helper'"]);
    }

    #[test]
    fn deep_expressions_report_nesting_instead_of_overflowing() {
        let mut program = Program::default();
        let mut expr = Expr::new(ExprKind::Int(1), Span::new(0, 1, 1));
        for _ in 0..50 {
            expr = Expr::new(
                ExprKind::Unary {
                    op: crate::ast::UnaryOp::Neg,
                    operand: Box::new(expr),
                },
                Span::new(0, 1, 1),
            );
        }
        program.statements.push(Stmt {
            kind: StmtKind::Output(expr),
            span: Span::new(0, 1, 1),
        });

        let config = FrontendConfig::with_max_depth(10);
        let mut collector = Collector::new(&config);
        collector.collect(&program).expect("no fault");
        let (table, _) = collector.finish();
        let mut checker = Checker::new(table, &config);
        checker.check(&program).expect("no fault");
        let errors = checker.finish();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, SemanticErrorKind::NestingTooDeep);
    }
}
