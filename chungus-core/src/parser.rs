//! Recursive-descent parser for Chungus.
//!
//! Binary expressions use precedence climbing over [`binary_precedence`].
//! Syntax errors are recorded and the parser recovers in panic mode: it
//! skips to a synchronizing token and resumes with the next statement, so
//! one run reports every malformed statement.

use tracing::{debug, trace};

use crate::ast::{
    BinaryOp, Branch, Call, CastTarget, Expr, ExprKind, Function, Name, Place, Program, Stmt,
    StmtKind, UnaryOp, UpdateOp,
};
use crate::config::FrontendConfig;
use crate::diagnostic::{SyntaxError, SyntaxErrorKind};
use crate::lexer::{Token, TokenKind};
use crate::span::Span;

/// Most index dimensions an array access may have.
pub const MAX_INDEX_DIMENSIONS: usize = 2;

/// Binding level of unary `!` and `-` operands.
const UNARY_OPERAND_LEVEL: u8 = 7;

const STATEMENT_START: &[&str] = &[
    "id",
    "show",
    "todo",
    "if",
    "while",
    "for",
    "try",
    "array_add",
    "array_remove",
];

const EXPRESSION_START: &[&str] = &[
    "id",
    "int_literal",
    "float_literal",
    "str_literal",
    "bool_literal",
    "(",
    "[",
    "int",
    "float",
    "!",
    "-",
];

#[derive(Debug)]
pub struct ParseResult {
    /// `None` only when there were no tokens at all.
    pub program: Option<Program>,
    pub errors: Vec<SyntaxError>,
}

/// Level and operator for a binary operator token, low to high:
/// `or` 1, `and` 2, `== !=` 3, `< <= > >=` 4, `+ -` 5, `* / // %` 6, `**` 7.
pub fn binary_precedence(kind: TokenKind) -> Option<(u8, BinaryOp)> {
    let entry = match kind {
        TokenKind::Or => (1, BinaryOp::Or),
        TokenKind::And => (2, BinaryOp::And),
        TokenKind::EqualEqual => (3, BinaryOp::Eq),
        TokenKind::BangEqual => (3, BinaryOp::Ne),
        TokenKind::Less => (4, BinaryOp::Lt),
        TokenKind::LessEqual => (4, BinaryOp::Le),
        TokenKind::Greater => (4, BinaryOp::Gt),
        TokenKind::GreaterEqual => (4, BinaryOp::Ge),
        TokenKind::Plus => (5, BinaryOp::Add),
        TokenKind::Minus => (5, BinaryOp::Sub),
        TokenKind::Star => (6, BinaryOp::Mul),
        TokenKind::Slash => (6, BinaryOp::Div),
        TokenKind::SlashSlash => (6, BinaryOp::FloorDiv),
        TokenKind::Percent => (6, BinaryOp::Mod),
        TokenKind::StarStar => (7, BinaryOp::Pow),
        _ => return None,
    };
    Some(entry)
}

fn is_right_associative(op: BinaryOp) -> bool {
    op == BinaryOp::Pow
}

/// Parse with the default configuration.
pub fn parse(tokens: &[Token], source: &str) -> ParseResult {
    parse_with_config(tokens, source, &FrontendConfig::default())
}

/// Parse a token stream produced by [`crate::lexer::lex`].
///
/// `source` is only used to place end-of-input diagnostics after the last
/// non-blank character.
pub fn parse_with_config(tokens: &[Token], source: &str, config: &FrontendConfig) -> ParseResult {
    let end = end_of_input(source);
    if tokens.is_empty() {
        return ParseResult {
            program: None,
            errors: vec![SyntaxError::new(
                SyntaxErrorKind::MissingToken {
                    context: "program",
                    expected: vec![TokenKind::Eof.as_str()],
                },
                end,
            )],
        };
    }

    let owned;
    let tokens = if tokens.last().map(|t| t.kind) == Some(TokenKind::Eof) {
        tokens
    } else {
        let mut with_eof = tokens.to_vec();
        with_eof.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            span: end,
        });
        owned = with_eof;
        &owned[..]
    };

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        reached: 0,
        max_depth: config.max_depth,
        end,
        errors: Vec::new(),
    };
    let program = parser.parse_program();
    debug!(
        functions = program.functions.len(),
        statements = program.statements.len(),
        errors = parser.errors.len(),
        "parsing finished"
    );
    ParseResult {
        program: Some(program),
        errors: parser.errors,
    }
}

/// Position just after the last non-whitespace character of `source`.
fn end_of_input(source: &str) -> Span {
    let text = source.trim_end();
    let line = 1 + text.matches('\n').count() as u32;
    let last_line = text.rsplit('\n').next().unwrap_or("");
    Span::new(text.len() as u32, line, last_line.chars().count() as u32 + 1)
}

/// Why a rule gave up. The diagnostic has already been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abandon {
    Recover,
    TooDeep,
    /// A too-deep block was skipped through its `close`; the cursor is
    /// already past it.
    Skipped,
}

type PResult<T> = Result<T, Abandon>;

struct Parser<'t> {
    /// Never empty; the last token is `Eof`.
    tokens: &'t [Token],
    pos: usize,
    /// Nesting of the node being parsed: statements, functions, expression
    /// nodes and parentheses each add one.
    depth: usize,
    /// Deepest `depth` entered within the current operand chain.
    reached: usize,
    max_depth: usize,
    end: Span,
    errors: Vec<SyntaxError>,
}

impl<'t> Parser<'t> {
    // -----------------------------------------------------------------
    // Token cursor
    // -----------------------------------------------------------------

    fn peek(&self) -> &'t Token {
        let tokens: &'t [Token] = self.tokens;
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_nth_kind(&self, n: usize) -> TokenKind {
        let tokens: &'t [Token] = self.tokens;
        tokens[(self.pos + n).min(tokens.len() - 1)].kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn bump(&mut self) -> &'t Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, context: &'static str) -> PResult<&'t Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(context, &[kind.as_str()]))
        }
    }

    fn expect_name(&mut self, context: &'static str) -> PResult<Name> {
        let token = self.expect(TokenKind::Ident, context)?;
        Ok(Name::new(token.lexeme.clone(), token.span))
    }

    /// Whether the current token is the first one on its line.
    fn starts_line(&self) -> bool {
        let tokens: &'t [Token] = self.tokens;
        match self.pos.checked_sub(1).and_then(|prev| tokens.get(prev)) {
            Some(prev) => prev.span.line < self.peek().span.line,
            None => true,
        }
    }

    // -----------------------------------------------------------------
    // Diagnostics and recovery
    // -----------------------------------------------------------------

    fn error(&mut self, kind: SyntaxErrorKind, span: Span) {
        trace!(%span, %kind, "syntax error");
        self.errors.push(SyntaxError::new(kind, span));
    }

    fn unexpected(&mut self, context: &'static str, expected: &[&'static str]) -> Abandon {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            self.error(
                SyntaxErrorKind::MissingToken {
                    context,
                    expected: expected.to_vec(),
                },
                self.end,
            );
        } else {
            self.error(
                SyntaxErrorKind::UnexpectedToken {
                    context,
                    found: describe(token),
                    expected: expected.to_vec(),
                },
                token.span,
            );
        }
        Abandon::Recover
    }

    fn too_deep(&mut self, span: Span) -> Abandon {
        self.error(
            SyntaxErrorKind::NestingTooDeep {
                limit: self.max_depth,
            },
            span,
        );
        Abandon::TooDeep
    }

    /// Run `rule` one level deeper, refusing past `max_depth`.
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.max_depth {
            let span = self.peek().span;
            return Err(self.too_deep(span));
        }
        self.depth += 1;
        self.reached = self.reached.max(self.depth);
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// Skip to the next synchronizing token.
    fn synchronize(&mut self) {
        let from = self.pos;
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Eof || is_sync_keyword(kind) {
                break;
            }
            if kind == TokenKind::Semicolon {
                self.bump();
                break;
            }
            if kind == TokenKind::Ident && self.pos > from && self.starts_line() {
                break;
            }
            self.bump();
        }
        trace!(skipped = self.pos - from, "parser resynchronized");
    }

    /// Skip a whole block construct starting at the current keyword,
    /// including everything nested in it and its `close`.
    fn skip_construct(&mut self) {
        let mut open = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::If | TokenKind::While | TokenKind::For | TokenKind::Try | TokenKind::Fn => {
                    open += 1;
                }
                TokenKind::Close => {
                    open = open.saturating_sub(1);
                    if open == 0 {
                        self.bump();
                        break;
                    }
                }
                _ => {}
            }
            self.bump();
        }
    }

    // -----------------------------------------------------------------
    // Program and functions
    // -----------------------------------------------------------------

    fn parse_program(&mut self) -> Program {
        let mut program = Program::default();

        while !self.at(TokenKind::Eof) {
            let start = self.pos;
            let result = if self.at(TokenKind::Fn) {
                if !program.statements.is_empty() {
                    let span = self.peek().span;
                    self.error(SyntaxErrorKind::MisplacedFunction, span);
                }
                self.parse_function().map(|f| program.functions.push(f))
            } else {
                self.parse_statement().map(|s| program.statements.push(s))
            };
            match result {
                Ok(()) | Err(Abandon::Skipped) => {}
                Err(_) => self.recover(start),
            }
        }

        if program.statements.is_empty() && self.errors.is_empty() {
            self.unexpected("program", STATEMENT_START);
        }
        program
    }

    /// Resynchronize after a failed rule that started at `start`, dropping
    /// one token if nothing was consumed at all.
    fn recover(&mut self, start: usize) {
        self.synchronize();
        if self.pos == start {
            self.bump();
        }
    }

    fn parse_function(&mut self) -> PResult<Function> {
        const CONTEXT: &str = "function_statement";
        let start = self.pos;
        let result = self.nested(|p| {
            let span = p.expect(TokenKind::Fn, CONTEXT)?.span;
            let name = p.expect_name(CONTEXT)?;
            p.expect(TokenKind::LParen, CONTEXT)?;
            let mut params = Vec::new();
            if !p.at(TokenKind::RParen) {
                params.push(p.expect_name(CONTEXT)?);
                while p.eat(TokenKind::Comma) {
                    params.push(p.expect_name(CONTEXT)?);
                }
            }
            p.expect(TokenKind::RParen, CONTEXT)?;
            p.eat(TokenKind::Colon);

            let body = p.parse_stmts(&[TokenKind::Ret, TokenKind::Close]);
            let ret = if p.eat(TokenKind::Ret) {
                let expr = p.parse_expr()?;
                p.eat(TokenKind::Semicolon);
                Some(expr)
            } else {
                None
            };
            p.expect(TokenKind::Close, CONTEXT)?;
            Ok(Function {
                name,
                params,
                body,
                ret,
                span,
            })
        });
        if matches!(result, Err(Abandon::TooDeep)) {
            self.pos = start;
            self.skip_construct();
            return Err(Abandon::Skipped);
        }
        result
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    /// Statements up to (not including) one of `stop`, `fn` or end of input.
    fn parse_stmts(&mut self, stop: &[TokenKind]) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        loop {
            let kind = self.peek_kind();
            if kind == TokenKind::Eof || kind == TokenKind::Fn || stop.contains(&kind) {
                break;
            }
            let start = self.pos;
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(Abandon::Skipped) => {}
                Err(_) => self.recover(start),
            }
        }
        stmts
    }

    /// Like [`Self::parse_stmts`] but at least one statement is required.
    /// A body whose statements all failed has already been reported.
    fn parse_block_body(&mut self, stop: &[TokenKind], context: &'static str) -> Vec<Stmt> {
        let errors_before = self.errors.len();
        let stmts = self.parse_stmts(stop);
        if stmts.is_empty() && self.errors.len() == errors_before {
            self.unexpected(context, STATEMENT_START);
        }
        stmts
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        let start = self.pos;
        let result = self.nested(|p| {
            let stmt = p.parse_statement_kind()?;
            p.eat(TokenKind::Semicolon);
            Ok(stmt)
        });
        if matches!(result, Err(Abandon::TooDeep)) && is_block_keyword(self.tokens[start].kind) {
            self.pos = start;
            self.skip_construct();
            return Err(Abandon::Skipped);
        }
        result
    }

    fn parse_statement_kind(&mut self) -> PResult<Stmt> {
        let token = self.peek();
        let span = token.span;
        let kind = match token.kind {
            TokenKind::Ident => self.parse_simple_statement()?,
            TokenKind::Show => {
                self.bump();
                StmtKind::Output(self.parse_expr()?)
            }
            TokenKind::Todo => {
                self.bump();
                StmtKind::Todo
            }
            TokenKind::ArrayAdd | TokenKind::ArrayRemove => self.parse_array_statement()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Try => self.parse_try()?,
            _ => return Err(self.unexpected("statement", STATEMENT_START)),
        };
        Ok(Stmt { kind, span })
    }

    /// Statements that start with an identifier.
    fn parse_simple_statement(&mut self) -> PResult<StmtKind> {
        match self.peek_nth_kind(1) {
            TokenKind::Equal | TokenKind::LBracket => {
                let target = self.parse_place("assignment")?;
                self.expect(TokenKind::Equal, "assignment")?;
                let value = self.parse_value()?;
                Ok(StmtKind::Assign { target, value })
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let target = self.expect_name("assignment")?;
                let op = if self.bump().kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                Ok(StmtKind::Update { target, op })
            }
            TokenKind::LParen => {
                let callee = self.expect_name("function_call")?;
                Ok(StmtKind::Call(self.parse_call(callee)?))
            }
            _ => {
                self.bump();
                Err(self.unexpected("statement", &["=", "[", "++", "--", "("]))
            }
        }
    }

    /// `'read' | expr`
    fn parse_value(&mut self) -> PResult<Expr> {
        if self.at(TokenKind::Read) {
            let span = self.bump().span;
            return Ok(Expr::new(ExprKind::Read, span));
        }
        self.parse_expr()
    }

    fn parse_place(&mut self, context: &'static str) -> PResult<Place> {
        let name = self.expect_name(context)?;
        let indices = self.parse_indices()?;
        Ok(Place { name, indices })
    }

    /// Zero or more `[expr]` suffixes. Dimensions past the limit are
    /// reported, parsed and dropped.
    fn parse_indices(&mut self) -> PResult<Vec<Expr>> {
        let mut indices = Vec::new();
        let mut reported = false;
        while self.at(TokenKind::LBracket) {
            let open = self.bump().span;
            let index = self.parse_expr()?;
            self.expect(TokenKind::RBracket, "index")?;
            if indices.len() < MAX_INDEX_DIMENSIONS {
                indices.push(index);
            } else if !reported {
                self.error(SyntaxErrorKind::TooManyDimensions, open);
                reported = true;
            }
        }
        Ok(indices)
    }

    fn parse_array_statement(&mut self) -> PResult<StmtKind> {
        const CONTEXT: &str = "array_statement";
        let add = self.bump().kind == TokenKind::ArrayAdd;
        self.expect(TokenKind::LParen, CONTEXT)?;
        let target = self.parse_place(CONTEXT)?;
        self.expect(TokenKind::Comma, CONTEXT)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::RParen, CONTEXT)?;
        Ok(if add {
            StmtKind::ArrayAdd { target, value }
        } else {
            StmtKind::ArrayRemove { target, value }
        })
    }

    fn parse_if(&mut self) -> PResult<StmtKind> {
        const CONTEXT: &str = "if_statement";
        const STOP: &[TokenKind] = &[TokenKind::Elif, TokenKind::Else, TokenKind::Close];
        self.bump();
        let mut branches = Vec::new();
        let cond = self.parse_expr()?;
        let body = self.parse_block_body(STOP, CONTEXT);
        branches.push(Branch { cond, body });

        while self.eat(TokenKind::Elif) {
            let cond = self.parse_expr()?;
            let body = self.parse_block_body(STOP, CONTEXT);
            branches.push(Branch { cond, body });
        }

        let otherwise = if self.eat(TokenKind::Else) {
            Some(self.parse_block_body(&[TokenKind::Close], CONTEXT))
        } else {
            None
        };
        self.expect(TokenKind::Close, CONTEXT)?;
        Ok(StmtKind::If {
            branches,
            otherwise,
        })
    }

    fn parse_while(&mut self) -> PResult<StmtKind> {
        const CONTEXT: &str = "while_statement";
        self.bump();
        let cond = self.parse_expr()?;
        let body = self.parse_block_body(&[TokenKind::Close], CONTEXT);
        self.expect(TokenKind::Close, CONTEXT)?;
        Ok(StmtKind::While { cond, body })
    }

    fn parse_for(&mut self) -> PResult<StmtKind> {
        const CONTEXT: &str = "for_statement";
        self.bump();
        let var = self.expect_name(CONTEXT)?;
        self.expect(TokenKind::In, CONTEXT)?;
        self.expect(TokenKind::Range, CONTEXT)?;
        self.expect(TokenKind::LParen, CONTEXT)?;
        let mut range = vec![self.parse_expr()?];
        while range.len() < 3 && self.eat(TokenKind::Comma) {
            range.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RParen, CONTEXT)?;
        let body = self.parse_block_body(&[TokenKind::Close], CONTEXT);
        self.expect(TokenKind::Close, CONTEXT)?;
        Ok(StmtKind::For { var, range, body })
    }

    fn parse_try(&mut self) -> PResult<StmtKind> {
        const CONTEXT: &str = "try_statement";
        self.bump();
        let body = self.parse_block_body(&[TokenKind::Fail, TokenKind::Always, TokenKind::Close], CONTEXT);
        self.expect(TokenKind::Fail, CONTEXT)?;
        let fail = self.parse_block_body(&[TokenKind::Always, TokenKind::Close], CONTEXT);
        let always = if self.eat(TokenKind::Always) {
            Some(self.parse_block_body(&[TokenKind::Close], CONTEXT))
        } else {
            None
        };
        self.expect(TokenKind::Close, CONTEXT)?;
        Ok(StmtKind::Try { body, fail, always })
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_binary(1)
    }

    /// Operand chain at `min_level` or above. The deepest level reached
    /// inside it is merged into the enclosing chain's.
    fn parse_binary(&mut self, min_level: u8) -> PResult<Expr> {
        let outer = std::mem::replace(&mut self.reached, self.depth);
        let result = self.parse_chain(min_level);
        self.reached = self.reached.max(outer);
        result
    }

    fn parse_chain(&mut self, min_level: u8) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some((level, op)) = binary_precedence(self.peek_kind()) {
            if level < min_level {
                break;
            }
            let span = self.bump().span;
            // Folding moves everything parsed so far one level down.
            let deepest = self.reached + 1;
            if deepest > self.max_depth {
                return Err(self.too_deep(span));
            }
            self.reached = deepest;
            let next = if is_right_associative(op) {
                level
            } else {
                level + 1
            };
            self.depth += 1;
            let rhs = self.parse_binary(next);
            self.depth -= 1;
            let rhs = rhs?;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        self.nested(|p| {
            let op = match p.peek_kind() {
                TokenKind::Bang => UnaryOp::Not,
                TokenKind::Minus => UnaryOp::Neg,
                _ => return p.parse_postfix(),
            };
            let span = p.bump().span;
            let operand = p.parse_binary(UNARY_OPERAND_LEVEL)?;
            Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ))
        })
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        if !self.at(TokenKind::Ident) {
            return self.parse_primary();
        }
        let token = self.bump();
        let span = token.span;
        match self.peek_kind() {
            TokenKind::LParen => {
                let callee = Name::new(token.lexeme.clone(), span);
                Ok(Expr::new(ExprKind::Call(self.parse_call(callee)?), span))
            }
            TokenKind::LBracket => {
                let base = Expr::new(ExprKind::Ident(token.lexeme.clone()), span);
                let indices = self.parse_indices()?;
                Ok(Expr::new(
                    ExprKind::Index {
                        base: Box::new(base),
                        indices,
                    },
                    span,
                ))
            }
            _ => Ok(Expr::new(ExprKind::Ident(token.lexeme.clone()), span)),
        }
    }

    fn parse_call(&mut self, callee: Name) -> PResult<Call> {
        const CONTEXT: &str = "function_call";
        self.expect(TokenKind::LParen, CONTEXT)?;
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.eat(TokenKind::Comma) {
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen, CONTEXT)?;
        Ok(Call { callee, args })
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let token = self.peek();
        let span = token.span;
        let kind = match token.kind {
            TokenKind::IntLiteral => {
                self.bump();
                ExprKind::Int(self.int_value(token))
            }
            TokenKind::FloatLiteral => {
                self.bump();
                match token.lexeme.parse::<f64>() {
                    Ok(value) if value.is_finite() => ExprKind::Float(value),
                    _ => {
                        self.error(SyntaxErrorKind::FloatOutOfRange(token.lexeme.clone()), span);
                        ExprKind::Float(0.0)
                    }
                }
            }
            TokenKind::StringLiteral => {
                self.bump();
                ExprKind::Str(token.lexeme.clone())
            }
            TokenKind::BoolLiteral => {
                self.bump();
                ExprKind::Bool(token.lexeme == "true")
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "expression")?;
                return Ok(inner);
            }
            TokenKind::Int | TokenKind::Float => {
                let target = if self.bump().kind == TokenKind::Int {
                    CastTarget::Int
                } else {
                    CastTarget::Float
                };
                self.expect(TokenKind::LParen, "cast")?;
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "cast")?;
                ExprKind::Cast {
                    target,
                    expr: Box::new(expr),
                }
            }
            TokenKind::LBracket => {
                self.bump();
                let mut items = Vec::new();
                if !self.at(TokenKind::RBracket) {
                    items.push(self.parse_expr()?);
                    while self.eat(TokenKind::Comma) {
                        items.push(self.parse_expr()?);
                    }
                }
                self.expect(TokenKind::RBracket, "array_literal")?;
                ExprKind::Array(items)
            }
            _ => return Err(self.unexpected("expression", EXPRESSION_START)),
        };
        Ok(Expr::new(kind, span))
    }

    /// `~` marks a negative literal. Values outside `i64` are reported.
    fn int_value(&mut self, token: &Token) -> i64 {
        let text = token.lexeme.replacen('~', "-", 1);
        match text.parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                self.error(
                    SyntaxErrorKind::InvalidLiteral(token.lexeme.clone()),
                    token.span,
                );
                0
            }
        }
    }
}

fn is_block_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::If | TokenKind::While | TokenKind::For | TokenKind::Try | TokenKind::Fn
    )
}

fn is_sync_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Fn
            | TokenKind::Show
            | TokenKind::If
            | TokenKind::Elif
            | TokenKind::Else
            | TokenKind::While
            | TokenKind::For
            | TokenKind::Try
            | TokenKind::Fail
            | TokenKind::Always
            | TokenKind::Todo
            | TokenKind::ArrayAdd
            | TokenKind::ArrayRemove
            | TokenKind::Ret
            | TokenKind::Close
    )
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => TokenKind::Eof.as_str().to_string(),
        TokenKind::Ident
        | TokenKind::IntLiteral
        | TokenKind::FloatLiteral
        | TokenKind::StringLiteral
        | TokenKind::BoolLiteral => format!("{} '{}'", token.kind.as_str(), token.lexeme),
        _ => format!("'{}'", token.lexeme),
    }
}
