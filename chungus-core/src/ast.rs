//! Abstract syntax tree for Chungus programs.
//!
//! Every node kind is its own variant holding only the fields it needs.
//! Child order is meaningful. The tree is produced by [`crate::parser`] and
//! only borrowed by the semantic analyzer.

use core::fmt;

use crate::span::Span;

/// Whole compilation unit: function definitions, then top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub functions: Vec<Function>,
    pub statements: Vec<Stmt>,
}

/// An identifier together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

impl Name {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Name {
            text: text.into(),
            span,
        }
    }
}

pub type Param = Name;

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Name,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    /// The `ret` expression, if any.
    pub ret: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Assignable location: a variable, optionally indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: Name,
    pub indices: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Name,
    pub args: Vec<Expr>,
}

/// One `if` / `elif` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `show expr`
    Output(Expr),
    /// `x = value`, `x[i] = value`, `x[i][j] = value`
    Assign { target: Place, value: Expr },
    /// `x++` / `x--`
    Update { target: Name, op: UpdateOp },
    Call(Call),
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    /// `for i in range(a[, b[, step]])`; `range` holds one to three bounds.
    For {
        var: Name,
        range: Vec<Expr>,
        body: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        fail: Vec<Stmt>,
        always: Option<Vec<Stmt>>,
    },
    Todo,
    ArrayAdd { target: Place, value: Expr },
    ArrayRemove { target: Place, value: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call(Call),
    /// `base[i]` or `base[i][j]`.
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// `int(expr)` / `float(expr)`
    Cast {
        target: CastTarget,
        expr: Box<Expr>,
    },
    Array(Vec<Expr>),
    /// `read` on the right-hand side of an assignment.
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::FloorDiv
                | BinaryOp::Mod
                | BinaryOp::Pow
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl fmt::Display for UpdateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastTarget {
    Int,
    Float,
}

impl fmt::Display for CastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CastTarget::Int => "int",
            CastTarget::Float => "float",
        })
    }
}

// ---------------------------------------------------------------------
// Tree rendering
// ---------------------------------------------------------------------

struct Node {
    label: String,
    children: Vec<Node>,
}

impl Node {
    fn leaf(label: impl Into<String>) -> Self {
        Node {
            label: label.into(),
            children: Vec::new(),
        }
    }

    fn with(label: impl Into<String>, children: Vec<Node>) -> Self {
        Node {
            label: label.into(),
            children,
        }
    }
}

/// Render the program as an indented tree, one node per line.
///
/// ```text
/// program
/// ├─ functions
/// └─ statements
///    └─ show
///       └─ int: 1
/// ```
pub fn render_tree(program: &Program) -> String {
    let root = Node::with(
        "program",
        vec![
            Node::with("functions", program.functions.iter().map(function_node).collect()),
            Node::with("statements", stmt_nodes(&program.statements)),
        ],
    );

    let mut out = String::new();
    out.push_str(&root.label);
    out.push('\n');
    write_children(&mut out, &root.children, "");
    out
}

fn write_children(out: &mut String, children: &[Node], prefix: &str) {
    for (index, child) in children.iter().enumerate() {
        let last = index + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { "└─ " } else { "├─ " });
        out.push_str(&child.label);
        out.push('\n');
        let nested = format!("{prefix}{}", if last { "   " } else { "│  " });
        write_children(out, &child.children, &nested);
    }
}

fn function_node(function: &Function) -> Node {
    let mut children = vec![
        Node::with(
            "params",
            function
                .params
                .iter()
                .map(|param| Node::leaf(format!("param: {}", param.text)))
                .collect(),
        ),
        Node::with("body", stmt_nodes(&function.body)),
    ];
    if let Some(ret) = &function.ret {
        children.push(Node::with("ret", vec![expr_node(ret)]));
    }
    Node::with(format!("function: {}", function.name.text), children)
}

fn stmt_nodes(stmts: &[Stmt]) -> Vec<Node> {
    stmts.iter().map(stmt_node).collect()
}

fn place_children(place: &Place, value: &Expr) -> Vec<Node> {
    let mut children: Vec<Node> = place
        .indices
        .iter()
        .map(|index| Node::with("index", vec![expr_node(index)]))
        .collect();
    children.push(expr_node(value));
    children
}

fn stmt_node(stmt: &Stmt) -> Node {
    match &stmt.kind {
        StmtKind::Output(expr) => Node::with("show", vec![expr_node(expr)]),
        StmtKind::Assign { target, value } => Node::with(
            format!("assign: {}", target.name.text),
            place_children(target, value),
        ),
        StmtKind::Update { target, op } => Node::leaf(format!("update: {}{op}", target.text)),
        StmtKind::Call(call) => call_node(call),
        StmtKind::If {
            branches,
            otherwise,
        } => {
            let mut children: Vec<Node> = branches
                .iter()
                .map(|branch| {
                    Node::with(
                        "branch",
                        vec![
                            Node::with("cond", vec![expr_node(&branch.cond)]),
                            Node::with("then", stmt_nodes(&branch.body)),
                        ],
                    )
                })
                .collect();
            if let Some(body) = otherwise {
                children.push(Node::with("else", stmt_nodes(body)));
            }
            Node::with("if", children)
        }
        StmtKind::While { cond, body } => Node::with(
            "while",
            vec![
                Node::with("cond", vec![expr_node(cond)]),
                Node::with("body", stmt_nodes(body)),
            ],
        ),
        StmtKind::For { var, range, body } => Node::with(
            format!("for: {}", var.text),
            vec![
                Node::with("range", range.iter().map(expr_node).collect()),
                Node::with("body", stmt_nodes(body)),
            ],
        ),
        StmtKind::Try { body, fail, always } => {
            let mut children = vec![
                Node::with("body", stmt_nodes(body)),
                Node::with("fail", stmt_nodes(fail)),
            ];
            if let Some(always) = always {
                children.push(Node::with("always", stmt_nodes(always)));
            }
            Node::with("try", children)
        }
        StmtKind::Todo => Node::leaf("todo"),
        StmtKind::ArrayAdd { target, value } => Node::with(
            format!("array_add: {}", target.name.text),
            place_children(target, value),
        ),
        StmtKind::ArrayRemove { target, value } => Node::with(
            format!("array_remove: {}", target.name.text),
            place_children(target, value),
        ),
    }
}

fn call_node(call: &Call) -> Node {
    Node::with(
        format!("call: {}", call.callee.text),
        call.args.iter().map(expr_node).collect(),
    )
}

fn expr_node(expr: &Expr) -> Node {
    match &expr.kind {
        ExprKind::Int(value) => Node::leaf(format!("int: {value}")),
        ExprKind::Float(value) => Node::leaf(format!("float: {value:?}")),
        ExprKind::Str(value) => Node::leaf(format!("string: {value:?}")),
        ExprKind::Bool(value) => Node::leaf(format!("bool: {value}")),
        ExprKind::Ident(name) => Node::leaf(format!("ident: {name}")),
        ExprKind::Binary { op, lhs, rhs } => {
            Node::with(format!("binary: {op}"), vec![expr_node(lhs), expr_node(rhs)])
        }
        ExprKind::Unary { op, operand } => {
            Node::with(format!("unary: {op}"), vec![expr_node(operand)])
        }
        ExprKind::Call(call) => call_node(call),
        ExprKind::Index { base, indices } => {
            let mut children = vec![expr_node(base)];
            children.extend(
                indices
                    .iter()
                    .map(|index| Node::with("index", vec![expr_node(index)])),
            );
            Node::with("subscript", children)
        }
        ExprKind::Cast { target, expr } => {
            Node::with(format!("cast: {target}"), vec![expr_node(expr)])
        }
        ExprKind::Array(items) => Node::with("array", items.iter().map(expr_node).collect()),
        ExprKind::Read => Node::leaf("read"),
    }
}
