use std::rc::Rc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

// ─── Functions ───────────────────────────────────────────────────────────────

/// Shared between the AST and every function value created from it.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `function name(a, b); ... end`
    Function(Rc<FunctionDecl>),
    /// `return expr;` or bare `return;`
    Return(Option<Expr>, Span),
    /// `if (c); ... elseif (c); ... else; ... end`
    If(IfStmt),
    /// `while (c); ... end`
    While(WhileStmt),
    /// `for (i, n); ... end`
    For(ForStmt),
    Break(Span),
    Continue(Span),
    /// A standalone expression: calls, assignments, updates.
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Vec<Stmt>,
    /// Flat list, tried in order. Never nested `If` nodes.
    pub elseifs: Vec<ElseIf>,
    pub else_block: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub var_name: String,
    pub count: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    /// May contain `${expr}` markers, resolved each time the node is visited.
    Str(String),
    Bool(bool),
    Null,
    Undefined,
}

/// The only shapes allowed on the left of `=`.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    Variable(String),
    Member { object: Box<Expr>, property: String },
    Index { object: Box<Expr>, index: Box<Expr> },
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal, Span),
    Variable(String, Span),

    /// `target = value` (right-associative)
    Assign {
        target: AssignTarget,
        value: Box<Expr>,
        span: Span,
    },

    /// `target += value` and friends
    CompoundAssign {
        target: AssignTarget,
        op: BinOp,
        value: Box<Expr>,
        span: Span,
    },

    /// `x++` / `x--` on a plain variable; yields the old value.
    Update {
        op: UpdateOp,
        name: String,
        span: Span,
    },

    /// `-x`, `not x`, `!x`
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `a + b`, `a == b`, `a and b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `callee(args)` where callee is any postfix expression.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// `expr.property`
    Member {
        object: Box<Expr>,
        property: String,
        span: Span,
    },

    /// `expr[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// `[a, b, c]`
    Array(Vec<Expr>, Span),

    /// `{ key: value, "other": value }` in source order, duplicate keys
    /// keep the first position and the last value.
    Object(Vec<(String, Expr)>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, s)  => *s,
            Expr::Variable(_, s) => *s,
            Expr::Assign { span, .. }         => *span,
            Expr::CompoundAssign { span, .. } => *span,
            Expr::Update { span, .. } => *span,
            Expr::Unary { span, .. }  => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Call { span, .. }   => *span,
            Expr::Member { span, .. } => *span,
            Expr::Index { span, .. }  => *span,
            Expr::Array(_, s)  => *s,
            Expr::Object(_, s) => *s,
        }
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add, Sub, Mul, Div,
    Eq, NotEq,
    Lt, LtEq, Gt, GtEq,
    And, Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add   => "+",  BinOp::Sub  => "-",
            BinOp::Mul   => "*",  BinOp::Div  => "/",
            BinOp::Eq    => "==", BinOp::NotEq => "!=",
            BinOp::Lt    => "<",  BinOp::LtEq => "<=",
            BinOp::Gt    => ">",  BinOp::GtEq => ">=",
            BinOp::And   => "&&", BinOp::Or   => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}
