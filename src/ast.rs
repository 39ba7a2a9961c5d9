use crate::error::Span;
use std::rc::Rc;

/// A parsed program. Nested blocks own their statements.
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let name = value`
    Let {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `name = value`, with or without a prior binding.
    Assign {
        name: String,
        value: Expr,
        span: Span,
    },
    Print {
        expr: Expr,
        span: Span,
    },
    Input {
        name: String,
        span: Span,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    For {
        variable: String,
        iterable: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Function {
        name: String,
        params: Vec<String>,
        // Shared with the function table once the declaration runs.
        body: Rc<[Stmt]>,
        span: Span,
    },
    /// A call whose result is discarded.
    Call {
        call: Call,
        span: Span,
    },
    Return {
        value: Expr,
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Integer {
        value: i64,
        span: Span,
    },
    String {
        value: String,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    List {
        elements: Vec<Expr>,
        span: Span,
    },
    Grouping {
        expr: Box<Expr>,
        span: Span,
    },
    Call(Call),
    /// Every operator shares one precedence level and associates to the left.
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Integer { span, .. } => span,
            Expr::String { span, .. } => span,
            Expr::Variable { span, .. } => span,
            Expr::List { span, .. } => span,
            Expr::Grouping { span, .. } => span,
            Expr::Call(call) => &call.span,
            Expr::Binary { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    /// Binary-shaped: the left operand is evaluated and ignored.
    Not,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Not => "not",
        }
    }
}
