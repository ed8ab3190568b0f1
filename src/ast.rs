//! Abstract syntax tree for Brewin programs.
//!
//! Nodes own their data (names are `String`s) so the tree outlives the token
//! buffer it was parsed from. Function and lambda bodies are shared through
//! `Rc<FuncDecl>` because runtime values (`Function`, `Lambda`) refer back to
//! them by identity.

use std::rc::Rc;

use serde::Serialize;

/// A whole program: the catalog of top-level function declarations.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub functions: Vec<Rc<FuncDecl>>,
}

/// A named top-level function or an anonymous lambda body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncDecl {
    /// `None` for lambda literals.
    pub name: Option<String>,

    pub params: Vec<Param>,

    pub body: Vec<Stmt>,

    /// 1‑based line of the `func` / `lambda` keyword.
    pub line: usize,
}

impl FuncDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("lambda")
    }
}

/// A formal parameter, optionally passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub by_ref: bool,
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Target {
    /// `name = …`
    Variable(String),

    /// `object.field = …`
    Field { object: String, field: String },
}

/// Call-site shape shared by statements and expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Call {
    /// `name(args)`
    Function { name: String, args: Vec<Expr> },

    /// `objref.name(args)`
    Method {
        objref: String,
        name: String,
        args: Vec<Expr>,
    },
}

impl Call {
    pub fn name(&self) -> &str {
        match self {
            Call::Function { name, .. } | Call::Method { name, .. } => name,
        }
    }

    pub fn args(&self) -> &[Expr] {
        match self {
            Call::Function { args, .. } | Call::Method { args, .. } => args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// `target = expression;`
    Assign { target: Target, value: Expr },

    /// A call evaluated for its side effects.
    Call(Call),

    /// `return expression?;`
    Return(Option<Expr>),

    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },

    While { condition: Expr, body: Vec<Stmt> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// Arithmetic negation `-x`.
    Neg,

    /// Logical not `!x`.
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),
    Nil,

    /// Bare name: a variable, or a top-level function used as a value.
    Variable(String),

    /// `object.field`
    Field { object: String, field: String },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Call(Call),

    /// `@`
    Object,

    /// `lambda(params) { body }`
    Lambda(Rc<FuncDecl>),
}
