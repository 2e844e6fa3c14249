//! # Abstract Syntax Tree
//!
//! Defines the tree the parser builds (§4.3) and the later phases consume.
//!
//! Nodes carry the typed fields the grammar names directly; there is no
//! attribute map layered on top. The analyzer and code generator compute
//! whatever additional information they need (inferred type, generated
//! code) as ordinary return values of a tree walk, rather than stashing it
//! back onto the node.

/// A 1-indexed source line, attached to every node that can anchor a
/// diagnostic.
pub type Line = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub var_decls: Vec<VarDecl>,
    pub func_decls: Vec<FuncDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    Void,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Void => write!(f, "void"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub ty: Type,
    pub name: String,
    /// `Some(n)` for an array declaration of length `n`; `None` for a scalar.
    pub array_len: Option<ArrayLen>,
    pub line: Line,
}

/// The array-length literal as written, kept alongside its parsed value so
/// "array length must be positive" can quote the offending literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLen {
    pub value: i64,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub return_ty: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: Type,
    pub name: String,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub var_decls: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assignment {
        target: Location,
        value: Expr,
        line: Line,
    },
    Call(FuncCall),
    Conditional {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        line: Line,
    },
    While {
        cond: Expr,
        body: Block,
        line: Line,
    },
    Return {
        value: Option<Expr>,
        line: Line,
    },
    Break {
        line: Line,
    },
    Continue {
        line: Line,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    /// `Some(index)` for `name[index]`; `None` for a bare scalar reference.
    pub index: Option<Box<Expr>>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit { value: i64, line: Line },
    BoolLit { value: bool, line: Line },
    StringLit { value: String, line: Line },
    Location(Location),
    Call(FuncCall),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: Line,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: Line,
    },
}

impl Expr {
    pub fn line(&self) -> Line {
        match self {
            Expr::IntLit { line, .. }
            | Expr::BoolLit { line, .. }
            | Expr::StringLit { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. } => *line,
            Expr::Location(loc) => loc.line,
            Expr::Call(call) => call.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    /// Arithmetic operators require `int` operands and yield `int`.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    /// Relational operators require `int` operands and yield `bool`.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Equality operators accept either `int` or `bool` on both sides.
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    /// Logical operators require `bool` operands and yield `bool`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{s}")
    }
}
