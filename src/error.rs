//! # Diagnostics
//!
//! Every phase reports problems through one of the three types here.
//!
//! - [`LexError`] and [`ParseError`] are fatal: the lexer/parser stop at the
//!   first one and return no tokens/AST (§7).
//! - [`SemanticError`] is accumulated: the analyzer always runs to
//!   completion and returns a (possibly empty) `Vec<SemanticError>`.
//!
//! Code generation and register allocation assume a validated tree and do
//! not produce diagnostics of their own; a violated invariant there is a
//! compiler bug, not a user-facing error (§7).

use thiserror::Error;

/// A 1-indexed source line.
pub type Line = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid token on line {line}: \"{snippet}\"")]
pub struct LexError {
    pub line: Line,
    pub snippet: String,
}

impl LexError {
    pub fn invalid_token(line: Line, snippet: impl Into<String>) -> Self {
        Self {
            line,
            snippet: snippet.into(),
        }
    }

    /// A forbidden reserved word was lexed (§4.2 item 3).
    pub fn reserved_word(line: Line, word: &str) -> Self {
        Self {
            line,
            snippet: format!("'{word}' is a reserved word and is not supported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected {expected} but found {found} on line {line}")]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub line: Line,
}

impl ParseError {
    pub fn new(expected: impl Into<String>, found: impl Into<String>, line: Line) -> Self {
        Self {
            expected: expected.into(),
            found: found.into(),
            line,
        }
    }
}

/// Fatal errors that can short-circuit the front end, wrapped for `?` in the driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// One semantic diagnostic, anchored to the line of the construct that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct SemanticError {
    pub line: Line,
    pub kind: SemanticErrorKind,
}

impl SemanticError {
    pub fn new(line: Line, kind: SemanticErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Every semantic diagnostic family named in §4.4/§4.5.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticErrorKind {
    #[error("Duplicate symbols named '{name}' in scope started on line {scope_line}")]
    DuplicateSymbol { name: String, scope_line: Line },

    #[error("Symbol '{name}' undefined on line {line}")]
    UndefinedSymbol { name: String, line: Line },

    #[error("'{name}' is a scalar and cannot be indexed")]
    NotAnArray { name: String },

    #[error("'{name}' is an array and requires an index")]
    NotAScalar { name: String },

    #[error("'{name}' is a function and cannot be used as a variable")]
    FunctionUsedAsVariable { name: String },

    #[error("array index must be of type int, found {found}")]
    NonIntIndex { found: String },

    #[error("variable declarations cannot have type void")]
    VoidVariable,

    #[error("array length must be a positive literal")]
    NonPositiveArrayLength,

    #[error("arrays are only permitted at global scope")]
    LocalArray,

    #[error("type mismatch in assignment: target is {target}, value is {value}")]
    AssignmentTypeMismatch { target: String, value: String },

    #[error("unary operator {op} expects operand of type {expected}, found {found}")]
    UnaryOperandMismatch {
        op: String,
        expected: String,
        found: String,
    },

    #[error("operator {op} requires both operands to have the same type, found {left} and {right}")]
    BinaryOperandTypeMismatch {
        op: String,
        left: String,
        right: String,
    },

    #[error("operator {op} expects operands of type {expected}, found {left} and {right}")]
    BinaryOperandMismatch {
        op: String,
        expected: String,
        left: String,
        right: String,
    },

    #[error("condition must be of type bool, found {found}")]
    NonBoolCondition { found: String },

    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of '{name}' must be of type {expected}, found {found}")]
    ArgumentTypeMismatch {
        name: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("'{name}' is called but is not a function")]
    NotAFunction { name: String },

    #[error("void function '{name}' cannot be used as a value")]
    VoidValueUsed { name: String },

    #[error("void function cannot return a value")]
    ReturnFromVoid,

    #[error("non-void function must return a value of type {expected}")]
    MissingReturnValue { expected: String },

    #[error("return value has type {found}, expected {expected}")]
    ReturnTypeMismatch { expected: String, found: String },

    #[error("'{keyword}' outside of a loop")]
    LoopControlOutsideLoop { keyword: String },

    #[error("program must define a 'main' function")]
    MissingMain,

    #[error("'main' must return int and take no parameters")]
    InvalidMainSignature,
}
