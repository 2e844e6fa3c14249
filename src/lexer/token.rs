//! # Token
//!
//! Defines the token shape produced by the lexer and consumed by the parser
//! (§3, §4.2). A token is a tagged kind plus the original (or, for string
//! literals, the escape-resolved) text and the 1-indexed source line it
//! started on.

/// Reserved words of the source language (§4.2 item 2), checked before the
/// general identifier rule.
pub const KEYWORDS: &[&str] = &[
    "if", "else", "while", "return", "int", "bool", "def", "true", "false", "void", "break",
    "continue",
];

/// Reserved words borrowed from a superset language but not supported here
/// (§4.2 item 3). Lexing one of these is a fatal [`crate::error::LexError`].
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "for",
    "callout",
    "class",
    "interface",
    "extends",
    "implements",
    "new",
    "this",
    "string",
    "float",
    "double",
    "null",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The lexeme as it appeared in source (escape-resolved for string
    /// literals; see [`TokenKind::StringLit`]).
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Id,
    Keyword,
    Symbol,
    DecimalLit(i64),
    HexLit(i64),
    StringLit(String),
    Eof,
}

impl Token {
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    pub fn is_symbol(&self, sym: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == sym
    }

    /// A short human-readable description used in "found X" diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::StringLit(_) => format!("string literal \"{}\"", self.text),
            _ => format!("'{}'", self.text),
        }
    }
}
