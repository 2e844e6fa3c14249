//! # Symbol tables
//!
//! Per-scope symbol tables attached to the AST's scope-bearing nodes
//! (`Program`, `FuncDecl`, `Block`) and the lexical lookup chain between
//! them (§3 "Symbol table", §4.4).
//!
//! The source links a scope to its parent through a raw pointer. Per the
//! spec's own design note ("implement as an index into a flat
//! per-compilation scope arena rather than a pointer to avoid lifetime
//! tangles") scopes here are entries in a [`ScopeArena`], addressed by
//! [`ScopeId`]; `lookup` walks the chain of parent indices instead of
//! parent pointers.

use crate::parser::ast::{Line, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Scalar,
    Array { len: i64 },
    Function { params: Vec<Type>, return_ty: Type },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared type: element type for scalars/arrays, return type for
    /// functions.
    pub ty: Type,
    pub line: Line,
}

impl Symbol {
    pub fn scalar(name: impl Into<String>, ty: Type, line: Line) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Scalar,
            ty,
            line,
        }
    }

    pub fn array(name: impl Into<String>, ty: Type, len: i64, line: Line) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Array { len },
            ty,
            line,
        }
    }

    pub fn function(name: impl Into<String>, params: Vec<Type>, return_ty: Type, line: Line) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Function { params, return_ty },
            ty: return_ty,
            line,
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    symbols: Vec<Symbol>,
}

/// A flat store of every scope opened during a single analysis run.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            symbols: Vec::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Insert `symbol` into `scope`'s local list unconditionally, returning
    /// `true` if a symbol with the same name was already declared locally
    /// (§4.4: duplicate insertion is diagnosed by the caller but never
    /// aborted).
    pub fn insert(&mut self, scope: ScopeId, symbol: Symbol) -> bool {
        let local = &mut self.scopes[scope.0].symbols;
        let duplicate = local.iter().any(|s| s.name == symbol.name);
        local.push(symbol);
        duplicate
    }

    /// Walk outward from `scope`'s local list to the enclosing chain,
    /// returning the first symbol named `name` (§4.4 `lookup`).
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0];
            if let Some(sym) = s.symbols.iter().find(|s| s.name == name) {
                return Some(sym);
            }
            current = s.parent;
        }
        None
    }
}

/// The type tag used for type inference (§3 "Source-language type tag").
/// `Unknown` is never the declared type of a symbol; it only ever appears
/// as an inferred expression type, to suppress cascading diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Bool,
    Str,
    Void,
    Unknown,
}

impl From<Type> for ValueType {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Int => ValueType::Int,
            Type::Bool => ValueType::Bool,
            Type::Void => ValueType::Void,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Str => "str",
            ValueType::Void => "void",
            ValueType::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}
