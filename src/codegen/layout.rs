//! # Frame layout
//!
//! Assigns every declared variable a storage location before code
//! generation walks the tree. This is a second, independent pass over the
//! same validated AST the analyzer already checked: it shares no state with
//! [`crate::sema`] because nothing it computes (offsets, base registers)
//! needs to survive into, or come from, name resolution. Decoupling the two
//! means code generation never has to reach back into the analyzer's scope
//! arena for data it never populated.
//!
//! The scope chain itself is the same arena-of-indices shape as
//! [`crate::sema::symbol::ScopeArena`] (§9 "avoid lifetime tangles"), just
//! carrying [`Storage`] instead of a type tag.

use std::collections::HashMap;

use crate::parser::ast::{Program, Type};

/// Where a variable lives, relative to the frame/global base that addresses
/// it (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// A scalar at a fixed offset from the start of global data.
    Global(i64),
    /// An array at a fixed offset from the start of global data; `elem_size`
    /// is 8 for `int` elements, 1 for `bool` elements (§4.6).
    GlobalArray { offset: i64, elem_size: i64 },
    /// A scalar parameter at a positive offset from the frame base (§4.6,
    /// §9 calling convention: `param0` is `bp+8`, `param1` is `bp+16`, ...).
    Param(i64),
    /// A scalar local at a negative offset from the frame base. Local
    /// arrays are rejected by the analyzer, so every local is 8 bytes.
    Local(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    entries: Vec<(String, Storage)>,
}

#[derive(Debug, Default)]
pub struct FrameArena {
    scopes: Vec<Scope>,
}

impl FrameArena {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            entries: Vec::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>, storage: Storage) {
        self.scopes[scope.0].entries.push((name.into(), storage));
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Storage {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0];
            if let Some((_, storage)) = s.entries.iter().find(|(n, _)| n == name) {
                return *storage;
            }
            current = s.parent;
        }
        unreachable!("frame layout lookup of '{name}' on a tree the analyzer already validated")
    }
}

pub const WORD_SIZE: i64 = 8;
pub const BOOL_ELEM_SIZE: i64 = 1;

fn elem_size(ty: Type) -> i64 {
    if ty == Type::Bool {
        BOOL_ELEM_SIZE
    } else {
        WORD_SIZE
    }
}

/// Assign every global its offset and return the arena together with the
/// scope every function's parameter scope should chain to.
pub fn layout_globals(program: &Program) -> (FrameArena, ScopeId) {
    let mut arena = FrameArena::new();
    let global = arena.new_scope(None);
    let mut offset = 0i64;
    for decl in &program.var_decls {
        match &decl.array_len {
            Some(len) => {
                let size = elem_size(decl.ty);
                arena.declare(
                    global,
                    decl.name.clone(),
                    Storage::GlobalArray {
                        offset,
                        elem_size: size,
                    },
                );
                offset += size * len.value;
            }
            None => {
                arena.declare(global, decl.name.clone(), Storage::Global(offset));
                offset += WORD_SIZE;
            }
        }
    }
    (arena, global)
}

/// Signature of every declared function, used by call codegen to decide
/// whether a result register is expected (§4.6, §9 calling convention).
/// Argument count for the caller's stack cleanup comes directly from the
/// call site, already checked against arity by the analyzer.
#[derive(Debug, Clone, Copy)]
pub struct FuncSig {
    pub return_ty: Type,
}

pub fn collect_signatures(program: &Program) -> HashMap<String, FuncSig> {
    program
        .func_decls
        .iter()
        .map(|f| (f.name.clone(), FuncSig { return_ty: f.return_ty }))
        .collect()
}
