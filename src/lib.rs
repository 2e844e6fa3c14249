//! # tacc
//!
//! A five-phase ahead-of-time compiler for a small statically-typed
//! imperative language: global variables and functions over `int`, `bool`,
//! and a restricted `void` return type, fixed-size arrays, structured
//! control flow, and recursive calls. Lowers source text to a linear
//! three-address intermediate representation with physical registers
//! suitable for a stack-machine executor.
//!
//! ## Pipeline
//!
//! Each phase consumes the previous phase's output; lex/parse are fatal on
//! the first error, analysis always runs to completion and returns a
//! (possibly empty) diagnostic list, and code generation/register
//! allocation assume a validated tree.
//!
//! 1. [`lexer`] — text → token stream.
//! 2. [`parser`] — token stream → [`parser::ast`].
//! 3. [`sema`] — symbol tables, type inference, semantic checks.
//! 4. [`codegen`] — validated AST → [`ir`] using virtual registers.
//! 5. [`regalloc`] — virtual → physical registers, with spill/reload.
//!
//! ## Example
//!
//! ```rust
//! use tacc::{codegen, lexer, parser, regalloc, sema};
//!
//! let source = "def int main() { return 0; }";
//! let tokens = lexer::lex(source).expect("lex error");
//! let program = parser::parse(&tokens).expect("parse error");
//! let diagnostics = sema::analyze(&program);
//! assert!(diagnostics.is_empty());
//!
//! let ir = codegen::generate(&program);
//! let allocated = regalloc::allocate(&ir, 4);
//! assert!(!allocated.is_empty());
//! ```

pub mod codegen;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod regalloc;
pub mod sema;
