//! # Analyzer
//!
//! Tree-walking type inference and semantic validation (§4.5). There is no
//! visitor object with pre/post-visit callbacks and no attribute map: each
//! expression kind gets an `infer_*` function that returns the node's
//! [`ValueType`] and pushes diagnostics into [`Ctx`] as a side effect,
//! mirroring the recursive-descent parser rather than the source's
//! attribute-grammar traversal (§9 "Tree visitor with pre/post hooks").
//!
//! Analysis never stops early: every diagnostic family in this module is
//! accumulated into `Ctx::errors` and `analyze` always returns the full
//! list, possibly empty (§7).

#[cfg(test)]
mod tests;

use crate::error::{SemanticError, SemanticErrorKind as Kind};
use crate::parser::ast::*;
use crate::sema::symbol::{ScopeArena, ScopeId, Symbol, SymbolKind, ValueType};

/// Built-in functions resolved without a user declaration (§6).
const BUILTIN_PRINT_INT: &str = "print_int";
const BUILTIN_PRINT_BOOL: &str = "print_bool";
const BUILTIN_PRINT_STR: &str = "print_str";

pub fn analyze(program: &Program) -> Vec<SemanticError> {
    log::debug!(
        "analyze: {} global(s), {} function(s)",
        program.var_decls.len(),
        program.func_decls.len()
    );
    let mut ctx = Ctx::new();
    ctx.analyze_program(program);
    log::debug!("analyze: {} diagnostic(s)", ctx.errors.len());
    ctx.errors
}

struct Ctx {
    scopes: ScopeArena,
    current_return_ty: Option<Type>,
    loop_depth: u32,
    errors: Vec<SemanticError>,
}

impl Ctx {
    fn new() -> Self {
        Self {
            scopes: ScopeArena::new(),
            current_return_ty: None,
            loop_depth: 0,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, line: Line, kind: Kind) {
        self.errors.push(SemanticError::new(line, kind));
    }

    fn analyze_program(&mut self, program: &Program) {
        let global = self.scopes.new_scope(None);

        // Pass 1: insert every top-level symbol so forward references
        // (a function calling one declared later, or referencing a global
        // declared later in the file) resolve correctly.
        for decl in &program.var_decls {
            let sym = var_decl_symbol(decl);
            if self.scopes.insert(global, sym) {
                self.push(
                    decl.line,
                    Kind::DuplicateSymbol {
                        name: decl.name.clone(),
                        scope_line: 0,
                    },
                );
            }
        }
        for func in &program.func_decls {
            let params = func.params.iter().map(|p| p.ty).collect();
            let sym = Symbol::function(&func.name, params, func.return_ty, func.line);
            if self.scopes.insert(global, sym) {
                self.push(
                    func.line,
                    Kind::DuplicateSymbol {
                        name: func.name.clone(),
                        scope_line: 0,
                    },
                );
            }
        }

        // Pass 2: validate global declarations and walk every function body.
        for decl in &program.var_decls {
            self.check_var_decl(decl, true);
        }
        for func in &program.func_decls {
            self.analyze_func_decl(func, global);
        }

        self.check_main(global);
    }

    fn check_main(&mut self, global: ScopeId) {
        let Some(sym) = self.scopes.lookup(global, "main").cloned() else {
            self.push(0, Kind::MissingMain);
            return;
        };
        match &sym.kind {
            SymbolKind::Function { params, return_ty } => {
                if !params.is_empty() || *return_ty != Type::Int {
                    self.push(sym.line, Kind::InvalidMainSignature);
                }
            }
            _ => self.push(sym.line, Kind::InvalidMainSignature),
        }
    }

    fn check_var_decl(&mut self, decl: &VarDecl, is_global: bool) {
        if decl.ty == Type::Void {
            self.push(decl.line, Kind::VoidVariable);
        }
        if let Some(array_len) = &decl.array_len {
            if array_len.value <= 0 {
                self.push(array_len.line, Kind::NonPositiveArrayLength);
            }
            if !is_global {
                self.push(decl.line, Kind::LocalArray);
            }
        }
    }

    fn analyze_func_decl(&mut self, func: &FuncDecl, global: ScopeId) {
        let params_scope = self.scopes.new_scope(Some(global));
        for param in &func.params {
            let sym = Symbol::scalar(&param.name, param.ty, param.line);
            if self.scopes.insert(params_scope, sym) {
                self.push(
                    param.line,
                    Kind::DuplicateSymbol {
                        name: param.name.clone(),
                        scope_line: func.line,
                    },
                );
            }
        }

        let saved_return_ty = self.current_return_ty.replace(func.return_ty);
        let saved_loop_depth = std::mem::take(&mut self.loop_depth);

        self.analyze_block(&func.body, params_scope, func.line);

        self.current_return_ty = saved_return_ty;
        self.loop_depth = saved_loop_depth;
    }

    /// `scope_line` is the line of the construct that owns this block (the
    /// function, `if`, or `while`), quoted in duplicate-symbol diagnostics;
    /// `Block` itself carries no line of its own.
    fn analyze_block(&mut self, block: &Block, parent: ScopeId, scope_line: Line) {
        let scope = self.scopes.new_scope(Some(parent));

        for decl in &block.var_decls {
            self.check_var_decl(decl, false);
            let sym = var_decl_symbol(decl);
            if self.scopes.insert(scope, sym) {
                self.push(
                    decl.line,
                    Kind::DuplicateSymbol {
                        name: decl.name.clone(),
                        scope_line,
                    },
                );
            }
        }

        for stmt in &block.stmts {
            self.analyze_stmt(stmt, scope);
        }
    }

    fn analyze_stmt(&mut self, stmt: &Stmt, scope: ScopeId) {
        match stmt {
            Stmt::Assignment {
                target,
                value,
                line,
            } => {
                let target_ty = self.infer_location(target, scope);
                let value_ty = self.infer_expr(value, scope);
                if target_ty != ValueType::Unknown
                    && value_ty != ValueType::Unknown
                    && target_ty != value_ty
                {
                    self.push(
                        *line,
                        Kind::AssignmentTypeMismatch {
                            target: target_ty.to_string(),
                            value: value_ty.to_string(),
                        },
                    );
                }
            }
            Stmt::Call(call) => {
                self.check_call(call, scope);
            }
            Stmt::Conditional {
                cond,
                then_block,
                else_block,
                line,
            } => {
                self.check_condition(cond, scope, *line);
                self.analyze_block(then_block, scope, *line);
                if let Some(else_block) = else_block {
                    self.analyze_block(else_block, scope, *line);
                }
            }
            Stmt::While { cond, body, line } => {
                self.check_condition(cond, scope, *line);
                self.loop_depth += 1;
                self.analyze_block(body, scope, *line);
                self.loop_depth -= 1;
            }
            Stmt::Return { value, line } => self.analyze_return(value.as_ref(), scope, *line),
            Stmt::Break { line } => {
                if self.loop_depth == 0 {
                    self.push(
                        *line,
                        Kind::LoopControlOutsideLoop {
                            keyword: "break".to_string(),
                        },
                    );
                }
            }
            Stmt::Continue { line } => {
                if self.loop_depth == 0 {
                    self.push(
                        *line,
                        Kind::LoopControlOutsideLoop {
                            keyword: "continue".to_string(),
                        },
                    );
                }
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr, scope: ScopeId, line: Line) {
        let ty = self.infer_expr(cond, scope);
        if ty != ValueType::Unknown && ty != ValueType::Bool {
            self.push(line, Kind::NonBoolCondition { found: ty.to_string() });
        }
    }

    fn analyze_return(&mut self, value: Option<&Expr>, scope: ScopeId, line: Line) {
        let return_ty = self
            .current_return_ty
            .expect("Return only occurs inside a FuncDecl body");
        match (return_ty, value) {
            (Type::Void, Some(expr)) => {
                self.infer_expr(expr, scope);
                self.push(line, Kind::ReturnFromVoid);
            }
            (Type::Void, None) => {}
            (_, None) => {
                self.push(
                    line,
                    Kind::MissingReturnValue {
                        expected: ValueType::from(return_ty).to_string(),
                    },
                );
            }
            (_, Some(expr)) => {
                let found = self.infer_expr(expr, scope);
                let expected = ValueType::from(return_ty);
                if found != ValueType::Unknown && found != expected {
                    self.push(
                        line,
                        Kind::ReturnTypeMismatch {
                            expected: expected.to_string(),
                            found: found.to_string(),
                        },
                    );
                }
            }
        }
    }

    fn infer_expr(&mut self, expr: &Expr, scope: ScopeId) -> ValueType {
        match expr {
            Expr::IntLit { .. } => ValueType::Int,
            Expr::BoolLit { .. } => ValueType::Bool,
            Expr::StringLit { .. } => ValueType::Str,
            Expr::Location(loc) => self.infer_location(loc, scope),
            Expr::Call(call) => {
                let ty = self.check_call(call, scope);
                if ty == ValueType::Void {
                    self.push(
                        call.line,
                        Kind::VoidValueUsed {
                            name: call.name.clone(),
                        },
                    );
                    ValueType::Unknown
                } else {
                    ty
                }
            }
            Expr::Unary { op, operand, line } => self.infer_unary(*op, operand, scope, *line),
            Expr::Binary {
                op,
                left,
                right,
                line,
            } => self.infer_binary(*op, left, right, scope, *line),
        }
    }

    fn infer_unary(&mut self, op: UnaryOp, operand: &Expr, scope: ScopeId, line: Line) -> ValueType {
        let operand_ty = self.infer_expr(operand, scope);
        if operand_ty == ValueType::Unknown {
            return ValueType::Unknown;
        }
        let expected = match op {
            UnaryOp::Neg => ValueType::Int,
            UnaryOp::Not => ValueType::Bool,
        };
        if operand_ty != expected {
            self.push(
                line,
                Kind::UnaryOperandMismatch {
                    op: op.to_string(),
                    expected: expected.to_string(),
                    found: operand_ty.to_string(),
                },
            );
            return ValueType::Unknown;
        }
        expected
    }

    fn infer_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        scope: ScopeId,
        line: Line,
    ) -> ValueType {
        let left_ty = self.infer_expr(left, scope);
        let right_ty = self.infer_expr(right, scope);
        if left_ty == ValueType::Unknown || right_ty == ValueType::Unknown {
            return ValueType::Unknown;
        }

        if op.is_equality() {
            if left_ty != right_ty {
                self.push(
                    line,
                    Kind::BinaryOperandTypeMismatch {
                        op: op.to_string(),
                        left: left_ty.to_string(),
                        right: right_ty.to_string(),
                    },
                );
                return ValueType::Unknown;
            }
            return ValueType::Bool;
        }

        let (expected, result) = if op.is_arithmetic() {
            (ValueType::Int, ValueType::Int)
        } else if op.is_relational() {
            (ValueType::Int, ValueType::Bool)
        } else {
            debug_assert!(op.is_logical());
            (ValueType::Bool, ValueType::Bool)
        };

        if left_ty != expected || right_ty != expected {
            self.push(
                line,
                Kind::BinaryOperandMismatch {
                    op: op.to_string(),
                    expected: expected.to_string(),
                    left: left_ty.to_string(),
                    right: right_ty.to_string(),
                },
            );
            return ValueType::Unknown;
        }
        result
    }

    fn infer_location(&mut self, loc: &Location, scope: ScopeId) -> ValueType {
        let Some(symbol) = self.scopes.lookup(scope, &loc.name) else {
            self.push(
                loc.line,
                Kind::UndefinedSymbol {
                    name: loc.name.clone(),
                    line: loc.line,
                },
            );
            if let Some(index) = &loc.index {
                self.infer_expr(index, scope);
            }
            return ValueType::Unknown;
        };
        let symbol = symbol.clone();

        match &symbol.kind {
            SymbolKind::Function { .. } => {
                self.push(
                    loc.line,
                    Kind::FunctionUsedAsVariable {
                        name: symbol.name.clone(),
                    },
                );
                ValueType::Unknown
            }
            SymbolKind::Scalar => {
                if loc.index.is_some() {
                    self.push(
                        loc.line,
                        Kind::NotAnArray {
                            name: symbol.name.clone(),
                        },
                    );
                    return ValueType::Unknown;
                }
                ValueType::from(symbol.ty)
            }
            SymbolKind::Array { .. } => {
                let Some(index) = &loc.index else {
                    self.push(
                        loc.line,
                        Kind::NotAScalar {
                            name: symbol.name.clone(),
                        },
                    );
                    return ValueType::Unknown;
                };
                let index_ty = self.infer_expr(index, scope);
                if index_ty != ValueType::Unknown && index_ty != ValueType::Int {
                    self.push(
                        loc.line,
                        Kind::NonIntIndex {
                            found: index_ty.to_string(),
                        },
                    );
                }
                ValueType::from(symbol.ty)
            }
        }
    }

    /// Returns the callee's return type. Built-ins (§6) are always resolved
    /// without consulting the symbol table, even if a user declares a
    /// function with the same name.
    fn check_call(&mut self, call: &FuncCall, scope: ScopeId) -> ValueType {
        if let Some(expected_arg) = builtin_arg_type(&call.name) {
            if call.args.len() != 1 {
                self.push(
                    call.line,
                    Kind::ArityMismatch {
                        name: call.name.clone(),
                        expected: 1,
                        found: call.args.len(),
                    },
                );
            }
            for arg in &call.args {
                let arg_ty = self.infer_expr(arg, scope);
                if arg_ty != ValueType::Unknown && arg_ty != expected_arg {
                    self.push(
                        call.line,
                        Kind::ArgumentTypeMismatch {
                            name: call.name.clone(),
                            index: 1,
                            expected: expected_arg.to_string(),
                            found: arg_ty.to_string(),
                        },
                    );
                }
            }
            return ValueType::Void;
        }

        let Some(symbol) = self.scopes.lookup(scope, &call.name) else {
            self.push(
                call.line,
                Kind::UndefinedSymbol {
                    name: call.name.clone(),
                    line: call.line,
                },
            );
            for arg in &call.args {
                self.infer_expr(arg, scope);
            }
            return ValueType::Unknown;
        };
        let symbol = symbol.clone();

        let SymbolKind::Function { params, return_ty } = &symbol.kind else {
            self.push(
                call.line,
                Kind::NotAFunction {
                    name: symbol.name.clone(),
                },
            );
            for arg in &call.args {
                self.infer_expr(arg, scope);
            }
            return ValueType::Unknown;
        };

        let arg_types: Vec<ValueType> = call.args.iter().map(|a| self.infer_expr(a, scope)).collect();
        if params.len() != call.args.len() {
            self.push(
                call.line,
                Kind::ArityMismatch {
                    name: symbol.name.clone(),
                    expected: params.len(),
                    found: call.args.len(),
                },
            );
        } else {
            for (i, (param_ty, arg_ty)) in params.iter().zip(arg_types.iter()).enumerate() {
                let expected = ValueType::from(*param_ty);
                if *arg_ty != ValueType::Unknown && *arg_ty != expected {
                    self.push(
                        call.line,
                        Kind::ArgumentTypeMismatch {
                            name: symbol.name.clone(),
                            index: i + 1,
                            expected: expected.to_string(),
                            found: arg_ty.to_string(),
                        },
                    );
                }
            }
        }

        ValueType::from(*return_ty)
    }
}

fn var_decl_symbol(decl: &VarDecl) -> Symbol {
    match &decl.array_len {
        Some(len) => Symbol::array(&decl.name, decl.ty, len.value, decl.line),
        None => Symbol::scalar(&decl.name, decl.ty, decl.line),
    }
}

fn builtin_arg_type(name: &str) -> Option<ValueType> {
    match name {
        BUILTIN_PRINT_INT => Some(ValueType::Int),
        BUILTIN_PRINT_BOOL => Some(ValueType::Bool),
        BUILTIN_PRINT_STR => Some(ValueType::Str),
        _ => None,
    }
}
