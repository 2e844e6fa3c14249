//! # Code generator
//!
//! Lowers a validated [`crate::parser::ast::Program`] to the flat
//! three-address [`crate::ir`] (C6, §4.6). Every function is generated
//! independently: its virtual-register and anonymous-label counters both
//! start fresh at the function's `LABEL` (§9 "Deterministic id generation"),
//! and [`layout::FrameArena`] gives it its own parameter/local scope
//! chained to the one shared global scope.
//!
//! The source course project's codegen keeps a `suppress_location` flag on
//! the node it's currently visiting so the generic "evaluate this subtree"
//! visitor skips loading an assignment's target before storing into it.
//! There is no node to hang that flag on here (§9, no attribute map), so
//! [`FuncCtx::gen_stmt`]'s `Assignment` arm resolves and stores the target
//! directly instead of visiting it as a generic [`Location`] and suppressing
//! a load it would otherwise emit.

pub mod layout;


use std::collections::HashMap;

use crate::ir::{Instruction, Opcode, Operand};
use crate::parser::ast::*;
use layout::{FrameArena, FuncSig, ScopeId, Storage};

/// The only three functions resolved without a user declaration (§6).
fn builtin_arg_count(name: &str) -> Option<usize> {
    matches!(name, "print_int" | "print_bool" | "print_str").then_some(1)
}

pub fn generate(program: &Program) -> crate::ir::Program {
    log::debug!(
        "codegen: {} global(s), {} function(s)",
        program.var_decls.len(),
        program.func_decls.len()
    );
    let (mut frame, global_scope) = layout::layout_globals(program);
    let sigs = layout::collect_signatures(program);

    let mut out = Vec::new();
    for func in &program.func_decls {
        let mut ctx = FuncCtx::new(&mut frame, global_scope, &sigs);
        ctx.gen_function(func);
        out.extend(ctx.out);
    }
    log::debug!("codegen: emitted {} instruction(s)", out.len());
    out
}

struct FuncCtx<'a> {
    frame: &'a mut FrameArena,
    global_scope: ScopeId,
    sigs: &'a HashMap<String, FuncSig>,
    next_vr: u32,
    next_label: u32,
    global_base: Option<u32>,
    /// `(continue_label, break_label)` for every loop we are nested inside.
    loop_stack: Vec<(u32, u32)>,
    out: Vec<Instruction>,
}

impl<'a> FuncCtx<'a> {
    fn new(
        frame: &'a mut FrameArena,
        global_scope: ScopeId,
        sigs: &'a HashMap<String, FuncSig>,
    ) -> Self {
        Self {
            frame,
            global_scope,
            sigs,
            next_vr: 0,
            next_label: 0,
            global_base: None,
            loop_stack: Vec::new(),
            out: Vec::new(),
        }
    }

    fn new_vr(&mut self) -> u32 {
        let id = self.next_vr;
        self.next_vr += 1;
        id
    }

    fn new_label(&mut self) -> u32 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    fn emit(&mut self, op: Opcode, args: Vec<Operand>) {
        self.out.push(Instruction::new(op, args));
    }

    /// The register holding the constant 0 used to address global data,
    /// materialized on first use and cached for the rest of the function
    /// (§4.6; see module docs for why this is recomputed per function
    /// instead of a single cross-function fixed register).
    fn global_base(&mut self) -> Operand {
        if let Some(vr) = self.global_base {
            return Operand::VirtualReg(vr);
        }
        let vr = self.new_vr();
        self.emit(Opcode::LoadI, vec![Operand::IntConst(0), Operand::VirtualReg(vr)]);
        self.global_base = Some(vr);
        Operand::VirtualReg(vr)
    }

    fn gen_function(&mut self, func: &FuncDecl) {
        self.emit(Opcode::Label, vec![Operand::CallLabel(func.name.clone())]);
        self.emit(Opcode::Push, vec![Operand::BaseRegister]);
        self.emit(Opcode::I2i, vec![Operand::StackRegister, Operand::BaseRegister]);
        // Frame-adjust placeholder. The constant here is the local-variable
        // frame size computed below; register allocation (§4.7) later grows
        // the same constant to make room for spill slots, detecting this
        // instruction by the LABEL/PUSH/I2I/ADD_I shape directly above it.
        let frame_adjust_idx = self.out.len();
        self.emit(
            Opcode::AddI,
            vec![
                Operand::StackRegister,
                Operand::IntConst(0),
                Operand::StackRegister,
            ],
        );

        let params_scope = self.frame.new_scope(Some(self.global_scope));
        for (i, param) in func.params.iter().enumerate() {
            let offset = 8 * (i as i64 + 1);
            self.frame
                .declare(params_scope, param.name.clone(), Storage::Param(offset));
        }

        let mut next_local = -8i64;
        self.gen_block(&func.body, params_scope, &mut next_local);

        let locals_bytes = -next_local - 8;
        self.out[frame_adjust_idx].args[1] = Operand::IntConst(-locals_bytes);

        self.emit_epilogue();
    }

    fn emit_epilogue(&mut self) {
        self.emit(Opcode::I2i, vec![Operand::BaseRegister, Operand::StackRegister]);
        self.emit(Opcode::Pop, vec![Operand::BaseRegister]);
        self.emit(Opcode::Return, vec![]);
    }

    fn gen_block(&mut self, block: &Block, parent: ScopeId, next_local: &mut i64) {
        let scope = self.frame.new_scope(Some(parent));
        for decl in &block.var_decls {
            self.frame.declare(scope, decl.name.clone(), Storage::Local(*next_local));
            *next_local -= 8;
        }
        for stmt in &block.stmts {
            self.gen_stmt(stmt, scope, next_local);
        }
    }

    fn gen_stmt(&mut self, stmt: &Stmt, scope: ScopeId, next_local: &mut i64) {
        match stmt {
            Stmt::Assignment { target, value, .. } => {
                let value_operand = self.gen_expr(value, scope);
                self.gen_store(target, value_operand, scope);
            }
            Stmt::Call(call) => {
                self.gen_call(call, scope);
            }
            Stmt::Conditional {
                cond,
                then_block,
                else_block,
                ..
            } => self.gen_conditional(cond, then_block, else_block.as_ref(), scope, next_local),
            Stmt::While { cond, body, .. } => self.gen_while(cond, body, scope, next_local),
            Stmt::Return { value, .. } => {
                if let Some(expr) = value {
                    let v = self.gen_expr(expr, scope);
                    self.emit(Opcode::I2i, vec![v, Operand::ReturnRegister]);
                }
                self.emit_epilogue();
            }
            Stmt::Break { .. } => {
                let (_, break_label) = *self
                    .loop_stack
                    .last()
                    .expect("analyzer rejects break outside a loop");
                self.emit(Opcode::Jump, vec![Operand::Label(break_label)]);
            }
            Stmt::Continue { .. } => {
                let (continue_label, _) = *self
                    .loop_stack
                    .last()
                    .expect("analyzer rejects continue outside a loop");
                self.emit(Opcode::Jump, vec![Operand::Label(continue_label)]);
            }
        }
    }

    fn gen_conditional(
        &mut self,
        cond: &Expr,
        then_block: &Block,
        else_block: Option<&Block>,
        scope: ScopeId,
        next_local: &mut i64,
    ) {
        let then_label = self.new_label();
        let end_label = self.new_label();

        if let Some(else_block) = else_block {
            let else_label = self.new_label();
            let cond_operand = self.gen_expr(cond, scope);
            self.emit(
                Opcode::Cbr,
                vec![
                    cond_operand,
                    Operand::Label(then_label),
                    Operand::Label(else_label),
                ],
            );
            self.emit(Opcode::Label, vec![Operand::Label(then_label)]);
            self.gen_block(then_block, scope, next_local);
            self.emit(Opcode::Jump, vec![Operand::Label(end_label)]);
            self.emit(Opcode::Label, vec![Operand::Label(else_label)]);
            self.gen_block(else_block, scope, next_local);
            self.emit(Opcode::Label, vec![Operand::Label(end_label)]);
        } else {
            let cond_operand = self.gen_expr(cond, scope);
            self.emit(
                Opcode::Cbr,
                vec![
                    cond_operand,
                    Operand::Label(then_label),
                    Operand::Label(end_label),
                ],
            );
            self.emit(Opcode::Label, vec![Operand::Label(then_label)]);
            self.gen_block(then_block, scope, next_local);
            self.emit(Opcode::Label, vec![Operand::Label(end_label)]);
        }
    }

    fn gen_while(&mut self, cond: &Expr, body: &Block, scope: ScopeId, next_local: &mut i64) {
        let cond_label = self.new_label();
        let body_label = self.new_label();
        let end_label = self.new_label();

        self.emit(Opcode::Jump, vec![Operand::Label(cond_label)]);
        self.emit(Opcode::Label, vec![Operand::Label(cond_label)]);
        let cond_operand = self.gen_expr(cond, scope);
        self.emit(
            Opcode::Cbr,
            vec![
                cond_operand,
                Operand::Label(body_label),
                Operand::Label(end_label),
            ],
        );
        self.emit(Opcode::Label, vec![Operand::Label(body_label)]);

        self.loop_stack.push((cond_label, end_label));
        self.gen_block(body, scope, next_local);
        self.loop_stack.pop();

        self.emit(Opcode::Jump, vec![Operand::Label(cond_label)]);
        self.emit(Opcode::Label, vec![Operand::Label(end_label)]);
    }

    fn base_and_offset(&mut self, storage: Storage) -> (Operand, i64) {
        match storage {
            Storage::Global(off) => (self.global_base(), off),
            Storage::GlobalArray { offset, .. } => (self.global_base(), offset),
            Storage::Param(off) | Storage::Local(off) => (Operand::BaseRegister, off),
        }
    }

    fn array_elem_size(&self, storage: Storage) -> i64 {
        match storage {
            Storage::GlobalArray { elem_size, .. } => elem_size,
            _ => unreachable!("only arrays are indexed; the analyzer enforces this"),
        }
    }

    /// Computes `base, offset_reg` for an indexed array element: the
    /// array's own base offset plus `index * elem_size` (§4.6).
    fn array_offset_reg(&mut self, name: &str, index: &Expr, scope: ScopeId) -> (Operand, Operand) {
        let storage = self.frame.lookup(scope, name);
        let elem_size = self.array_elem_size(storage);
        let (base, array_offset) = self.base_and_offset(storage);
        let index_operand = self.gen_expr(index, scope);
        let scaled = self.new_vr();
        self.emit(
            Opcode::MultI,
            vec![index_operand, Operand::IntConst(elem_size), Operand::VirtualReg(scaled)],
        );
        let offset = self.new_vr();
        self.emit(
            Opcode::AddI,
            vec![
                Operand::VirtualReg(scaled),
                Operand::IntConst(array_offset),
                Operand::VirtualReg(offset),
            ],
        );
        (base, Operand::VirtualReg(offset))
    }

    fn gen_store(&mut self, target: &Location, value: Operand, scope: ScopeId) {
        match &target.index {
            None => {
                let storage = self.frame.lookup(scope, &target.name);
                let (base, offset) = self.base_and_offset(storage);
                self.emit(Opcode::StoreAi, vec![value, base, Operand::IntConst(offset)]);
            }
            Some(index) => {
                let (base, offset_reg) = self.array_offset_reg(&target.name, index, scope);
                self.emit(Opcode::StoreAo, vec![value, base, offset_reg]);
            }
        }
    }

    fn gen_location(&mut self, loc: &Location, scope: ScopeId) -> Operand {
        match &loc.index {
            None => {
                let storage = self.frame.lookup(scope, &loc.name);
                let (base, offset) = self.base_and_offset(storage);
                let dst = self.new_vr();
                self.emit(
                    Opcode::LoadAi,
                    vec![base, Operand::IntConst(offset), Operand::VirtualReg(dst)],
                );
                Operand::VirtualReg(dst)
            }
            Some(index) => {
                let (base, offset_reg) = self.array_offset_reg(&loc.name, index, scope);
                let dst = self.new_vr();
                self.emit(Opcode::LoadAo, vec![base, offset_reg, Operand::VirtualReg(dst)]);
                Operand::VirtualReg(dst)
            }
        }
    }

    fn gen_expr(&mut self, expr: &Expr, scope: ScopeId) -> Operand {
        match expr {
            Expr::IntLit { value, .. } => {
                let dst = self.new_vr();
                self.emit(Opcode::LoadI, vec![Operand::IntConst(*value), Operand::VirtualReg(dst)]);
                Operand::VirtualReg(dst)
            }
            Expr::BoolLit { value, .. } => {
                let dst = self.new_vr();
                self.emit(
                    Opcode::LoadI,
                    vec![Operand::IntConst(i64::from(*value)), Operand::VirtualReg(dst)],
                );
                Operand::VirtualReg(dst)
            }
            Expr::StringLit { .. } => {
                unreachable!("string literals are only ever call arguments to print_str")
            }
            Expr::Location(loc) => self.gen_location(loc, scope),
            Expr::Call(call) => self.gen_call(call, scope),
            Expr::Unary { op, operand, .. } => self.gen_unary(*op, operand, scope),
            Expr::Binary { op, left, right, .. } => self.gen_binary(*op, left, right, scope),
        }
    }

    fn gen_unary(&mut self, op: UnaryOp, operand: &Expr, scope: ScopeId) -> Operand {
        let v = self.gen_expr(operand, scope);
        let dst = self.new_vr();
        let opcode = match op {
            UnaryOp::Neg => Opcode::Neg,
            UnaryOp::Not => Opcode::Not,
        };
        self.emit(opcode, vec![v, Operand::VirtualReg(dst)]);
        Operand::VirtualReg(dst)
    }

    fn gen_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, scope: ScopeId) -> Operand {
        if op == BinaryOp::Mod {
            return self.gen_mod(left, right, scope);
        }
        let l = self.gen_expr(left, scope);
        let r = self.gen_expr(right, scope);
        let dst = self.new_vr();
        let opcode = match op {
            BinaryOp::Add => Opcode::Add,
            BinaryOp::Sub => Opcode::Sub,
            BinaryOp::Mul => Opcode::Mult,
            BinaryOp::Div => Opcode::Div,
            BinaryOp::And => Opcode::And,
            BinaryOp::Or => Opcode::Or,
            BinaryOp::Lt => Opcode::CmpLt,
            BinaryOp::Le => Opcode::CmpLe,
            BinaryOp::Gt => Opcode::CmpGt,
            BinaryOp::Ge => Opcode::CmpGe,
            BinaryOp::Eq => Opcode::CmpEq,
            BinaryOp::Ne => Opcode::CmpNe,
            BinaryOp::Mod => unreachable!("handled above"),
        };
        self.emit(opcode, vec![l, r, Operand::VirtualReg(dst)]);
        Operand::VirtualReg(dst)
    }

    /// `q = l/r; p = q*r; result = l-p`, with virtual registers allocated
    /// in the order result, quotient, product (§9 "Deterministic id
    /// generation" — a supplemented, exactly-specified lowering, not left
    /// to emission order).
    fn gen_mod(&mut self, left: &Expr, right: &Expr, scope: ScopeId) -> Operand {
        let l = self.gen_expr(left, scope);
        let r = self.gen_expr(right, scope);
        let result = self.new_vr();
        let q = self.new_vr();
        let p = self.new_vr();
        self.emit(Opcode::Div, vec![l.clone(), r.clone(), Operand::VirtualReg(q)]);
        self.emit(Opcode::Mult, vec![Operand::VirtualReg(q), r, Operand::VirtualReg(p)]);
        self.emit(Opcode::Sub, vec![l, Operand::VirtualReg(p), Operand::VirtualReg(result)]);
        Operand::VirtualReg(result)
    }

    fn gen_call(&mut self, call: &FuncCall, scope: ScopeId) -> Operand {
        if let Some(expected_argc) = builtin_arg_count(&call.name) {
            debug_assert_eq!(call.args.len(), expected_argc);
            if call.name == "print_str" {
                let Expr::StringLit { value, .. } = &call.args[0] else {
                    unreachable!("the analyzer requires print_str's argument to be a string literal")
                };
                self.emit(Opcode::Print, vec![Operand::StringConst(value.clone())]);
            } else {
                let v = self.gen_expr(&call.args[0], scope);
                self.emit(Opcode::Print, vec![v]);
            }
            return Operand::Empty;
        }

        let sig = self
            .sigs
            .get(&call.name)
            .expect("the analyzer resolved this call to a declared function")
            .clone();

        let arg_operands: Vec<Operand> = call.args.iter().map(|a| self.gen_expr(a, scope)).collect();
        for v in arg_operands.into_iter().rev() {
            self.emit(Opcode::Push, vec![v]);
        }
        self.emit(Opcode::Call, vec![Operand::CallLabel(call.name.clone())]);
        self.emit(
            Opcode::AddI,
            vec![
                Operand::StackRegister,
                Operand::IntConst(8 * call.args.len() as i64),
                Operand::StackRegister,
            ],
        );

        if sig.return_ty == Type::Void {
            Operand::Empty
        } else {
            let dst = self.new_vr();
            self.emit(Opcode::I2i, vec![Operand::ReturnRegister, Operand::VirtualReg(dst)]);
            Operand::VirtualReg(dst)
        }
    }
}
