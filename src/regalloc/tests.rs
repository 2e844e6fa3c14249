use super::*;
use crate::ir::{Instruction, Opcode, Operand};

fn vr(id: u32) -> Operand {
    Operand::VirtualReg(id)
}

fn pr(id: u32) -> Operand {
    Operand::PhysicalReg(id)
}

/// A minimal one-function program: the prologue shape `allocate_function`
/// looks for, plus whatever body instructions the caller supplies.
fn wrap(name: &str, mut body: Vec<Instruction>) -> Vec<Instruction> {
    let mut program = vec![
        Instruction::new(Opcode::Label, vec![Operand::CallLabel(name.to_string())]),
        Instruction::new(Opcode::Push, vec![Operand::BaseRegister]),
        Instruction::new(Opcode::I2i, vec![Operand::StackRegister, Operand::BaseRegister]),
        Instruction::new(
            Opcode::AddI,
            vec![Operand::StackRegister, Operand::IntConst(0), Operand::StackRegister],
        ),
    ];
    program.append(&mut body);
    program.push(Instruction::new(Opcode::I2i, vec![Operand::BaseRegister, Operand::StackRegister]));
    program.push(Instruction::new(Opcode::Pop, vec![Operand::BaseRegister]));
    program.push(Instruction::new(Opcode::Return, vec![]));
    program
}

fn has_any_virtual_register(program: &[Instruction]) -> bool {
    program.iter().any(|insn| {
        insn.args.iter().any(|a| matches!(a, Operand::VirtualReg(_)))
    })
}

#[test]
fn every_virtual_register_is_rewritten_to_a_physical_one() {
    let program = wrap(
        "f",
        vec![
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(1), vr(0)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(2), vr(1)]),
            Instruction::new(Opcode::Add, vec![vr(0), vr(1), vr(2)]),
        ],
    );
    let out = allocate(&program, 3);
    assert!(!has_any_virtual_register(&out));
}

#[test]
fn three_simultaneous_operands_fit_exactly_in_the_minimum_budget() {
    // storeAO reads three registers at once; k=3 must not panic.
    let program = wrap(
        "f",
        vec![
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(1), vr(0)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(2), vr(1)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(3), vr(2)]),
            Instruction::new(Opcode::StoreAo, vec![vr(0), vr(1), vr(2)]),
        ],
    );
    let out = allocate(&program, MIN_REGISTERS);
    assert!(!has_any_virtual_register(&out));
}

#[test]
#[should_panic(expected = "at least 3")]
fn a_budget_below_the_minimum_is_rejected() {
    let program = wrap("f", vec![]);
    allocate(&program, 2);
}

#[test]
fn spilling_reloads_the_value_and_grows_the_frame_adjust() {
    // Four live values with only 3 registers forces exactly one spill.
    let program = wrap(
        "f",
        vec![
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(1), vr(0)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(2), vr(1)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(3), vr(2)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(4), vr(3)]),
            // Use every one of the four values so none is dead-on-arrival.
            Instruction::new(Opcode::Add, vec![vr(0), vr(1), vr(0)]),
            Instruction::new(Opcode::Add, vec![vr(2), vr(3), vr(2)]),
            Instruction::new(Opcode::Add, vec![vr(0), vr(2), vr(0)]),
        ],
    );
    let out = allocate(&program, 3);
    assert!(!has_any_virtual_register(&out));
    assert!(
        out.iter().any(|i| i.op == Opcode::StoreAi),
        "expected at least one spill store"
    );
    assert!(
        out.iter().any(|i| i.op == Opcode::LoadAi),
        "expected at least one spill reload"
    );

    let frame_adjust = out
        .iter()
        .find(|i| i.op == Opcode::AddI && i.args[0] == Operand::StackRegister && i.args[2] == Operand::StackRegister)
        .unwrap();
    let Operand::IntConst(adjust) = frame_adjust.args[1] else {
        panic!("expected a constant frame adjustment")
    };
    assert!(adjust < 0, "frame must grow downward to hold a spill slot");
}

#[test]
fn frame_adjust_reflects_preexisting_local_variable_space() {
    let mut program = wrap("f", vec![Instruction::new(Opcode::LoadI, vec![Operand::IntConst(1), vr(0)])]);
    // Simulate codegen having already reserved 8 bytes for one local.
    program[3].args[1] = Operand::IntConst(-8);
    let out = allocate(&program, 3);
    let Operand::IntConst(adjust) = out[3].args[1] else {
        panic!("expected a constant frame adjustment")
    };
    // No spills needed here, so the locals-only size is preserved exactly.
    assert_eq!(adjust, -8);
}

#[test]
fn call_forces_every_live_register_to_spill_first() {
    let program = wrap(
        "f",
        vec![
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(1), vr(0)]),
            Instruction::new(Opcode::Call, vec![Operand::CallLabel("g".to_string())]),
            // vr(0) is read again after the call, so it must have survived
            // across it via a spill/reload rather than being clobbered.
            Instruction::new(Opcode::Add, vec![vr(0), vr(0), vr(0)]),
        ],
    );
    let out = allocate(&program, 3);
    let call_idx = out.iter().position(|i| i.op == Opcode::Call).unwrap();
    assert_eq!(out[call_idx - 1].op, Opcode::StoreAi, "value must be spilled before the call");
    assert!(out[call_idx + 1..].iter().any(|i| i.op == Opcode::LoadAi));
}

#[test]
fn furthest_next_use_is_evicted_over_an_immediately_needed_value() {
    // vr(0) is used immediately next; vr(1) is used much later; vr(2) is
    // never used again. With only 2 free slots after loading vr(0)/vr(1)
    // and needing a third register for vr(2), vr(1) (furthest next use)
    // should be the one spilled, not vr(0).
    let program = wrap(
        "f",
        vec![
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(1), vr(0)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(2), vr(1)]),
            Instruction::new(Opcode::LoadI, vec![Operand::IntConst(3), vr(2)]),
            Instruction::new(Opcode::Neg, vec![vr(2), vr(2)]),
            Instruction::new(Opcode::Add, vec![vr(0), vr(0), vr(0)]),
            Instruction::new(Opcode::Add, vec![vr(1), vr(1), vr(1)]),
        ],
    );
    let out = allocate(&program, 3);
    let neg_idx = out.iter().position(|i| i.op == Opcode::Neg).unwrap();
    // vr(1) must have been spilled by this point (it is not used again
    // until the very last instruction), freeing a register for vr(2).
    assert!(out[..neg_idx].iter().any(|i| i.op == Opcode::StoreAi));
}

#[test]
fn two_functions_get_independent_register_files_and_spill_slots() {
    let mut program = wrap(
        "f",
        vec![Instruction::new(Opcode::LoadI, vec![Operand::IntConst(1), vr(0)])],
    );
    program.append(&mut wrap(
        "g",
        vec![Instruction::new(Opcode::LoadI, vec![Operand::IntConst(2), vr(0)])],
    ));
    let out = allocate(&program, 3);
    // Both functions' single loadI should land in the same first physical
    // register: per-function state does not leak across the boundary.
    let loads: Vec<_> = out.iter().filter(|i| i.op == Opcode::LoadI).collect();
    assert_eq!(loads.len(), 2);
    assert_eq!(loads[0].args[1], loads[1].args[1]);
}
