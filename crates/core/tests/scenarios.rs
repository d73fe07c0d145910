// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use armulet_core::condition::Psr;
use armulet_core::{
    ArmEmulator, ContextKind, EmulationError, EmulationState, EmulatorOptions, InstrSize,
    InstructionEmulator, ProcessorMode, Register, Retired, WriteTarget,
};

fn emulator(state: EmulationState, arch: &str) -> ArmEmulator<EmulationState> {
    let mut emulator = ArmEmulator::with_options(
        state,
        EmulatorOptions {
            ignore_conditions: false,
            auto_advance_pc: true,
        },
    );
    assert!(emulator.set_architecture(arch));
    emulator
}

fn run_thumb(
    emulator: &mut ArmEmulator<EmulationState>,
    opcode: u32,
    size: InstrSize,
) -> Result<Retired, EmulationError> {
    let address = emulator.access().pc();
    emulator.set_instruction(opcode, size, ProcessorMode::Thumb, address);
    emulator.evaluate_instruction()
}

#[test]
fn test_thumb_push_pop_round_trip() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_thumb(true);
    state.set_pc(0x400);
    state.set_sp(0x2000);
    state.set_core(0, 0xa0);
    state.set_core(1, 0xa1);
    state.set_core(14, 0x501);
    let mut emu = emulator(state, "armv7");

    // push {r0, r1, lr}
    run_thumb(&mut emu, 0xb503, InstrSize::Size16)?;
    assert_eq!(emu.access().sp(), 0x2000 - 12);

    let s = emu.access_mut();
    s.set_core(0, 0);
    s.set_core(1, 0);
    s.set_core(14, 0);
    // pop.w {r0, r1, lr}
    run_thumb(&mut emu, 0xe8bd_4003, InstrSize::Size32)?;

    let s = emu.access();
    assert_eq!((s.core(0), s.core(1), s.core(14)), (0xa0, 0xa1, 0x501));
    assert_eq!(s.sp(), 0x2000);
    Ok(())
}

#[test]
fn test_pop_pc_interworks_from_v5t() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_pc(0x400);
    state.set_sp(0x2000);
    state.load(0x2000, &0x801u32.to_le_bytes());
    let mut emu = emulator(state, "armv5te");

    // ldm sp!, {pc}
    emu.set_instruction(0xe8bd_8000, InstrSize::Size32, ProcessorMode::Arm, 0x400);
    emu.evaluate_instruction()?;
    let s = emu.access();
    assert!(s.is_thumb());
    assert_eq!(s.pc(), 0x800);
    assert_eq!(s.sp(), 0x2004);
    Ok(())
}

#[test]
fn test_pop_pc_stays_arm_on_v4t() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_pc(0x400);
    state.set_sp(0x2000);
    state.load(0x2000, &0x801u32.to_le_bytes());
    let mut emu = emulator(state, "armv4t");

    emu.set_instruction(0xe8bd_8000, InstrSize::Size32, ProcessorMode::Arm, 0x400);
    emu.evaluate_instruction()?;
    assert!(!emu.access().is_thumb());
    assert_eq!(emu.access().pc(), 0x800);
    Ok(())
}

#[test]
fn test_vpush_doubles() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_thumb(true);
    state.set_pc(0x400);
    state.set_sp(0x2000);
    state.set_double(8, 0x1111_2222_3333_4444);
    state.set_double(9, 0x5555_6666_7777_8888);
    let mut emu = emulator(state, "armv7");

    // vpush {d8, d9}
    run_thumb(&mut emu, 0xed2d_8b04, InstrSize::Size32)?;
    let s = emu.access();
    assert_eq!(s.sp(), 0x2000 - 16);
    assert_eq!(s.peek(0x2000 - 16, 8), Some(0x1111_2222_3333_4444));
    assert_eq!(s.peek(0x2000 - 8, 8), Some(0x5555_6666_7777_8888));

    let stored: Vec<_> = s
        .writes()
        .iter()
        .filter(|w| w.context.kind == ContextKind::PushRegisterOnStack)
        .map(|w| w.target)
        .collect();
    assert_eq!(
        stored,
        vec![
            WriteTarget::Memory {
                address: 0x2000 - 16,
                size: 8
            },
            WriteTarget::Memory {
                address: 0x2000 - 8,
                size: 8
            },
        ]
    );
    Ok(())
}

#[test]
fn test_cbz_and_cbnz() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_thumb(true);
    state.set_pc(0x400);
    let mut emu = emulator(state, "armv7");

    // cbz r0, +8: taken when r0 == 0
    run_thumb(&mut emu, 0xb120, InstrSize::Size16)?;
    assert_eq!(emu.access().pc(), 0x400 + 4 + 8);

    emu.access_mut().set_pc(0x400);
    emu.access_mut().set_core(0, 1);
    run_thumb(&mut emu, 0xb120, InstrSize::Size16)?;
    assert_eq!(emu.access().pc(), 0x402);
    Ok(())
}

#[test]
fn test_tbb_reads_table_entry() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_thumb(true);
    state.set_pc(0x400);
    state.set_core(0, 0x600);
    state.set_core(1, 2);
    state.load(0x600, &[1, 2, 5, 7]);
    let mut emu = emulator(state, "armv7");

    // tbb [r0, r1]
    run_thumb(&mut emu, 0xe8d0_f001, InstrSize::Size32)?;
    assert_eq!(emu.access().pc(), 0x404 + 2 * 5);
    Ok(())
}

#[test]
fn test_blx_immediate_switches_to_arm() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_thumb(true);
    state.set_pc(0x402);
    let mut emu = emulator(state, "armv7");

    // blx +8 from a halfword-aligned address targets Align(PC, 4) + 8
    run_thumb(&mut emu, 0xf000_e804, InstrSize::Size32)?;
    let s = emu.access();
    assert!(!s.is_thumb());
    assert_eq!(s.pc(), 0x404 + 8);
    assert_eq!(s.core(14), 0x407);
    Ok(())
}

#[test]
fn test_sub_sp_reports_stack_adjustment() -> anyhow::Result<()> {
    let mut state = EmulationState::new();
    state.set_pc(0x400);
    state.set_sp(0x2000);
    let mut emu = emulator(state, "armv7");

    // sub sp, sp, #16
    emu.set_instruction(0xe24d_d010, InstrSize::Size32, ProcessorMode::Arm, 0x400);
    emu.evaluate_instruction()?;
    let first = emu.access().writes()[0];
    assert_eq!(first.context.kind, ContextKind::AdjustStackPointer);
    assert_eq!(first.target, WriteTarget::Register { reg: Register::SP });
    assert_eq!(emu.access().sp(), 0x2000 - 16);
    Ok(())
}

#[test]
fn test_access_failure_is_reported() {
    let mut state = EmulationState::new();
    state.set_pc(0x400);
    state.set_core(1, 0x9000);
    let mut emu = emulator(state, "armv7");

    // ldr r0, [r1]
    emu.set_instruction(0xe591_0000, InstrSize::Size32, ProcessorMode::Arm, 0x400);
    let err = emu.evaluate_instruction().unwrap_err();
    assert!(matches!(err, EmulationError::Access(_)));
    assert!(emu.access().writes().is_empty());
}

fn run_arm(emulator: &mut ArmEmulator<EmulationState>, opcode: u32) -> Result<Retired, EmulationError> {
    let address = emulator.access().pc();
    emulator.set_instruction(opcode, InstrSize::Size32, ProcessorMode::Arm, address);
    emulator.evaluate_instruction()
}

fn arm_state() -> EmulationState {
    let mut state = EmulationState::new();
    state.set_pc(0x8000);
    state.set_sp(0x2000);
    state
}

#[test]
fn test_carry_in_arithmetic() -> anyhow::Result<()> {
    let mut state = arm_state();
    state.set_cpsr(Psr::C.bits());
    state.set_core(1, 0xffff_ffff);
    state.set_core(2, 0);
    let mut emu = emulator(state, "armv7");

    // adcs r0, r1, r2
    run_arm(&mut emu, 0xe0b1_0002)?;
    let s = emu.access();
    assert_eq!(s.core(0), 0);
    assert_eq!(s.cpsr(), (Psr::Z | Psr::C).bits());

    // sbc r0, r1, r2 with carry clear: 5 - 1 - 1
    let s = emu.access_mut();
    s.set_cpsr(0);
    s.set_core(1, 5);
    s.set_core(2, 1);
    run_arm(&mut emu, 0xe0c1_0002)?;
    assert_eq!(emu.access().core(0), 3);

    // rsc r0, r1, #5 with carry set: 5 - 1
    emu.access_mut().set_cpsr(Psr::C.bits());
    run_arm(&mut emu, 0xe2e1_0005)?;
    assert_eq!(emu.access().core(0), 4);
    Ok(())
}

#[test]
fn test_register_shift_uses_low_byte() -> anyhow::Result<()> {
    let mut state = arm_state();
    state.set_core(1, 1);
    state.set_core(2, 0x121);
    let mut emu = emulator(state, "armv7");

    // lsl r0, r1, r2: the amount is 0x21
    run_arm(&mut emu, 0xe1a0_0211)?;
    assert_eq!(emu.access().core(0), 0);

    emu.access_mut().set_core(2, 0x104);
    run_arm(&mut emu, 0xe1a0_0211)?;
    assert_eq!(emu.access().core(0), 0x10);
    Ok(())
}

#[test]
fn test_block_transfer_modes() -> anyhow::Result<()> {
    let mut state = arm_state();
    for (i, word) in [0x1ffcu32, 0x2000, 0x2004, 0x2008].iter().enumerate() {
        state.load(u64::from(0x1ffc + 4 * i as u32), &word.to_le_bytes());
    }
    state.set_core(0, 0x2000);
    let mut emu = emulator(state, "armv7");

    // ldmib r0, {r1, r2}
    run_arm(&mut emu, 0xe990_0006)?;
    assert_eq!((emu.access().core(1), emu.access().core(2)), (0x2004, 0x2008));
    assert_eq!(emu.access().core(0), 0x2000);

    // ldmda r0, {r1, r2}
    run_arm(&mut emu, 0xe810_0006)?;
    assert_eq!((emu.access().core(1), emu.access().core(2)), (0x1ffc, 0x2000));

    // stmib r0!, {r1, r2}
    let s = emu.access_mut();
    s.set_core(0, 0x3000);
    s.set_core(1, 0xaa);
    s.set_core(2, 0xbb);
    s.take_writes();
    run_arm(&mut emu, 0xe9a0_0006)?;
    let s = emu.access();
    assert_eq!(s.peek(0x3004, 4), Some(0xaa));
    assert_eq!(s.peek(0x3008, 4), Some(0xbb));
    assert_eq!(s.core(0), 0x3008);
    assert_eq!(s.writes()[2].context.kind, ContextKind::AdjustBaseRegister);
    Ok(())
}

#[test]
fn test_arm_svc_sets_return_address() -> anyhow::Result<()> {
    let mut emu = emulator(arm_state(), "armv7");
    // svc #0x10
    run_arm(&mut emu, 0xef00_0010)?;
    let s = emu.access();
    assert_eq!(s.core(14), 0x8004);
    assert_eq!(s.writes()[0].context.kind, ContextKind::SupervisorCall);
    assert_eq!(s.pc(), 0x8004);
    Ok(())
}
