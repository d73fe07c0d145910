// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Unwind plans synthesized by emulating a function prologue.
//!
//! The prologue runs on an [`EmulationState`] whose stack pointer starts at
//! a synthetic value. The canonical frame address (CFA) is that entry SP, so
//! every rule is derived from the tagged writes the instructions perform:
//! stack adjustments move an SP-based CFA, a frame-pointer set switches the
//! CFA register, and stores onto the stack record where registers were saved.

use crate::context::{ContextInfo, ContextKind, ProcessorMode, Register};
use crate::emulator::{ArmEmulator, EmulatorOptions, Instruction};
use crate::state::{EmulationState, WriteRecord, WriteTarget};
use crate::{EmuResult, EmulationError, InstructionEmulator};
use armulet_config::EmulatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnwindOptions {
    pub max_instructions: usize,
    pub initial_sp: u32,
    pub arch: String,
}

impl Default for UnwindOptions {
    fn default() -> Self {
        Self {
            max_instructions: 64,
            initial_sp: 0x7fff_0000,
            arch: "armv7".to_string(),
        }
    }
}

impl From<&EmulatorConfig> for UnwindOptions {
    fn from(config: &EmulatorConfig) -> Self {
        Self {
            max_instructions: config.unwind.max_instructions,
            initial_sp: config.unwind.initial_sp,
            arch: config.arch.clone(),
        }
    }
}

/// `CFA = register + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfaRule {
    pub register: Register,
    pub offset: i64,
}

/// A register saved at `CFA + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRegister {
    pub register: Register,
    pub offset: i64,
}

/// The rules in effect from `offset` bytes into the function onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwindRow {
    pub offset: u32,
    pub cfa: CfaRule,
    pub saved: Vec<SavedRegister>,
}

impl UnwindRow {
    pub fn saved_offset(&self, register: Register) -> Option<i64> {
        self.saved
            .iter()
            .find(|saved| saved.register == register)
            .map(|saved| saved.offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwindPlan {
    pub rows: Vec<UnwindRow>,
}

impl UnwindPlan {
    /// The row covering `offset` bytes into the function.
    pub fn row_at(&self, offset: u32) -> Option<&UnwindRow> {
        self.rows.iter().rev().find(|row| row.offset <= offset)
    }
}

/// Rules accumulated while walking the prologue.
struct Tracker {
    cfa_address: u32,
    cfa: CfaRule,
    saved: BTreeMap<Register, i64>,
}

impl Tracker {
    fn new(initial_sp: u32) -> Self {
        Self {
            cfa_address: initial_sp,
            cfa: CfaRule {
                register: Register::SP,
                offset: 0,
            },
            saved: BTreeMap::new(),
        }
    }

    fn offset_from(&self, value: u64) -> i64 {
        i64::from(self.cfa_address) - (value as u32) as i64
    }

    /// Applies one write. Returns whether the PC moved non-sequentially.
    fn apply(&mut self, record: &WriteRecord) -> bool {
        match (record.context.kind, record.target) {
            (ContextKind::AdjustStackPointer, WriteTarget::Register { reg }) if reg == Register::SP => {
                if self.cfa.register == Register::SP {
                    self.cfa.offset = self.offset_from(record.value);
                }
            }
            (ContextKind::SetFramePointer, WriteTarget::Register { reg }) => {
                self.cfa = CfaRule {
                    register: reg,
                    offset: self.offset_from(record.value),
                };
            }
            (ContextKind::PushRegisterOnStack, WriteTarget::Memory { address, .. }) => {
                if let ContextInfo::RegisterToRegisterPlusOffset { data_reg, .. } = record.context.info {
                    let offset = address as i64 - i64::from(self.cfa_address);
                    self.saved.entry(data_reg).or_insert(offset);
                }
            }
            (ContextKind::AdvancePc, WriteTarget::Register { .. }) => {}
            (_, WriteTarget::Register { reg }) if reg == Register::PC => return true,
            _ => {}
        }
        false
    }

    fn row(&self, offset: u32) -> UnwindRow {
        UnwindRow {
            offset,
            cfa: self.cfa,
            saved: self
                .saved
                .iter()
                .map(|(register, offset)| SavedRegister {
                    register: *register,
                    offset: *offset,
                })
                .collect(),
        }
    }
}

/// Evaluates the fetched instruction and returns its writes. An instruction
/// the emulator rejects leaves the state as it was before it, except for a
/// PC moved past it, and yields `None`.
fn evaluate_or_skip(
    emulator: &mut ArmEmulator<EmulationState>,
    inst: &Instruction,
) -> EmuResult<Option<Vec<WriteRecord>>> {
    let checkpoint = emulator.access().clone();
    match emulator.evaluate_instruction() {
        Ok(_) => Ok(Some(emulator.access_mut().take_writes())),
        Err(err @ (EmulationError::UnsupportedEncoding { .. } | EmulationError::Unpredictable(_))) => {
            tracing::debug!("Skipping {:#010x} at {:#x}: {}", inst.opcode, inst.address, err);
            let state = emulator.access_mut();
            *state = checkpoint;
            state.take_writes();
            state.set_pc(inst.address.wrapping_add(inst.size.bytes()));
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Emulates `code`, loaded at `start`, and returns the unwind rows of its
/// prologue. Conditions are ignored since flag values at entry are unknown.
pub fn analyze_prologue(
    code: &[u8],
    start: u32,
    mode: ProcessorMode,
    options: &UnwindOptions,
) -> EmuResult<UnwindPlan> {
    let mut state = EmulationState::zero_filled();
    state.load(u64::from(start), code);
    state.set_pc(start);
    state.set_sp(options.initial_sp);
    state.set_thumb(mode == ProcessorMode::Thumb);

    let mut emulator = ArmEmulator::with_options(
        state,
        EmulatorOptions {
            ignore_conditions: true,
            auto_advance_pc: true,
        },
    );
    emulator.try_set_architecture(&options.arch)?;

    let end = u64::from(start) + code.len() as u64;
    let mut tracker = Tracker::new(options.initial_sp);
    let mut plan = UnwindPlan {
        rows: vec![tracker.row(0)],
    };

    for _ in 0..options.max_instructions {
        let pc = emulator.access().pc();
        if u64::from(pc) >= end {
            break;
        }
        let inst = emulator.read_instruction()?;
        let next = inst.address.wrapping_add(inst.size.bytes());
        let Some(writes) = evaluate_or_skip(&mut emulator, &inst)? else {
            continue;
        };

        let before = (tracker.cfa, tracker.saved.clone());
        let mut branched = false;
        for record in &writes {
            branched |= tracker.apply(record);
        }
        if (tracker.cfa, &tracker.saved) != (before.0, &before.1) {
            plan.rows.push(tracker.row(next.wrapping_sub(start)));
        }
        if branched {
            tracing::trace!("Prologue analysis stops at branch at {:#x}", inst.address);
            break;
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::InstrSize;

    fn thumb(halfwords: &[u16]) -> Vec<u8> {
        halfwords.iter().flat_map(|h| h.to_le_bytes()).collect()
    }

    #[test]
    fn test_thumb_push_and_frame_pointer() {
        // push {r7, lr}; add r7, sp, #0; sub sp, #8; bx lr
        let code = thumb(&[0xb580, 0xaf00, 0xb082, 0x4770]);
        let plan = analyze_prologue(&code, 0x1000, ProcessorMode::Thumb, &UnwindOptions::default()).unwrap();

        assert_eq!(plan.rows[0].cfa.offset, 0);
        let after_push = plan.row_at(2).unwrap();
        assert_eq!(after_push.cfa, CfaRule { register: Register::SP, offset: 8 });
        assert_eq!(after_push.saved_offset(Register::core(7)), Some(-8));
        assert_eq!(after_push.saved_offset(Register::RA), Some(-4));

        let after_fp = plan.row_at(4).unwrap();
        assert_eq!(after_fp.cfa, CfaRule { register: Register::core(7), offset: 8 });
        // sub sp after the frame pointer is set leaves the rule alone
        assert_eq!(plan.rows.len(), 3);
    }

    #[test]
    fn test_arm_stmdb_prologue() {
        // push {r4, r11, lr}; add r11, sp, #4
        let code: Vec<u8> = [0xe92d_4810u32, 0xe28d_b004]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        let plan = analyze_prologue(&code, 0x2000, ProcessorMode::Arm, &UnwindOptions::default()).unwrap();

        let row = plan.row_at(4).unwrap();
        assert_eq!(row.cfa.offset, 12);
        assert_eq!(row.saved_offset(Register::core(4)), Some(-12));
        assert_eq!(row.saved_offset(Register::core(11)), Some(-8));
        assert_eq!(row.saved_offset(Register::RA), Some(-4));

        let row = plan.row_at(8).unwrap();
        assert_eq!(row.cfa, CfaRule { register: Register::core(11), offset: 8 });
    }

    #[test]
    fn test_budget_limits_analysis() {
        let code = thumb(&[0xb580, 0xb082]);
        let options = UnwindOptions {
            max_instructions: 1,
            ..UnwindOptions::default()
        };
        let plan = analyze_prologue(&code, 0, ProcessorMode::Thumb, &options).unwrap();
        assert_eq!(plan.rows.len(), 2);
    }

    #[test]
    fn test_rejected_instruction_leaves_state_untouched() {
        let mut state = EmulationState::new();
        state.set_thumb(true);
        state.set_pc(0x100);
        state.set_core(0, 0x202);
        state.set_core(14, 0x77);
        let mut emulator = ArmEmulator::new(state);
        // blx r0 with a halfword-aligned ARM target
        emulator.set_instruction(0x4780, InstrSize::Size16, ProcessorMode::Thumb, 0x100);
        let inst = emulator.instruction().unwrap();

        assert_eq!(evaluate_or_skip(&mut emulator, &inst).unwrap(), None);
        let state = emulator.access();
        assert_eq!(state.core(14), 0x77);
        assert_eq!(state.pc(), 0x102);
        assert!(state.writes().is_empty());
    }

    #[test]
    fn test_skipped_instruction_keeps_analysis_going() {
        // movs r0, #2; blx r0; push {r7, lr}
        let code = thumb(&[0x2002, 0x4780, 0xb580]);
        let plan = analyze_prologue(&code, 0, ProcessorMode::Thumb, &UnwindOptions::default()).unwrap();
        let row = plan.rows.last().unwrap();
        assert_eq!(row.offset, 6);
        assert_eq!(row.cfa.offset, 8);
    }

    #[test]
    fn test_unknown_arch_is_an_error() {
        let options = UnwindOptions {
            arch: "mips".to_string(),
            ..UnwindOptions::default()
        };
        let result = analyze_prologue(&[0x80, 0xb5], 0, ProcessorMode::Thumb, &options);
        assert!(matches!(result, Err(EmulationError::InvalidArchitecture(_))));
    }
}
