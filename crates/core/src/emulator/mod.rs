// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The ARM instruction emulator: fetch, decode, condition check, execute.
//!
//! Handlers live in the submodules, one per instruction family, as
//! `impl` blocks on [`ArmEmulator`]. They share the register, memory and
//! PC-write helpers defined here.

mod branch;
mod data_processing;
mod load_store;
mod load_store_multiple;
mod misc;
mod shift;
mod stack;

use crate::access::EmulatorAccess;
use crate::arch::ArmVariants;
use crate::bits::bit_is_set;
use crate::condition::{condition_passed, thumb_condition, ItSession, Psr};
use crate::context::{Context, ContextInfo, ContextKind, ProcessorMode, Register, PC_REG, SP_REG};
use crate::decoder::{self, InstrSize, Op, OpcodeDescriptor};
use crate::{EmuResult, EmulationError, InstructionEmulator};
use armulet_config::EmulatorConfig;
use serde::Serialize;

/// Value written where the architecture leaves a result UNKNOWN.
pub const UNKNOWN_VALUE: u32 = 0xdead_beef;

/// The frame register of each instruction set.
const THUMB_FRAME_REG: u32 = 7;
const ARM_FRAME_REG: u32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub opcode: u32,
    pub size: InstrSize,
    pub mode: ProcessorMode,
    pub address: u32,
}

/// How an evaluated instruction retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Retired {
    Executed,
    /// The condition failed and the instruction had no effect.
    ConditionFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmulatorOptions {
    /// Treat every condition as passed.
    pub ignore_conditions: bool,
    /// Write `PC = address + size` after an instruction that left PC alone.
    pub auto_advance_pc: bool,
}

impl From<&EmulatorConfig> for EmulatorOptions {
    fn from(config: &EmulatorConfig) -> Self {
        EmulatorOptions {
            ignore_conditions: config.ignore_conditions,
            auto_advance_pc: config.auto_advance_pc,
        }
    }
}

/// Emulator for the ARM and Thumb instruction sets.
///
/// One instance serves one thread of execution: it holds the architecture
/// version, the fetched instruction and the IT-block state between calls.
pub struct ArmEmulator<A: EmulatorAccess> {
    access: A,
    arch: ArmVariants,
    options: EmulatorOptions,
    inst: Option<Instruction>,
    /// CPSR as read before the current instruction. Handlers compute new
    /// flag values from it and never modify it.
    opcode_cpsr: u32,
    it_session: ItSession,
}

impl<A: EmulatorAccess> ArmEmulator<A> {
    pub fn new(access: A) -> Self {
        Self {
            access,
            arch: ArmVariants::empty(),
            options: EmulatorOptions::default(),
            inst: None,
            opcode_cpsr: 0,
            it_session: ItSession::default(),
        }
    }

    pub fn with_options(access: A, options: EmulatorOptions) -> Self {
        Self {
            options,
            ..Self::new(access)
        }
    }

    /// Builds an emulator from a session configuration. An unknown
    /// architecture name is logged and leaves the version at 0.
    pub fn from_config(access: A, config: &EmulatorConfig) -> Self {
        let mut emulator = Self::with_options(access, EmulatorOptions::from(config));
        emulator.set_architecture(&config.arch);
        emulator
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut A {
        &mut self.access
    }

    pub fn into_inner(self) -> A {
        self.access
    }

    pub fn arch(&self) -> ArmVariants {
        self.arch
    }

    pub fn options(&self) -> EmulatorOptions {
        self.options
    }

    pub fn set_options(&mut self, options: EmulatorOptions) {
        self.options = options;
    }

    pub fn instruction(&self) -> Option<Instruction> {
        self.inst
    }

    pub fn it_session(&self) -> &ItSession {
        &self.it_session
    }

    pub fn try_set_architecture(&mut self, name: &str) -> EmuResult<ArmVariants> {
        match ArmVariants::from_arch_name(name) {
            Some(version) => {
                self.arch = version;
                Ok(version)
            }
            None => {
                self.arch = ArmVariants::empty();
                Err(EmulationError::InvalidArchitecture(name.to_string()))
            }
        }
    }

    /// Supplies an already fetched instruction in place of
    /// [`InstructionEmulator::read_instruction`]. A 32-bit Thumb opcode is
    /// `first_halfword << 16 | second_halfword`.
    pub fn set_instruction(
        &mut self,
        opcode: u32,
        size: InstrSize,
        mode: ProcessorMode,
        address: u32,
    ) {
        self.inst = Some(Instruction {
            opcode,
            size,
            mode,
            address,
        });
    }

    // ---- instruction state ----

    fn current(&self) -> EmuResult<Instruction> {
        self.inst.ok_or(EmulationError::NoInstruction)
    }

    pub(crate) fn mode(&self) -> ProcessorMode {
        self.inst.map(|inst| inst.mode).unwrap_or_default()
    }

    pub(crate) fn is_thumb(&self) -> bool {
        self.mode() == ProcessorMode::Thumb
    }

    /// `ArchVersion() >= version` over the single-version flags.
    pub(crate) fn arch_at_least(&self, version: ArmVariants) -> bool {
        self.arch.bits() >= version.bits()
    }

    pub(crate) fn unaligned_support(&self) -> bool {
        self.arch_at_least(ArmVariants::ARMV7)
    }

    pub(crate) fn in_it_block(&self) -> bool {
        self.is_thumb() && self.it_session.in_it_block()
    }

    pub(crate) fn last_in_it_block(&self) -> bool {
        self.is_thumb() && self.it_session.last_in_it_block()
    }

    /// Branches and PC writes are only allowed outside an IT block or as
    /// its last instruction.
    pub(crate) fn check_it_tail(&self) -> EmuResult<()> {
        if self.in_it_block() && !self.last_in_it_block() {
            return Err(EmulationError::Unpredictable(
                "branch inside an IT block but not last",
            ));
        }
        Ok(())
    }

    pub(crate) fn frame_register(&self) -> u32 {
        if self.is_thumb() {
            THUMB_FRAME_REG
        } else {
            ARM_FRAME_REG
        }
    }

    pub(crate) fn carry_flag(&self) -> bool {
        Psr::from_bits_retain(self.opcode_cpsr).carry()
    }

    // ---- register and memory access ----

    pub(crate) fn read_register(&mut self, reg: Register) -> EmuResult<u64> {
        Ok(self.access.read_register(reg)?)
    }

    /// Reads core register `n`. PC reads return the fetch address plus 8 in
    /// ARM state and plus 4 in Thumb state.
    pub(crate) fn read_core_reg(&mut self, n: u32) -> EmuResult<u32> {
        let value = self.read_register(Register::core(n))? as u32;
        if n == PC_REG {
            let bias = if self.is_thumb() { 4 } else { 8 };
            Ok(value.wrapping_add(bias))
        } else {
            Ok(value)
        }
    }

    pub(crate) fn write_register(
        &mut self,
        context: &Context,
        reg: Register,
        value: u64,
    ) -> EmuResult<()> {
        Ok(self.access.write_register(context, reg, value)?)
    }

    pub(crate) fn write_core_reg(&mut self, context: &Context, n: u32, value: u32) -> EmuResult<()> {
        self.write_register(context, Register::core(n), u64::from(value))
    }

    pub(crate) fn read_memory(
        &mut self,
        context: &Context,
        address: u32,
        size: u32,
    ) -> EmuResult<u64> {
        Ok(self
            .access
            .read_memory(context, u64::from(address), size as usize)?)
    }

    pub(crate) fn read_word(&mut self, context: &Context, address: u32) -> EmuResult<u32> {
        Ok(self.read_memory(context, address, 4)? as u32)
    }

    pub(crate) fn write_memory(
        &mut self,
        context: &Context,
        address: u32,
        size: u32,
        value: u64,
    ) -> EmuResult<()> {
        Ok(self
            .access
            .write_memory(context, u64::from(address), size as usize, value)?)
    }

    pub(crate) fn write_word(&mut self, context: &Context, address: u32, value: u32) -> EmuResult<()> {
        self.write_memory(context, address, 4, u64::from(value))
    }

    pub(crate) fn write_unknown_register(&mut self, n: u32) -> EmuResult<()> {
        let context = Context::no_args(ContextKind::WriteRegisterRandomBits);
        self.write_core_reg(&context, n, UNKNOWN_VALUE)
    }

    pub(crate) fn write_unknown_memory(&mut self, address: u32) -> EmuResult<()> {
        let context = Context::no_args(ContextKind::WriteMemoryRandomBits);
        self.write_word(&context, address, UNKNOWN_VALUE)
    }

    /// Base register writeback of a load or store that moved it by `delta`.
    pub(crate) fn write_base_register(&mut self, rn: u32, value: u32, delta: i64) -> EmuResult<()> {
        let kind = if rn == SP_REG {
            ContextKind::AdjustStackPointer
        } else {
            ContextKind::AdjustBaseRegister
        };
        let context = Context::register_plus_offset(kind, Register::core(rn), delta);
        self.write_core_reg(&context, rn, value)
    }

    /// An encoding inside a decoded row that this emulator does not model
    /// (unprivileged, exception-return and preload forms).
    pub(crate) fn unsupported(&self, opcode: u32) -> EmulationError {
        EmulationError::UnsupportedEncoding {
            opcode,
            mode: self.mode(),
        }
    }

    // ---- PC writes ----

    /// `BranchWritePC()`: a branch that stays in the current instruction set.
    pub(crate) fn branch_write_pc(&mut self, context: &Context, address: u32) -> EmuResult<()> {
        let target = if self.is_thumb() {
            address & !1
        } else {
            address & !3
        };
        self.write_register(context, Register::PC, u64::from(target))
    }

    /// `BXWritePC()`: an interworking branch. Bit 0 of `address` selects
    /// Thumb; a mode change is written to the T bit of CPSR before PC.
    pub(crate) fn bx_write_pc(&mut self, context: &Context, address: u32) -> EmuResult<()> {
        let (mode, target) = if bit_is_set(address, 0) {
            (ProcessorMode::Thumb, address & !1)
        } else if !bit_is_set(address, 1) {
            (ProcessorMode::Arm, address & !3)
        } else {
            return Err(EmulationError::Unpredictable(
                "interworking branch to a halfword-aligned ARM address",
            ));
        };
        if mode != self.mode() {
            let cpsr = select_instr_set(self.opcode_cpsr, mode);
            let mode_context = Context::new(context.kind, ContextInfo::Isa { mode });
            self.write_register(&mode_context, Register::FLAGS, u64::from(cpsr))?;
        }
        self.write_register(context, Register::PC, u64::from(target))
    }

    /// `LoadWritePC()`: interworking from ARMv5T onward.
    pub(crate) fn load_write_pc(&mut self, context: &Context, address: u32) -> EmuResult<()> {
        if self.arch_at_least(ArmVariants::ARMV5T) {
            self.bx_write_pc(context, address)
        } else {
            self.branch_write_pc(context, address)
        }
    }

    /// `ALUWritePC()`: interworking from ARMv7 onward, and only in ARM state.
    pub(crate) fn alu_write_pc(&mut self, context: &Context, address: u32) -> EmuResult<()> {
        if self.arch_at_least(ArmVariants::ARMV7) && !self.is_thumb() {
            self.bx_write_pc(context, address)
        } else {
            self.branch_write_pc(context, address)
        }
    }

    // ---- results and flags ----

    /// Writes `result` to core register `rd` and, when `setflags`, the NZCV
    /// flags. A `None` carry or overflow leaves that flag unchanged. Writes to
    /// PC go through [`Self::alu_write_pc`] and never set flags.
    pub(crate) fn write_core_reg_optional_flags(
        &mut self,
        context: &Context,
        result: u32,
        rd: u32,
        setflags: bool,
        carry: Option<bool>,
        overflow: Option<bool>,
    ) -> EmuResult<()> {
        if rd == PC_REG {
            return self.alu_write_pc(context, result);
        }
        self.write_core_reg(context, rd, result)?;
        if setflags {
            self.write_flags(context, result, carry, overflow)?;
        }
        Ok(())
    }

    /// Writes the NZCV flags for `result`, skipping the write when nothing
    /// changed.
    pub(crate) fn write_flags(
        &mut self,
        context: &Context,
        result: u32,
        carry: Option<bool>,
        overflow: Option<bool>,
    ) -> EmuResult<()> {
        let cpsr = flags_for_result(self.opcode_cpsr, result, carry, overflow);
        if cpsr != self.opcode_cpsr {
            self.write_register(context, Register::FLAGS, u64::from(cpsr))?;
        }
        Ok(())
    }

    // ---- dispatch ----

    fn execute(&mut self, row: &OpcodeDescriptor, opcode: u32) -> EmuResult<()> {
        let encoding = row.encoding;
        match row.op {
            Op::Push => self.emulate_push(opcode, encoding),
            Op::Pop => self.emulate_pop(opcode, encoding),
            Op::VPush => self.emulate_vpush(opcode, encoding),
            Op::VPop => self.emulate_vpop(opcode, encoding),
            Op::AddSpImm => self.emulate_add_sp_imm(opcode, encoding),
            Op::SubSpImm => self.emulate_sub_sp_imm(opcode, encoding),
            Op::AluImm(op) => self.emulate_alu_imm(op, opcode, encoding),
            Op::AluReg(op) => self.emulate_alu_reg(op, opcode, encoding),
            Op::MovReg => self.emulate_mov_reg(opcode, encoding),
            Op::Adr => self.emulate_adr(opcode, encoding),
            Op::ShiftImm(kind) => self.emulate_shift_imm(kind, opcode, encoding),
            Op::ShiftReg(kind) => self.emulate_shift_reg(kind, opcode, encoding),
            Op::B => self.emulate_b(opcode, encoding),
            Op::BranchLink => self.emulate_branch_link(opcode, encoding),
            Op::BlxReg => self.emulate_blx_reg(opcode, encoding),
            Op::Bx => self.emulate_bx(opcode, encoding),
            Op::CompareBranch => self.emulate_cbz(opcode, encoding),
            Op::TableBranch => self.emulate_table_branch(opcode, encoding),
            Op::LoadMultiple(mode) => self.emulate_ldm(mode, opcode, encoding),
            Op::StoreMultiple(mode) => self.emulate_stm(mode, opcode, encoding),
            Op::LoadImm(size) => self.emulate_load_imm(size, opcode, encoding),
            Op::LoadLiteral(size) => self.emulate_load_literal(size, opcode, encoding),
            Op::LoadReg(size) => self.emulate_load_reg(size, opcode, encoding),
            Op::StoreImm(size) => self.emulate_store_imm(size, opcode, encoding),
            Op::StoreReg(size) => self.emulate_store_reg(size, opcode, encoding),
            Op::Svc => self.emulate_svc(opcode, encoding),
            Op::It => self.emulate_it(opcode, encoding),
            Op::Nop => Ok(()),
        }
    }

    fn condition_passed(&self, inst: &Instruction) -> bool {
        if self.options.ignore_conditions {
            return true;
        }
        let cond = match inst.mode {
            ProcessorMode::Arm => crate::bits::bits(inst.opcode, 31, 28),
            ProcessorMode::Thumb => thumb_condition(
                inst.opcode,
                inst.size == InstrSize::Size32,
                &self.it_session,
            ),
            ProcessorMode::Invalid => return false,
        };
        condition_passed(cond, self.opcode_cpsr)
    }
}

impl<A: EmulatorAccess> InstructionEmulator for ArmEmulator<A> {
    fn set_architecture(&mut self, name: &str) -> bool {
        match self.try_set_architecture(name) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("{}; using the oldest architecture", err);
                false
            }
        }
    }

    fn read_instruction(&mut self) -> EmuResult<Instruction> {
        self.inst = None;
        let cpsr = self.read_register(Register::FLAGS)? as u32;
        let address = self.read_register(Register::PC)? as u32;
        let context = Context::no_args(ContextKind::ReadOpcode);

        let inst = if Psr::from_bits_retain(cpsr).contains(Psr::T) {
            let first = self.read_memory(&context, address, 2)? as u32;
            if decoder::is_thumb32(first) {
                let second = self.read_memory(&context, address.wrapping_add(2), 2)? as u32;
                Instruction {
                    opcode: (first << 16) | second,
                    size: InstrSize::Size32,
                    mode: ProcessorMode::Thumb,
                    address,
                }
            } else {
                Instruction {
                    opcode: first,
                    size: InstrSize::Size16,
                    mode: ProcessorMode::Thumb,
                    address,
                }
            }
        } else {
            Instruction {
                opcode: self.read_word(&context, address)?,
                size: InstrSize::Size32,
                mode: ProcessorMode::Arm,
                address,
            }
        };

        tracing::trace!(
            "Fetched {:?} opcode {:#010x} at {:#x}",
            inst.mode,
            inst.opcode,
            inst.address
        );
        self.opcode_cpsr = cpsr;
        self.inst = Some(inst);
        Ok(inst)
    }

    fn evaluate_instruction(&mut self) -> EmuResult<Retired> {
        let inst = self.current()?;
        let row = decoder::lookup(inst.opcode, inst.mode).ok_or_else(|| {
            tracing::debug!(
                "No decode row for {:?} opcode {:#010x} at {:#x}",
                inst.mode,
                inst.opcode,
                inst.address
            );
            EmulationError::UnsupportedEncoding {
                opcode: inst.opcode,
                mode: inst.mode,
            }
        })?;
        tracing::trace!("{:#x}: {} ({:?})", inst.address, row.name, row.encoding);

        match self.read_register(Register::FLAGS) {
            Ok(cpsr) => self.opcode_cpsr = cpsr as u32,
            Err(err) if !self.options.ignore_conditions => return Err(err),
            Err(_) => {}
        }

        // IT state is only advanced for instructions that reached the
        // condition check, and exactly once for each.
        let in_it = inst.mode == ProcessorMode::Thumb && self.it_session.in_it_block();
        let passed = self.condition_passed(&inst);
        let result = if passed {
            self.execute(row, inst.opcode)
        } else {
            tracing::debug!("{:#x}: {} condition failed", inst.address, row.name);
            Ok(())
        };
        if in_it {
            self.it_session.advance();
        }
        if let Err(EmulationError::Unpredictable(reason)) = &result {
            tracing::debug!("{:#x}: {} rejected: {}", inst.address, row.name, reason);
        }
        result?;

        if self.options.auto_advance_pc {
            let pc = self.read_register(Register::PC)? as u32;
            if pc == inst.address {
                let next = inst.address.wrapping_add(inst.size.bytes());
                let context = Context::no_args(ContextKind::AdvancePc);
                self.write_register(&context, Register::PC, u64::from(next))?;
            }
        }
        if passed {
            Ok(Retired::Executed)
        } else {
            Ok(Retired::ConditionFailed)
        }
    }
}

/// `SelectInstrSet()`: the CPSR with its T bit set for Thumb and clear for
/// ARM.
pub fn select_instr_set(cpsr: u32, mode: ProcessorMode) -> u32 {
    let mut psr = Psr::from_bits_retain(cpsr);
    psr.set(Psr::T, mode == ProcessorMode::Thumb);
    psr.bits()
}

/// CPSR after a flag-setting operation produced `result`. N and Z always
/// follow the result; C and V change only when given.
pub fn flags_for_result(cpsr: u32, result: u32, carry: Option<bool>, overflow: Option<bool>) -> u32 {
    let mut psr = Psr::from_bits_retain(cpsr);
    psr.set(Psr::N, bit_is_set(result, 31));
    psr.set(Psr::Z, result == 0);
    if let Some(carry) = carry {
        psr.set(Psr::C, carry);
    }
    if let Some(overflow) = overflow {
        psr.set(Psr::V, overflow);
    }
    psr.bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_for_result() {
        let cpsr = Psr::C.bits() | Psr::T.bits();
        let flags = flags_for_result(cpsr, 0, None, Some(true));
        assert_eq!(flags, (Psr::Z | Psr::C | Psr::V | Psr::T).bits());

        let flags = flags_for_result(cpsr, 0x8000_0000, Some(false), None);
        assert_eq!(flags, (Psr::N | Psr::T).bits());
    }

    #[test]
    fn test_pc_destination_never_sets_flags() {
        use crate::state::{EmulationState, WriteTarget};

        let mut emu = ArmEmulator::new(EmulationState::new());
        emu.set_instruction(0, InstrSize::Size32, ProcessorMode::Arm, 0x8000);
        let context = Context::no_args(ContextKind::DataProcessing);
        emu.write_core_reg_optional_flags(&context, 0x9003, PC_REG, true, Some(true), Some(true))
            .unwrap();

        let writes = emu.access().writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].target, WriteTarget::Register { reg: Register::PC });
        // version 0 branches without interworking
        assert_eq!(emu.access().pc(), 0x9000);
        assert_eq!(emu.access().cpsr(), 0);
    }

    #[test]
    fn test_select_instr_set_toggles_t_only() {
        let cpsr = 0x6000_0010;
        let thumb = select_instr_set(cpsr, ProcessorMode::Thumb);
        assert_eq!(thumb, cpsr | Psr::T.bits());
        assert_eq!(select_instr_set(thumb, ProcessorMode::Arm), cpsr);
    }
}
