// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Ordered mask/value decode tables for the ARM and Thumb instruction spaces.
//!
//! Lookup is a linear scan that returns the first row whose fixed bits match,
//! so a more specific pattern must sit above any general pattern it overlaps.
//! The `variants` column is informational: lookups ignore it unless the
//! caller asks for gating with [`lookup_for_arch`].

pub mod arm;
pub mod thumb;

use crate::arch::ArmVariants;
use crate::arith::ShiftType;
use crate::context::ProcessorMode;

pub use arm::ARM_OPCODES;
pub use thumb::THUMB_OPCODES;

/// ARM ARM encoding label of a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    A1,
    A2,
    T1,
    T2,
    T3,
    T4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InstrSize {
    Size16,
    Size32,
}

impl InstrSize {
    pub const fn bytes(self) -> u32 {
        match self {
            InstrSize::Size16 => 2,
            InstrSize::Size32 => 4,
        }
    }
}

/// Data-processing operation selected by a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    And,
    Eor,
    Sub,
    Rsb,
    Add,
    Adc,
    Sbc,
    Rsc,
    Tst,
    Teq,
    Cmp,
    Cmn,
    Orr,
    Mov,
    Bic,
    Mvn,
}

impl AluOp {
    /// TST, TEQ, CMP and CMN only set flags.
    pub const fn is_compare(self) -> bool {
        matches!(self, AluOp::Tst | AluOp::Teq | AluOp::Cmp | AluOp::Cmn)
    }

    /// Operations whose carry comes from the shifter rather than an adder.
    pub const fn is_logical(self) -> bool {
        matches!(
            self,
            AluOp::And
                | AluOp::Eor
                | AluOp::Tst
                | AluOp::Teq
                | AluOp::Orr
                | AluOp::Mov
                | AluOp::Bic
                | AluOp::Mvn
        )
    }

    /// MOV and MVN take no first operand register.
    pub const fn uses_rn(self) -> bool {
        !matches!(self, AluOp::Mov | AluOp::Mvn)
    }
}

/// Address sequencing of the multiple-register transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockMode {
    IncrementAfter,
    DecrementAfter,
    DecrementBefore,
    IncrementBefore,
}

impl BlockMode {
    /// Lowest address transferred for `count` registers from `base`.
    pub const fn start_address(self, base: u32, count: u32) -> u32 {
        match self {
            BlockMode::IncrementAfter => base,
            BlockMode::DecrementAfter => base.wrapping_sub(4 * count).wrapping_add(4),
            BlockMode::DecrementBefore => base.wrapping_sub(4 * count),
            BlockMode::IncrementBefore => base.wrapping_add(4),
        }
    }

    pub const fn is_increment(self) -> bool {
        matches!(self, BlockMode::IncrementAfter | BlockMode::IncrementBefore)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemSize {
    Byte,
    Word,
}

impl MemSize {
    pub const fn bytes(self) -> u32 {
        match self {
            MemSize::Byte => 1,
            MemSize::Word => 4,
        }
    }
}

/// Handler a row dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Push,
    Pop,
    VPush,
    VPop,
    AddSpImm,
    SubSpImm,
    AluImm(AluOp),
    AluReg(AluOp),
    MovReg,
    Adr,
    ShiftImm(ShiftType),
    ShiftReg(ShiftType),
    B,
    /// BL and BLX with an immediate target.
    BranchLink,
    BlxReg,
    Bx,
    CompareBranch,
    TableBranch,
    LoadMultiple(BlockMode),
    StoreMultiple(BlockMode),
    LoadImm(MemSize),
    LoadLiteral(MemSize),
    LoadReg(MemSize),
    StoreImm(MemSize),
    StoreReg(MemSize),
    Svc,
    It,
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    pub mask: u32,
    pub value: u32,
    pub variants: ArmVariants,
    pub encoding: Encoding,
    pub size: InstrSize,
    pub op: Op,
    pub name: &'static str,
}

impl OpcodeDescriptor {
    pub const fn new(
        mask: u32,
        value: u32,
        variants: ArmVariants,
        encoding: Encoding,
        size: InstrSize,
        op: Op,
        name: &'static str,
    ) -> Self {
        OpcodeDescriptor {
            mask,
            value,
            variants,
            encoding,
            size,
            op,
            name,
        }
    }

    #[inline]
    pub const fn matches(&self, opcode: u32) -> bool {
        opcode & self.mask == self.value
    }

    /// ARM opcodes with cond 0b1111 only match rows that pin the top nibble.
    #[inline]
    const fn matches_in(&self, opcode: u32, mode: ProcessorMode) -> bool {
        if matches!(mode, ProcessorMode::Arm)
            && opcode >> 28 == 0xf
            && self.mask & 0xf000_0000 == 0
        {
            return false;
        }
        self.matches(opcode)
    }
}

fn table_for(mode: ProcessorMode) -> &'static [OpcodeDescriptor] {
    match mode {
        ProcessorMode::Arm => ARM_OPCODES,
        ProcessorMode::Thumb => THUMB_OPCODES,
        ProcessorMode::Invalid => &[],
    }
}

/// First row of the `mode` table matching `opcode`.
///
/// A 32-bit Thumb opcode is `first_halfword << 16 | second_halfword`; a
/// 16-bit one has its upper halfword clear.
pub fn lookup(opcode: u32, mode: ProcessorMode) -> Option<&'static OpcodeDescriptor> {
    table_for(mode).iter().find(|row| row.matches_in(opcode, mode))
}

/// Like [`lookup`], skipping rows not valid on `arch`.
pub fn lookup_for_arch(
    opcode: u32,
    mode: ProcessorMode,
    arch: ArmVariants,
) -> Option<&'static OpcodeDescriptor> {
    table_for(mode)
        .iter()
        .find(|row| row.matches_in(opcode, mode) && row.variants.supports(arch))
}

pub fn arm_opcode_for(opcode: u32) -> Option<&'static OpcodeDescriptor> {
    lookup(opcode, ProcessorMode::Arm)
}

pub fn thumb_opcode_for(opcode: u32) -> Option<&'static OpcodeDescriptor> {
    lookup(opcode, ProcessorMode::Thumb)
}

/// Whether a leading Thumb halfword starts a 32-bit instruction.
#[inline]
pub const fn is_thumb32(halfword: u32) -> bool {
    (halfword & 0xe000) == 0xe000 && (halfword & 0x1800) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumb_width_rule() {
        assert!(!is_thumb32(0xb580)); // push {r7, lr}
        assert!(!is_thumb32(0xe7fe)); // b .
        assert!(is_thumb32(0xe92d)); // push.w
        assert!(is_thumb32(0xf000)); // bl prefix
        assert!(is_thumb32(0xf8dd));
    }

    #[test]
    fn test_block_mode_addresses() {
        let base = 0x1000;
        assert_eq!(BlockMode::IncrementAfter.start_address(base, 3), 0x1000);
        assert_eq!(BlockMode::IncrementBefore.start_address(base, 3), 0x1004);
        assert_eq!(BlockMode::DecrementAfter.start_address(base, 3), 0x0ff8);
        assert_eq!(BlockMode::DecrementBefore.start_address(base, 3), 0x0ff4);
    }

    #[test]
    fn test_strict_lookup_skips_newer_rows() {
        // blx r3 needs ARMv5T
        let blx = 0xe12f_ff33;
        assert!(lookup(blx, ProcessorMode::Arm).is_some());
        assert!(lookup_for_arch(blx, ProcessorMode::Arm, ArmVariants::ARMV4T).is_none());
        assert!(lookup_for_arch(blx, ProcessorMode::Arm, ArmVariants::ARMV5TE).is_some());
    }

    #[test]
    fn test_invalid_mode_has_no_rows() {
        assert!(lookup(0, ProcessorMode::Invalid).is_none());
    }
}
