// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! A32 decode table.

use super::{AluOp, BlockMode, Encoding::*, InstrSize::Size32, MemSize, Op, OpcodeDescriptor};
use crate::arch::ArmVariants;
use crate::arith::ShiftType;

const ALL: ArmVariants = ArmVariants::ALL;
const V4T: ArmVariants = ArmVariants::ARMV4T_ABOVE;
const V5: ArmVariants = ArmVariants::ARMV5_ABOVE;
const V6T2: ArmVariants = ArmVariants::ARMV6T2_ABOVE;
const V6K: ArmVariants = ArmVariants::ARMV6K.union(ArmVariants::ARMV6T2_ABOVE);

const fn row(
    mask: u32,
    value: u32,
    variants: ArmVariants,
    encoding: super::Encoding,
    op: Op,
    name: &'static str,
) -> OpcodeDescriptor {
    OpcodeDescriptor::new(mask, value, variants, encoding, Size32, op, name)
}

#[rustfmt::skip]
pub static ARM_OPCODES: &[OpcodeDescriptor] = &[
    // Prologue: push register(s)
    row(0x0fff_0000, 0x092d_0000, ALL, A1, Op::Push, "push <registers>"),
    row(0x0fff_0fff, 0x052d_0004, ALL, A2, Op::Push, "push <register>"),
    // vector push consecutive extension registers
    row(0x0fbf_0f00, 0x0d2d_0b00, V6T2, A1, Op::VPush, "vpush.64 <list>"),
    row(0x0fbf_0f00, 0x0d2d_0a00, V6T2, A2, Op::VPush, "vpush.32 <list>"),

    // Epilogue: pop register(s)
    row(0x0fff_0000, 0x08bd_0000, ALL, A1, Op::Pop, "pop <registers>"),
    row(0x0fff_0fff, 0x049d_0004, ALL, A2, Op::Pop, "pop <register>"),
    row(0x0fbf_0f00, 0x0cbd_0b00, V6T2, A1, Op::VPop, "vpop.64 <list>"),
    row(0x0fbf_0f00, 0x0cbd_0a00, V6T2, A2, Op::VPop, "vpop.32 <list>"),

    // Supervisor call
    row(0x0f00_0000, 0x0f00_0000, ALL, A1, Op::Svc, "svc #imm24"),

    // Branches. "blx <label>" lives in the unconditional space and overlaps
    // both "b" and "bl", so it must come first.
    row(0xfe00_0000, 0xfa00_0000, V5, A2, Op::BranchLink, "blx <label>"),
    row(0x0f00_0000, 0x0a00_0000, ALL, A1, Op::B, "b #imm24"),
    row(0x0f00_0000, 0x0b00_0000, ALL, A1, Op::BranchLink, "bl <label>"),
    row(0x0fff_fff0, 0x012f_ff30, V5, A1, Op::BlxReg, "blx <Rm>"),
    row(0x0fff_fff0, 0x012f_ff10, V4T, A1, Op::Bx, "bx <Rm>"),

    // Hints
    row(0x0fff_ffff, 0x0320_f000, V6K, A1, Op::Nop, "nop"),

    // Data processing. ADR is ADD/SUB with Rn == pc; MOV (register) and
    // RRX are the zero-shift forms of LSL and ROR.
    row(0x0fff_0000, 0x028f_0000, ALL, A1, Op::Adr, "add<c> <Rd>, pc, #<const>"),
    row(0x0fff_0000, 0x024f_0000, ALL, A2, Op::Adr, "sub<c> <Rd>, pc, #<const>"),
    row(0x0fef_0ff0, 0x01a0_0000, ALL, A1, Op::MovReg, "mov{s}<c> <Rd>, <Rm>"),
    row(0x0fef_0ff0, 0x01a0_0060, ALL, A1, Op::ShiftImm(ShiftType::Rrx), "rrx{s}<c> <Rd>, <Rm>"),
    row(0x0fef_0070, 0x01a0_0000, ALL, A1, Op::ShiftImm(ShiftType::Lsl), "lsl{s}<c> <Rd>, <Rm>, #imm"),
    row(0x0fef_0070, 0x01a0_0020, ALL, A1, Op::ShiftImm(ShiftType::Lsr), "lsr{s}<c> <Rd>, <Rm>, #imm"),
    row(0x0fef_0070, 0x01a0_0040, ALL, A1, Op::ShiftImm(ShiftType::Asr), "asr{s}<c> <Rd>, <Rm>, #imm"),
    row(0x0fef_0070, 0x01a0_0060, ALL, A1, Op::ShiftImm(ShiftType::Ror), "ror{s}<c> <Rd>, <Rm>, #imm"),
    row(0x0fef_00f0, 0x01a0_0010, ALL, A1, Op::ShiftReg(ShiftType::Lsl), "lsl{s}<c> <Rd>, <Rn>, <Rm>"),
    row(0x0fef_00f0, 0x01a0_0030, ALL, A1, Op::ShiftReg(ShiftType::Lsr), "lsr{s}<c> <Rd>, <Rn>, <Rm>"),
    row(0x0fef_00f0, 0x01a0_0050, ALL, A1, Op::ShiftReg(ShiftType::Asr), "asr{s}<c> <Rd>, <Rn>, <Rm>"),
    row(0x0fef_00f0, 0x01a0_0070, ALL, A1, Op::ShiftReg(ShiftType::Ror), "ror{s}<c> <Rd>, <Rn>, <Rm>"),
    row(0x0fef_0000, 0x03a0_0000, ALL, A1, Op::AluImm(AluOp::Mov), "mov{s}<c> <Rd>, #<const>"),
    row(0x0ff0_0000, 0x0300_0000, V6T2, A2, Op::AluImm(AluOp::Mov), "movw<c> <Rd>, #<imm16>"),
    row(0x0fef_0000, 0x03e0_0000, ALL, A1, Op::AluImm(AluOp::Mvn), "mvn{s}<c> <Rd>, #<const>"),
    row(0x0fef_0010, 0x01e0_0000, ALL, A1, Op::AluReg(AluOp::Mvn), "mvn{s}<c> <Rd>, <Rm>{, <shift>}"),
    row(0x0ff0_f000, 0x0310_0000, ALL, A1, Op::AluImm(AluOp::Tst), "tst<c> <Rn>, #<const>"),
    row(0x0ff0_f010, 0x0110_0000, ALL, A1, Op::AluReg(AluOp::Tst), "tst<c> <Rn>, <Rm>{, <shift>}"),
    row(0x0ff0_f000, 0x0330_0000, ALL, A1, Op::AluImm(AluOp::Teq), "teq<c> <Rn>, #<const>"),
    row(0x0ff0_f010, 0x0130_0000, ALL, A1, Op::AluReg(AluOp::Teq), "teq<c> <Rn>, <Rm>{, <shift>}"),
    row(0x0ff0_f000, 0x0350_0000, ALL, A1, Op::AluImm(AluOp::Cmp), "cmp<c> <Rn>, #<const>"),
    row(0x0ff0_f010, 0x0150_0000, ALL, A1, Op::AluReg(AluOp::Cmp), "cmp<c> <Rn>, <Rm>{, <shift>}"),
    row(0x0ff0_f000, 0x0370_0000, ALL, A1, Op::AluImm(AluOp::Cmn), "cmn<c> <Rn>, #<const>"),
    row(0x0ff0_f010, 0x0170_0000, ALL, A1, Op::AluReg(AluOp::Cmn), "cmn<c> <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x0200_0000, ALL, A1, Op::AluImm(AluOp::And), "and{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x0000_0000, ALL, A1, Op::AluReg(AluOp::And), "and{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x0220_0000, ALL, A1, Op::AluImm(AluOp::Eor), "eor{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x0020_0000, ALL, A1, Op::AluReg(AluOp::Eor), "eor{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x0240_0000, ALL, A1, Op::AluImm(AluOp::Sub), "sub{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x0040_0000, ALL, A1, Op::AluReg(AluOp::Sub), "sub{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x0260_0000, ALL, A1, Op::AluImm(AluOp::Rsb), "rsb{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x0060_0000, ALL, A1, Op::AluReg(AluOp::Rsb), "rsb{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x0280_0000, ALL, A1, Op::AluImm(AluOp::Add), "add{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x0080_0000, ALL, A1, Op::AluReg(AluOp::Add), "add{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x02a0_0000, ALL, A1, Op::AluImm(AluOp::Adc), "adc{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x00a0_0000, ALL, A1, Op::AluReg(AluOp::Adc), "adc{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x02c0_0000, ALL, A1, Op::AluImm(AluOp::Sbc), "sbc{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x00c0_0000, ALL, A1, Op::AluReg(AluOp::Sbc), "sbc{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x02e0_0000, ALL, A1, Op::AluImm(AluOp::Rsc), "rsc{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x00e0_0000, ALL, A1, Op::AluReg(AluOp::Rsc), "rsc{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x0380_0000, ALL, A1, Op::AluImm(AluOp::Orr), "orr{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x0180_0000, ALL, A1, Op::AluReg(AluOp::Orr), "orr{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0x0fe0_0000, 0x03c0_0000, ALL, A1, Op::AluImm(AluOp::Bic), "bic{s}<c> <Rd>, <Rn>, #<const>"),
    row(0x0fe0_0010, 0x01c0_0000, ALL, A1, Op::AluReg(AluOp::Bic), "bic{s}<c> <Rd>, <Rn>, <Rm>{, <shift>}"),

    // Load/store multiple
    row(0x0fd0_0000, 0x0890_0000, ALL, A1, Op::LoadMultiple(BlockMode::IncrementAfter), "ldm<c> <Rn>{!}, <registers>"),
    row(0x0fd0_0000, 0x0810_0000, ALL, A1, Op::LoadMultiple(BlockMode::DecrementAfter), "ldmda<c> <Rn>{!}, <registers>"),
    row(0x0fd0_0000, 0x0910_0000, ALL, A1, Op::LoadMultiple(BlockMode::DecrementBefore), "ldmdb<c> <Rn>{!}, <registers>"),
    row(0x0fd0_0000, 0x0990_0000, ALL, A1, Op::LoadMultiple(BlockMode::IncrementBefore), "ldmib<c> <Rn>{!}, <registers>"),
    row(0x0fd0_0000, 0x0880_0000, ALL, A1, Op::StoreMultiple(BlockMode::IncrementAfter), "stm<c> <Rn>{!}, <registers>"),
    row(0x0fd0_0000, 0x0800_0000, ALL, A1, Op::StoreMultiple(BlockMode::DecrementAfter), "stmda<c> <Rn>{!}, <registers>"),
    row(0x0fd0_0000, 0x0900_0000, ALL, A1, Op::StoreMultiple(BlockMode::DecrementBefore), "stmdb<c> <Rn>{!}, <registers>"),
    row(0x0fd0_0000, 0x0980_0000, ALL, A1, Op::StoreMultiple(BlockMode::IncrementBefore), "stmib<c> <Rn>{!}, <registers>"),

    // Load/store single. Literal rows sit above the immediate rows they alias.
    row(0x0f7f_0000, 0x051f_0000, ALL, A1, Op::LoadLiteral(MemSize::Word), "ldr<c> <Rt>, [pc, #+/-<imm12>]"),
    row(0x0f7f_0000, 0x055f_0000, ALL, A1, Op::LoadLiteral(MemSize::Byte), "ldrb<c> <Rt>, [pc, #+/-<imm12>]"),
    row(0x0e50_0000, 0x0410_0000, ALL, A1, Op::LoadImm(MemSize::Word), "ldr<c> <Rt>, [<Rn>{, #+/-<imm12>}]"),
    row(0x0e50_0000, 0x0450_0000, ALL, A1, Op::LoadImm(MemSize::Byte), "ldrb<c> <Rt>, [<Rn>{, #+/-<imm12>}]"),
    row(0x0e50_0000, 0x0400_0000, ALL, A1, Op::StoreImm(MemSize::Word), "str<c> <Rt>, [<Rn>{, #+/-<imm12>}]"),
    row(0x0e50_0000, 0x0440_0000, ALL, A1, Op::StoreImm(MemSize::Byte), "strb<c> <Rt>, [<Rn>{, #+/-<imm12>}]"),
    row(0x0e50_0010, 0x0610_0000, ALL, A1, Op::LoadReg(MemSize::Word), "ldr<c> <Rt>, [<Rn>, +/-<Rm>{, <shift>}]{!}"),
    row(0x0e50_0010, 0x0650_0000, ALL, A1, Op::LoadReg(MemSize::Byte), "ldrb<c> <Rt>, [<Rn>, +/-<Rm>{, <shift>}]{!}"),
    row(0x0e50_0010, 0x0600_0000, ALL, A1, Op::StoreReg(MemSize::Word), "str<c> <Rt>, [<Rn>, +/-<Rm>{, <shift>}]{!}"),
    row(0x0e50_0010, 0x0640_0000, ALL, A1, Op::StoreReg(MemSize::Byte), "strb<c> <Rt>, [<Rn>, +/-<Rm>{, <shift>}]{!}"),
];
