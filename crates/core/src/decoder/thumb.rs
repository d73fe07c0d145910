// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Thumb/Thumb2 decode table. 16-bit opcodes occupy the low halfword, 32-bit
//! opcodes are `hw1 << 16 | hw2`.

use super::{
    AluOp, BlockMode, Encoding, Encoding::*, InstrSize, InstrSize::*, MemSize, Op,
    OpcodeDescriptor,
};
use crate::arch::ArmVariants;
use crate::arith::ShiftType;

const ALL: ArmVariants = ArmVariants::ALL;
const V4T: ArmVariants = ArmVariants::ARMV4T_ABOVE;
const V5: ArmVariants = ArmVariants::ARMV5_ABOVE;
const V6T2: ArmVariants = ArmVariants::ARMV6T2_ABOVE;

const fn row(
    mask: u32,
    value: u32,
    variants: ArmVariants,
    encoding: Encoding,
    size: InstrSize,
    op: Op,
    name: &'static str,
) -> OpcodeDescriptor {
    OpcodeDescriptor::new(mask, value, variants, encoding, size, op, name)
}

#[rustfmt::skip]
pub static THUMB_OPCODES: &[OpcodeDescriptor] = &[
    // Prologue
    row(0xffff_fe00, 0x0000_b400, ALL, T1, Size16, Op::Push, "push <registers>"),
    row(0xffff_0000, 0xe92d_0000, V6T2, T2, Size32, Op::Push, "push.w <registers>"),
    // "str.w <Rt>, [sp, #-4]!" is a single-register push
    row(0xffff_0fff, 0xf84d_0d04, V6T2, T3, Size32, Op::Push, "push.w <register>"),
    row(0xffbf_0f00, 0xed2d_0b00, V6T2, T1, Size32, Op::VPush, "vpush.64 <list>"),
    row(0xffbf_0f00, 0xed2d_0a00, V6T2, T2, Size32, Op::VPush, "vpush.32 <list>"),
    row(0xffff_ff80, 0x0000_b080, ALL, T1, Size16, Op::SubSpImm, "sub sp, sp, #imm"),
    row(0xffff_f800, 0x0000_a800, ALL, T1, Size16, Op::AddSpImm, "add <Rd>, sp, #imm"),

    // Epilogue
    row(0xffff_ff80, 0x0000_b000, ALL, T2, Size16, Op::AddSpImm, "add sp, sp, #imm"),
    row(0xffff_fe00, 0x0000_bc00, ALL, T1, Size16, Op::Pop, "pop <registers>"),
    row(0xffff_0000, 0xe8bd_0000, V6T2, T2, Size32, Op::Pop, "pop.w <registers>"),
    // "ldr.w <Rt>, [sp], #4" is a single-register pop
    row(0xffff_0fff, 0xf85d_0b04, V6T2, T3, Size32, Op::Pop, "pop.w <register>"),
    row(0xffbf_0f00, 0xecbd_0b00, V6T2, T1, Size32, Op::VPop, "vpop.64 <list>"),
    row(0xffbf_0f00, 0xecbd_0a00, V6T2, T2, Size32, Op::VPop, "vpop.32 <list>"),

    // Supervisor call; shares the 1101 prefix with "b<c>" and must precede it
    row(0xffff_ff00, 0x0000_df00, ALL, T1, Size16, Op::Svc, "svc #imm8"),

    // Hints take the IT encoding with a zero mask and must precede IT
    row(0xffff_ffff, 0x0000_bf00, V6T2, T1, Size16, Op::Nop, "nop"),
    row(0xffff_ffff, 0x0000_bf10, V6T2, T1, Size16, Op::Nop, "yield"),
    row(0xffff_ffff, 0x0000_bf20, V6T2, T1, Size16, Op::Nop, "wfe"),
    row(0xffff_ffff, 0x0000_bf30, V6T2, T1, Size16, Op::Nop, "wfi"),
    row(0xffff_ffff, 0x0000_bf40, V6T2, T1, Size16, Op::Nop, "sev"),
    row(0xffff_ff00, 0x0000_bf00, V6T2, T1, Size16, Op::It, "it{<x>{<y>{<z>}}} <firstcond>"),

    // Branches
    row(0xffff_f000, 0x0000_d000, ALL, T1, Size16, Op::B, "b<c> #imm8"),
    row(0xffff_f800, 0x0000_e000, ALL, T2, Size16, Op::B, "b #imm11"),
    row(0xf800_d000, 0xf000_8000, V6T2, T3, Size32, Op::B, "b<c>.w #imm20"),
    row(0xf800_d000, 0xf000_9000, V6T2, T4, Size32, Op::B, "b.w #imm24"),
    row(0xf800_d000, 0xf000_d000, V4T, T1, Size32, Op::BranchLink, "bl <label>"),
    row(0xf800_d001, 0xf000_c000, V5, T2, Size32, Op::BranchLink, "blx <label>"),
    row(0xffff_ff87, 0x0000_4780, V5, T1, Size16, Op::BlxReg, "blx <Rm>"),
    row(0xffff_ff87, 0x0000_4700, ALL, T1, Size16, Op::Bx, "bx <Rm>"),
    row(0xffff_f500, 0x0000_b100, V6T2, T1, Size16, Op::CompareBranch, "cb{n}z <Rn>, <label>"),
    row(0xfff0_fff0, 0xe8d0_f000, V6T2, T1, Size32, Op::TableBranch, "tbb [<Rn>, <Rm>]"),
    row(0xfff0_fff0, 0xe8d0_f010, V6T2, T1, Size32, Op::TableBranch, "tbh [<Rn>, <Rm>, lsl #1]"),

    // 16-bit data processing. "movs <Rd>, <Rm>" is "lsls <Rd>, <Rm>, #0".
    row(0xffff_ff00, 0x0000_4600, ALL, T1, Size16, Op::MovReg, "mov<c> <Rd>, <Rm>"),
    row(0xffff_ffc0, 0x0000_0000, ALL, T2, Size16, Op::MovReg, "movs <Rd>, <Rm>"),
    row(0xffff_f800, 0x0000_0000, ALL, T1, Size16, Op::ShiftImm(ShiftType::Lsl), "lsls <Rd>, <Rm>, #imm"),
    row(0xffff_f800, 0x0000_0800, ALL, T1, Size16, Op::ShiftImm(ShiftType::Lsr), "lsrs <Rd>, <Rm>, #imm"),
    row(0xffff_f800, 0x0000_1000, ALL, T1, Size16, Op::ShiftImm(ShiftType::Asr), "asrs <Rd>, <Rm>, #imm"),
    row(0xffff_fe00, 0x0000_1800, ALL, T1, Size16, Op::AluReg(AluOp::Add), "adds <Rd>, <Rn>, <Rm>"),
    row(0xffff_fe00, 0x0000_1a00, ALL, T1, Size16, Op::AluReg(AluOp::Sub), "subs <Rd>, <Rn>, <Rm>"),
    row(0xffff_fe00, 0x0000_1c00, ALL, T1, Size16, Op::AluImm(AluOp::Add), "adds <Rd>, <Rn>, #imm3"),
    row(0xffff_fe00, 0x0000_1e00, ALL, T1, Size16, Op::AluImm(AluOp::Sub), "subs <Rd>, <Rn>, #imm3"),
    row(0xffff_f800, 0x0000_2000, ALL, T1, Size16, Op::AluImm(AluOp::Mov), "movs <Rd>, #imm8"),
    row(0xffff_f800, 0x0000_2800, ALL, T1, Size16, Op::AluImm(AluOp::Cmp), "cmp <Rn>, #imm8"),
    row(0xffff_f800, 0x0000_3000, ALL, T2, Size16, Op::AluImm(AluOp::Add), "adds <Rdn>, #imm8"),
    row(0xffff_f800, 0x0000_3800, ALL, T2, Size16, Op::AluImm(AluOp::Sub), "subs <Rdn>, #imm8"),
    row(0xffff_ffc0, 0x0000_4000, ALL, T1, Size16, Op::AluReg(AluOp::And), "ands <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4040, ALL, T1, Size16, Op::AluReg(AluOp::Eor), "eors <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4080, ALL, T1, Size16, Op::ShiftReg(ShiftType::Lsl), "lsls <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_40c0, ALL, T1, Size16, Op::ShiftReg(ShiftType::Lsr), "lsrs <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4100, ALL, T1, Size16, Op::ShiftReg(ShiftType::Asr), "asrs <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4140, ALL, T1, Size16, Op::AluReg(AluOp::Adc), "adcs <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4180, ALL, T1, Size16, Op::AluReg(AluOp::Sbc), "sbcs <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_41c0, ALL, T1, Size16, Op::ShiftReg(ShiftType::Ror), "rors <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4200, ALL, T1, Size16, Op::AluReg(AluOp::Tst), "tst <Rn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4240, ALL, T1, Size16, Op::AluImm(AluOp::Rsb), "rsbs <Rd>, <Rn>, #0"),
    row(0xffff_ffc0, 0x0000_4280, ALL, T1, Size16, Op::AluReg(AluOp::Cmp), "cmp <Rn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_42c0, ALL, T1, Size16, Op::AluReg(AluOp::Cmn), "cmn <Rn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4300, ALL, T1, Size16, Op::AluReg(AluOp::Orr), "orrs <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_4380, ALL, T1, Size16, Op::AluReg(AluOp::Bic), "bics <Rdn>, <Rm>"),
    row(0xffff_ffc0, 0x0000_43c0, ALL, T1, Size16, Op::AluReg(AluOp::Mvn), "mvns <Rd>, <Rm>"),
    // "add sp, <Rm>" and "add <Rdm>, sp, <Rdm>" are covered by this row
    row(0xffff_ff00, 0x0000_4400, ALL, T2, Size16, Op::AluReg(AluOp::Add), "add<c> <Rdn>, <Rm>"),
    row(0xffff_ff00, 0x0000_4500, ALL, T2, Size16, Op::AluReg(AluOp::Cmp), "cmp <Rn>, <Rm>"),
    row(0xffff_f800, 0x0000_a000, ALL, T1, Size16, Op::Adr, "adr <Rd>, <label>"),

    // 32-bit shifts. MOV and RRX are the zero-shift forms and all of them
    // are ORR with Rn == pc, so they precede "orr.w".
    row(0xffef_f0f0, 0xea4f_0000, V6T2, T3, Size32, Op::MovReg, "mov{s}.w <Rd>, <Rm>"),
    row(0xffef_f0f0, 0xea4f_0030, V6T2, T1, Size32, Op::ShiftImm(ShiftType::Rrx), "rrx{s} <Rd>, <Rm>"),
    row(0xffef_8030, 0xea4f_0000, V6T2, T2, Size32, Op::ShiftImm(ShiftType::Lsl), "lsl{s}.w <Rd>, <Rm>, #imm"),
    row(0xffef_8030, 0xea4f_0010, V6T2, T2, Size32, Op::ShiftImm(ShiftType::Lsr), "lsr{s}.w <Rd>, <Rm>, #imm"),
    row(0xffef_8030, 0xea4f_0020, V6T2, T2, Size32, Op::ShiftImm(ShiftType::Asr), "asr{s}.w <Rd>, <Rm>, #imm"),
    row(0xffef_8030, 0xea4f_0030, V6T2, T1, Size32, Op::ShiftImm(ShiftType::Ror), "ror{s} <Rd>, <Rm>, #imm"),
    row(0xffe0_f0f0, 0xfa00_f000, V6T2, T2, Size32, Op::ShiftReg(ShiftType::Lsl), "lsl{s}.w <Rd>, <Rn>, <Rm>"),
    row(0xffe0_f0f0, 0xfa20_f000, V6T2, T2, Size32, Op::ShiftReg(ShiftType::Lsr), "lsr{s}.w <Rd>, <Rn>, <Rm>"),
    row(0xffe0_f0f0, 0xfa40_f000, V6T2, T2, Size32, Op::ShiftReg(ShiftType::Asr), "asr{s}.w <Rd>, <Rn>, <Rm>"),
    row(0xffe0_f0f0, 0xfa60_f000, V6T2, T2, Size32, Op::ShiftReg(ShiftType::Ror), "ror{s}.w <Rd>, <Rn>, <Rm>"),

    // 32-bit data processing (shifted register). Compares are the Rd == pc,
    // S == 1 forms of AND, EOR, ADD and SUB.
    row(0xfff0_8f00, 0xea10_0f00, V6T2, T2, Size32, Op::AluReg(AluOp::Tst), "tst.w <Rn>, <Rm>{, <shift>}"),
    row(0xfff0_8f00, 0xea90_0f00, V6T2, T1, Size32, Op::AluReg(AluOp::Teq), "teq <Rn>, <Rm>{, <shift>}"),
    row(0xfff0_8f00, 0xeb10_0f00, V6T2, T2, Size32, Op::AluReg(AluOp::Cmn), "cmn.w <Rn>, <Rm>{, <shift>}"),
    row(0xfff0_8f00, 0xebb0_0f00, V6T2, T3, Size32, Op::AluReg(AluOp::Cmp), "cmp.w <Rn>, <Rm>{, <shift>}"),
    row(0xffef_8000, 0xea6f_0000, V6T2, T2, Size32, Op::AluReg(AluOp::Mvn), "mvn{s}.w <Rd>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xea00_0000, V6T2, T2, Size32, Op::AluReg(AluOp::And), "and{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xea20_0000, V6T2, T2, Size32, Op::AluReg(AluOp::Bic), "bic{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xea40_0000, V6T2, T2, Size32, Op::AluReg(AluOp::Orr), "orr{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xea80_0000, V6T2, T2, Size32, Op::AluReg(AluOp::Eor), "eor{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xeb00_0000, V6T2, T3, Size32, Op::AluReg(AluOp::Add), "add{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xeb40_0000, V6T2, T2, Size32, Op::AluReg(AluOp::Adc), "adc{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xeb60_0000, V6T2, T2, Size32, Op::AluReg(AluOp::Sbc), "sbc{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xeba0_0000, V6T2, T2, Size32, Op::AluReg(AluOp::Sub), "sub{s}.w <Rd>, <Rn>, <Rm>{, <shift>}"),
    row(0xffe0_8000, 0xebc0_0000, V6T2, T1, Size32, Op::AluReg(AluOp::Rsb), "rsb{s} <Rd>, <Rn>, <Rm>{, <shift>}"),

    // 32-bit data processing (modified immediate)
    row(0xfbef_8000, 0xf04f_0000, V6T2, T2, Size32, Op::AluImm(AluOp::Mov), "mov{s}.w <Rd>, #<const>"),
    row(0xfbef_8000, 0xf06f_0000, V6T2, T1, Size32, Op::AluImm(AluOp::Mvn), "mvn{s} <Rd>, #<const>"),
    row(0xfbf0_8f00, 0xf010_0f00, V6T2, T1, Size32, Op::AluImm(AluOp::Tst), "tst <Rn>, #<const>"),
    row(0xfbf0_8f00, 0xf090_0f00, V6T2, T1, Size32, Op::AluImm(AluOp::Teq), "teq <Rn>, #<const>"),
    row(0xfbf0_8f00, 0xf110_0f00, V6T2, T1, Size32, Op::AluImm(AluOp::Cmn), "cmn <Rn>, #<const>"),
    row(0xfbf0_8f00, 0xf1b0_0f00, V6T2, T2, Size32, Op::AluImm(AluOp::Cmp), "cmp.w <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf000_0000, V6T2, T1, Size32, Op::AluImm(AluOp::And), "and{s} <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf020_0000, V6T2, T1, Size32, Op::AluImm(AluOp::Bic), "bic{s} <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf040_0000, V6T2, T1, Size32, Op::AluImm(AluOp::Orr), "orr{s} <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf080_0000, V6T2, T1, Size32, Op::AluImm(AluOp::Eor), "eor{s} <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf100_0000, V6T2, T3, Size32, Op::AluImm(AluOp::Add), "add{s}.w <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf140_0000, V6T2, T1, Size32, Op::AluImm(AluOp::Adc), "adc{s} <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf160_0000, V6T2, T1, Size32, Op::AluImm(AluOp::Sbc), "sbc{s} <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf1a0_0000, V6T2, T3, Size32, Op::AluImm(AluOp::Sub), "sub{s}.w <Rd>, <Rn>, #<const>"),
    row(0xfbe0_8000, 0xf1c0_0000, V6T2, T2, Size32, Op::AluImm(AluOp::Rsb), "rsb{s}.w <Rd>, <Rn>, #<const>"),

    // 32-bit data processing (plain binary immediate)
    row(0xfbff_8000, 0xf2af_0000, V6T2, T2, Size32, Op::Adr, "sub <Rd>, pc, #imm12"),
    row(0xfbff_8000, 0xf20f_0000, V6T2, T3, Size32, Op::Adr, "add <Rd>, pc, #imm12"),
    row(0xfbf0_8000, 0xf200_0000, V6T2, T4, Size32, Op::AluImm(AluOp::Add), "addw <Rd>, <Rn>, #imm12"),
    row(0xfbf0_8000, 0xf2a0_0000, V6T2, T4, Size32, Op::AluImm(AluOp::Sub), "subw <Rd>, <Rn>, #imm12"),
    row(0xfbf0_8000, 0xf240_0000, V6T2, T3, Size32, Op::AluImm(AluOp::Mov), "movw <Rd>, #imm16"),

    // Load/store multiple
    row(0xffff_f800, 0x0000_c800, V4T, T1, Size16, Op::LoadMultiple(BlockMode::IncrementAfter), "ldm <Rn>{!}, <registers>"),
    row(0xffd0_2000, 0xe890_0000, V6T2, T2, Size32, Op::LoadMultiple(BlockMode::IncrementAfter), "ldm.w <Rn>{!}, <registers>"),
    row(0xffd0_2000, 0xe910_0000, V6T2, T1, Size32, Op::LoadMultiple(BlockMode::DecrementBefore), "ldmdb <Rn>{!}, <registers>"),
    row(0xffff_f800, 0x0000_c000, V4T, T1, Size16, Op::StoreMultiple(BlockMode::IncrementAfter), "stm <Rn>!, <registers>"),
    row(0xffd0_a000, 0xe880_0000, V6T2, T2, Size32, Op::StoreMultiple(BlockMode::IncrementAfter), "stm.w <Rn>{!}, <registers>"),
    row(0xffd0_a000, 0xe900_0000, V6T2, T1, Size32, Op::StoreMultiple(BlockMode::DecrementBefore), "stmdb <Rn>{!}, <registers>"),

    // Load/store single. Literal rows precede the [Rn, ...] rows they alias.
    row(0xffff_f800, 0x0000_4800, ALL, T1, Size16, Op::LoadLiteral(MemSize::Word), "ldr <Rt>, [pc, #imm]"),
    row(0xff7f_0000, 0xf85f_0000, V6T2, T2, Size32, Op::LoadLiteral(MemSize::Word), "ldr.w <Rt>, [pc, #+/-imm12]"),
    row(0xff7f_0000, 0xf81f_0000, V6T2, T1, Size32, Op::LoadLiteral(MemSize::Byte), "ldrb <Rt>, [pc, #+/-imm12]"),
    row(0xffff_f800, 0x0000_6800, ALL, T1, Size16, Op::LoadImm(MemSize::Word), "ldr <Rt>, [<Rn>, #imm]"),
    row(0xffff_f800, 0x0000_9800, ALL, T2, Size16, Op::LoadImm(MemSize::Word), "ldr <Rt>, [sp, #imm]"),
    row(0xfff0_0000, 0xf8d0_0000, V6T2, T3, Size32, Op::LoadImm(MemSize::Word), "ldr.w <Rt>, [<Rn>, #imm12]"),
    row(0xfff0_0800, 0xf850_0800, V6T2, T4, Size32, Op::LoadImm(MemSize::Word), "ldr <Rt>, [<Rn>, #+/-imm8]{!}"),
    row(0xffff_f800, 0x0000_7800, ALL, T1, Size16, Op::LoadImm(MemSize::Byte), "ldrb <Rt>, [<Rn>, #imm5]"),
    row(0xfff0_0000, 0xf890_0000, V6T2, T2, Size32, Op::LoadImm(MemSize::Byte), "ldrb.w <Rt>, [<Rn>, #imm12]"),
    row(0xfff0_0800, 0xf810_0800, V6T2, T3, Size32, Op::LoadImm(MemSize::Byte), "ldrb <Rt>, [<Rn>, #+/-imm8]{!}"),
    row(0xffff_f800, 0x0000_6000, ALL, T1, Size16, Op::StoreImm(MemSize::Word), "str <Rt>, [<Rn>, #imm]"),
    row(0xffff_f800, 0x0000_9000, ALL, T2, Size16, Op::StoreImm(MemSize::Word), "str <Rt>, [sp, #imm]"),
    row(0xfff0_0000, 0xf8c0_0000, V6T2, T3, Size32, Op::StoreImm(MemSize::Word), "str.w <Rt>, [<Rn>, #imm12]"),
    row(0xfff0_0800, 0xf840_0800, V6T2, T4, Size32, Op::StoreImm(MemSize::Word), "str <Rt>, [<Rn>, #+/-imm8]{!}"),
    row(0xffff_f800, 0x0000_7000, ALL, T1, Size16, Op::StoreImm(MemSize::Byte), "strb <Rt>, [<Rn>, #imm5]"),
    row(0xfff0_0000, 0xf880_0000, V6T2, T2, Size32, Op::StoreImm(MemSize::Byte), "strb.w <Rt>, [<Rn>, #imm12]"),
    row(0xfff0_0800, 0xf800_0800, V6T2, T3, Size32, Op::StoreImm(MemSize::Byte), "strb <Rt>, [<Rn>, #+/-imm8]{!}"),
    row(0xffff_fe00, 0x0000_5800, ALL, T1, Size16, Op::LoadReg(MemSize::Word), "ldr <Rt>, [<Rn>, <Rm>]"),
    row(0xfff0_0fc0, 0xf850_0000, V6T2, T2, Size32, Op::LoadReg(MemSize::Word), "ldr.w <Rt>, [<Rn>, <Rm>{, lsl #imm2}]"),
    row(0xffff_fe00, 0x0000_5c00, ALL, T1, Size16, Op::LoadReg(MemSize::Byte), "ldrb <Rt>, [<Rn>, <Rm>]"),
    row(0xfff0_0fc0, 0xf810_0000, V6T2, T2, Size32, Op::LoadReg(MemSize::Byte), "ldrb.w <Rt>, [<Rn>, <Rm>{, lsl #imm2}]"),
    row(0xffff_fe00, 0x0000_5000, ALL, T1, Size16, Op::StoreReg(MemSize::Word), "str <Rt>, [<Rn>, <Rm>]"),
    row(0xfff0_0fc0, 0xf840_0000, V6T2, T2, Size32, Op::StoreReg(MemSize::Word), "str.w <Rt>, [<Rn>, <Rm>{, lsl #imm2}]"),
    row(0xffff_fe00, 0x0000_5400, ALL, T1, Size16, Op::StoreReg(MemSize::Byte), "strb <Rt>, [<Rn>, <Rm>]"),
    row(0xfff0_0fc0, 0xf800_0000, V6T2, T2, Size32, Op::StoreReg(MemSize::Byte), "strb.w <Rt>, [<Rn>, <Rm>{, lsl #imm2}]"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{is_thumb32, thumb_opcode_for};

    fn op_of(opcode: u32) -> Option<Op> {
        thumb_opcode_for(opcode).map(|row| row.op)
    }

    fn row_of(opcode: u32) -> &'static OpcodeDescriptor {
        thumb_opcode_for(opcode).unwrap()
    }

    #[test]
    fn test_row_sizes_agree_with_width_rule() {
        for (index, row) in THUMB_OPCODES.iter().enumerate() {
            assert_eq!(row.value & !row.mask, 0, "row {index} ({})", row.name);
            let wide = row.value > 0xffff;
            assert_eq!(wide, row.size == Size32, "row {index} ({})", row.name);
            if wide {
                assert!(is_thumb32(row.value >> 16), "row {index} ({})", row.name);
            } else {
                assert!(!is_thumb32(row.value), "row {index} ({})", row.name);
            }
        }
    }

    #[test]
    fn test_push_single_precedes_generic_store() {
        // str.w lr, [sp, #-4]!
        let row = row_of(0xf84d_ed04);
        assert_eq!((row.op, row.encoding), (Op::Push, T3));
        // str.w lr, [sp, #-8]!
        assert_eq!(op_of(0xf84d_ed08), Some(Op::StoreImm(MemSize::Word)));
        // ldr.w pc, [sp], #4
        let row = row_of(0xf85d_fb04);
        assert_eq!((row.op, row.encoding), (Op::Pop, T3));
        assert_eq!(op_of(0xf85d_fb08), Some(Op::LoadImm(MemSize::Word)));
    }

    #[test]
    fn test_svc_precedes_conditional_branch() {
        assert_eq!(op_of(0xdf01), Some(Op::Svc));
        assert_eq!(op_of(0xd0fe), Some(Op::B));
        assert_eq!(op_of(0xdd00), Some(Op::B));
    }

    #[test]
    fn test_hints_precede_it() {
        assert_eq!(op_of(0xbf00), Some(Op::Nop));
        assert_eq!(op_of(0xbf30), Some(Op::Nop));
        assert_eq!(op_of(0xbf08), Some(Op::It));
        assert_eq!(op_of(0xbf1c), Some(Op::It));
    }

    #[test]
    fn test_branch_with_link_forms() {
        // bl: J1 == J2 == 1
        let row = row_of(0xf000_f800);
        assert_eq!((row.op, row.encoding), (Op::BranchLink, T1));
        let row = row_of(0xf000_e800);
        assert_eq!((row.op, row.encoding), (Op::BranchLink, T2));
        // b.w
        let row = row_of(0xf000_b800);
        assert_eq!((row.op, row.encoding), (Op::B, T4));
        let row = row_of(0xf040_8000);
        assert_eq!((row.op, row.encoding), (Op::B, T3));
        assert_eq!(op_of(0x4770), Some(Op::Bx));
        assert_eq!(op_of(0x4798), Some(Op::BlxReg));
    }

    #[test]
    fn test_mov_and_shift_rows_precede_orr() {
        // mov.w r0, r1
        assert_eq!(op_of(0xea4f_0001), Some(Op::MovReg));
        // lsl.w r0, r1, #2
        assert_eq!(op_of(0xea4f_0081), Some(Op::ShiftImm(ShiftType::Lsl)));
        // rrx r0, r1
        assert_eq!(op_of(0xea4f_0031), Some(Op::ShiftImm(ShiftType::Rrx)));
        // ror r0, r1, #4
        assert_eq!(op_of(0xea4f_1031), Some(Op::ShiftImm(ShiftType::Ror)));
        // orr.w r0, r2, r1
        assert_eq!(op_of(0xea42_0001), Some(Op::AluReg(AluOp::Orr)));
        // movs r0, r1 is lsls #0
        assert_eq!(op_of(0x0008), Some(Op::MovReg));
        assert_eq!(op_of(0x0088), Some(Op::ShiftImm(ShiftType::Lsl)));
    }

    #[test]
    fn test_compares_precede_their_aliases() {
        // tst.w r0, r1
        assert_eq!(op_of(0xea10_0f01), Some(Op::AluReg(AluOp::Tst)));
        // ands.w r1, r0, r1
        assert_eq!(op_of(0xea10_0101), Some(Op::AluReg(AluOp::And)));
        // cmp.w r0, #1
        assert_eq!(op_of(0xf1b0_0f01), Some(Op::AluImm(AluOp::Cmp)));
        // subs.w r1, r0, #1
        assert_eq!(op_of(0xf1b0_0101), Some(Op::AluImm(AluOp::Sub)));
        // mov.w r0, #1 vs orr r0, r1, #1
        assert_eq!(op_of(0xf04f_0001), Some(Op::AluImm(AluOp::Mov)));
        assert_eq!(op_of(0xf041_0001), Some(Op::AluImm(AluOp::Orr)));
    }

    #[test]
    fn test_prologue_forms() {
        // push {r7, lr}
        assert_eq!(op_of(0xb580), Some(Op::Push));
        // add r7, sp, #0
        assert_eq!(op_of(0xaf00), Some(Op::AddSpImm));
        // mov r7, sp
        assert_eq!(op_of(0x466f), Some(Op::MovReg));
        // sub sp, #8
        assert_eq!(op_of(0xb082), Some(Op::SubSpImm));
        // add sp, #8
        assert_eq!(op_of(0xb002), Some(Op::AddSpImm));
        // sub.w sp, sp, #256
        assert_eq!(op_of(0xf5ad_7d80), Some(Op::AluImm(AluOp::Sub)));
        // vpush {d8-d9}
        assert_eq!(op_of(0xed2d_8b04), Some(Op::VPush));
        // add sp, r0
        assert_eq!(op_of(0x4485), Some(Op::AluReg(AluOp::Add)));
    }

    #[test]
    fn test_loads_and_stores() {
        assert_eq!(op_of(0x4801), Some(Op::LoadLiteral(MemSize::Word)));
        assert_eq!(op_of(0xf8df_0004), Some(Op::LoadLiteral(MemSize::Word)));
        assert_eq!(op_of(0xf8d1_0004), Some(Op::LoadImm(MemSize::Word)));
        assert_eq!(op_of(0x9801), Some(Op::LoadImm(MemSize::Word)));
        assert_eq!(op_of(0x5888), Some(Op::LoadReg(MemSize::Word)));
        assert_eq!(op_of(0xf851_0022), Some(Op::LoadReg(MemSize::Word)));
        assert_eq!(op_of(0x7008), Some(Op::StoreImm(MemSize::Byte)));
        assert_eq!(op_of(0xe8bd_4010), Some(Op::Pop));
        assert_eq!(op_of(0xe891_000c), Some(Op::LoadMultiple(BlockMode::IncrementAfter)));
        assert_eq!(op_of(0xe8d1_f002), Some(Op::TableBranch));
    }

    #[test]
    fn test_unsupported_returns_none() {
        // mul r0, r1
        assert_eq!(op_of(0x4348), None);
        // ldrh r0, [r1]
        assert_eq!(op_of(0x8808), None);
    }
}
