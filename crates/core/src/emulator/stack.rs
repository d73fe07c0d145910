// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! PUSH, POP, VPUSH, VPOP and the SP-relative immediate adjustments.

use super::ArmEmulator;
use crate::access::EmulatorAccess;
use crate::arith::{add_with_carry, bad_reg, thumb_imm_scaled};
use crate::arch::ArmVariants;
use crate::bits::{bit, bit_count, bit_is_set, bits};
use crate::context::{Context, ContextInfo, ContextKind, Register, PC_REG, SP_REG};
use crate::decoder::Encoding;
use crate::{EmuResult, EmulationError};

impl<A: EmulatorAccess> ArmEmulator<A> {
    /// Context for a store into the frame being built below `sp`.
    fn push_context(data_reg: Register, offset: i64) -> Context {
        Context::new(
            ContextKind::PushRegisterOnStack,
            ContextInfo::RegisterToRegisterPlusOffset {
                data_reg,
                base: Register::SP,
                offset,
            },
        )
    }

    fn adjust_sp(&mut self, sp: u32, delta: i64) -> EmuResult<()> {
        let context = Context::register_plus_offset(ContextKind::AdjustStackPointer, Register::SP, delta);
        let new_sp = (i64::from(sp) + delta) as u32;
        self.write_core_reg(&context, SP_REG, new_sp)
    }

    pub(super) fn emulate_push(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let registers = match encoding {
            Encoding::T1 => bits(opcode, 7, 0) | (bit(opcode, 8) << 14),
            Encoding::T2 => {
                if bit_is_set(opcode, 15) || bit_is_set(opcode, 13) {
                    return Err(EmulationError::Unpredictable("push.w of sp or pc"));
                }
                let registers = bits(opcode, 15, 0);
                if bit_count(registers) < 2 {
                    return Err(EmulationError::Unpredictable("push.w needs two registers"));
                }
                registers
            }
            Encoding::T3 => {
                let t = bits(opcode, 15, 12);
                if bad_reg(t) {
                    return Err(EmulationError::Unpredictable("push.w of sp or pc"));
                }
                1 << t
            }
            Encoding::A1 => bits(opcode, 15, 0),
            Encoding::A2 => {
                let t = bits(opcode, 15, 12);
                if t == SP_REG {
                    return Err(EmulationError::Unpredictable("push of sp"));
                }
                1 << t
            }
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        if registers == 0 {
            return Err(EmulationError::Unpredictable("push of an empty list"));
        }

        let sp = self.read_core_reg(SP_REG)?;
        let frame = 4 * bit_count(registers);
        let mut address = sp.wrapping_sub(frame);
        for n in 0..=PC_REG {
            if !bit_is_set(registers, n) {
                continue;
            }
            // PC stores the biased value, PCStoreValue()
            let value = self.read_core_reg(n)?;
            let offset = i64::from(address) - i64::from(sp);
            self.write_word(&Self::push_context(Register::core(n), offset), address, value)?;
            address = address.wrapping_add(4);
        }
        self.adjust_sp(sp, -i64::from(frame))
    }

    pub(super) fn emulate_pop(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let registers = match encoding {
            Encoding::T1 => {
                let registers = bits(opcode, 7, 0) | (bit(opcode, 8) << 15);
                if bit_is_set(registers, PC_REG) {
                    self.check_it_tail()?;
                }
                registers
            }
            Encoding::T2 => {
                let registers = bits(opcode, 15, 0);
                if bit_is_set(registers, 13) {
                    return Err(EmulationError::Unpredictable("pop.w of sp"));
                }
                if bit_count(registers) < 2 {
                    return Err(EmulationError::Unpredictable("pop.w needs two registers"));
                }
                if bit_is_set(registers, 15) && bit_is_set(registers, 14) {
                    return Err(EmulationError::Unpredictable("pop.w of both lr and pc"));
                }
                if bit_is_set(registers, 15) {
                    self.check_it_tail()?;
                }
                registers
            }
            Encoding::T3 => {
                let t = bits(opcode, 15, 12);
                if t == SP_REG {
                    return Err(EmulationError::Unpredictable("pop.w of sp"));
                }
                if t == PC_REG {
                    self.check_it_tail()?;
                }
                1 << t
            }
            Encoding::A1 => {
                let registers = bits(opcode, 15, 0);
                if bit_is_set(registers, SP_REG) && self.arch_at_least(ArmVariants::ARMV7) {
                    return Err(EmulationError::Unpredictable("pop of sp"));
                }
                registers
            }
            Encoding::A2 => {
                let t = bits(opcode, 15, 12);
                if t == SP_REG {
                    return Err(EmulationError::Unpredictable("pop of sp"));
                }
                1 << t
            }
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        if registers == 0 {
            return Err(EmulationError::Unpredictable("pop of an empty list"));
        }

        let sp = self.read_core_reg(SP_REG)?;
        let frame = 4 * bit_count(registers);
        let mut address = sp;
        for n in 0..PC_REG {
            if !bit_is_set(registers, n) {
                continue;
            }
            if n == SP_REG {
                // loaded and then overwritten by the UNKNOWN writeback below
                address = address.wrapping_add(4);
                continue;
            }
            let context = Context::register_plus_offset(
                ContextKind::PopRegisterOffStack,
                Register::SP,
                i64::from(address.wrapping_sub(sp)),
            );
            let value = self.read_word(&context, address)?;
            self.write_core_reg(&context, n, value)?;
            address = address.wrapping_add(4);
        }
        if bit_is_set(registers, PC_REG) {
            let context = Context::register_plus_offset(
                ContextKind::PopRegisterOffStack,
                Register::SP,
                i64::from(address.wrapping_sub(sp)),
            );
            let value = self.read_word(&context, address)?;
            self.load_write_pc(&context, value)?;
        }
        if bit_is_set(registers, SP_REG) {
            self.write_unknown_register(SP_REG)
        } else {
            self.adjust_sp(sp, i64::from(frame))
        }
    }

    /// Decodes the extension register list of VPUSH/VPOP: the first
    /// register, the register count and whether the registers are singles.
    fn extension_register_list(opcode: u32, encoding: Encoding) -> EmuResult<(u32, u32, bool)> {
        let single = matches!(encoding, Encoding::T2 | Encoding::A2);
        let imm8 = bits(opcode, 7, 0);
        if single {
            let d = (bits(opcode, 15, 12) << 1) | bit(opcode, 22);
            let regs = imm8;
            if regs == 0 || d + regs > 32 {
                return Err(EmulationError::Unpredictable("bad single register list"));
            }
            Ok((d, regs, true))
        } else {
            let d = (bit(opcode, 22) << 4) | bits(opcode, 15, 12);
            let regs = imm8 / 2;
            if regs == 0 || regs > 16 || d + regs > 32 {
                return Err(EmulationError::Unpredictable("bad double register list"));
            }
            Ok((d, regs, false))
        }
    }

    pub(super) fn emulate_vpush(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        if !matches!(encoding, Encoding::T1 | Encoding::T2 | Encoding::A1 | Encoding::A2) {
            return Err(EmulationError::EncodingMismatch(encoding));
        }
        let (d, regs, single) = Self::extension_register_list(opcode, encoding)?;
        let frame = bits(opcode, 7, 0) << 2;
        let size = if single { 4 } else { 8 };

        let sp = self.read_core_reg(SP_REG)?;
        let mut address = sp.wrapping_sub(frame);
        for i in 0..regs {
            let reg = if single {
                Register::single(d + i)
            } else {
                Register::double(d + i)
            };
            let value = self.read_register(reg)?;
            let offset = i64::from(address) - i64::from(sp);
            self.write_memory(&Self::push_context(reg, offset), address, size, value)?;
            address = address.wrapping_add(size);
        }
        self.adjust_sp(sp, -i64::from(frame))
    }

    pub(super) fn emulate_vpop(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        if !matches!(encoding, Encoding::T1 | Encoding::T2 | Encoding::A1 | Encoding::A2) {
            return Err(EmulationError::EncodingMismatch(encoding));
        }
        let (d, regs, single) = Self::extension_register_list(opcode, encoding)?;
        let frame = bits(opcode, 7, 0) << 2;
        let size = if single { 4 } else { 8 };

        let sp = self.read_core_reg(SP_REG)?;
        let mut address = sp;
        for i in 0..regs {
            let reg = if single {
                Register::single(d + i)
            } else {
                Register::double(d + i)
            };
            let context = Context::register_plus_offset(
                ContextKind::PopRegisterOffStack,
                Register::SP,
                i64::from(address.wrapping_sub(sp)),
            );
            let value = self.read_memory(&context, address, size)?;
            self.write_register(&context, reg, value)?;
            address = address.wrapping_add(size);
        }
        self.adjust_sp(sp, i64::from(frame))
    }

    /// `add <Rd>, sp, #imm` (T1) and `add sp, sp, #imm` (T2).
    pub(super) fn emulate_add_sp_imm(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let (rd, imm32) = match encoding {
            Encoding::T1 => (bits(opcode, 10, 8), bits(opcode, 7, 0) << 2),
            Encoding::T2 => (SP_REG, thumb_imm_scaled(opcode)),
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        let sp = self.read_core_reg(SP_REG)?;
        let result = add_with_carry(sp, imm32, false).result;
        let kind = if rd == SP_REG {
            ContextKind::AdjustStackPointer
        } else if rd == self.frame_register() {
            ContextKind::SetFramePointer
        } else {
            ContextKind::RegisterPlusOffset
        };
        let context = Context::register_plus_offset(kind, Register::SP, i64::from(imm32));
        self.write_core_reg(&context, rd, result)
    }

    /// `sub sp, sp, #imm` (T1).
    pub(super) fn emulate_sub_sp_imm(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        if encoding != Encoding::T1 {
            return Err(EmulationError::EncodingMismatch(encoding));
        }
        let imm32 = thumb_imm_scaled(opcode);
        let sp = self.read_core_reg(SP_REG)?;
        let result = add_with_carry(sp, !imm32, true).result;
        let context =
            Context::register_plus_offset(ContextKind::AdjustStackPointer, Register::SP, -i64::from(imm32));
        self.write_core_reg(&context, SP_REG, result)
    }
}
