// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! LDR, LDRB, STR and STRB with immediate, literal and register offsets.

use super::ArmEmulator;
use crate::access::EmulatorAccess;
use crate::arith::{bad_reg, decode_imm_shift, shift, ShiftSpec};
use crate::bits::{align, bit_is_set, bits, rotate_right};
use crate::context::{Context, ContextInfo, ContextKind, ProcessorMode, Register, PC_REG, SP_REG};
use crate::decoder::{Encoding, MemSize};
use crate::{EmuResult, EmulationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Offset {
    Imm(u32),
    Reg { rm: u32, shift: ShiftSpec },
}

/// Operands of one single-register transfer.
#[derive(Debug, Clone, Copy)]
struct Transfer {
    rt: u32,
    rn: u32,
    offset: Offset,
    index: bool,
    add: bool,
    wback: bool,
}

impl Transfer {
    /// `[<Rn>, #+offset]` without writeback.
    fn offset(rt: u32, rn: u32, offset: Offset) -> Self {
        Transfer {
            rt,
            rn,
            offset,
            index: true,
            add: true,
            wback: false,
        }
    }

    /// P, U and W of the 32-bit Thumb `#+/-imm8` forms.
    fn thumb_imm8(opcode: u32) -> Self {
        Transfer {
            rt: bits(opcode, 15, 12),
            rn: bits(opcode, 19, 16),
            offset: Offset::Imm(bits(opcode, 7, 0)),
            index: bit_is_set(opcode, 10),
            add: bit_is_set(opcode, 9),
            wback: bit_is_set(opcode, 8),
        }
    }

    /// P, U and W of the A32 forms. Post-indexed always writes back.
    fn arm(opcode: u32, offset: Offset) -> Self {
        let index = bit_is_set(opcode, 24);
        Transfer {
            rt: bits(opcode, 15, 12),
            rn: bits(opcode, 19, 16),
            offset,
            index,
            add: bit_is_set(opcode, 23),
            wback: !index || bit_is_set(opcode, 21),
        }
    }

    fn arm_register_offset(opcode: u32) -> Self {
        let shift = decode_imm_shift(bits(opcode, 6, 5), bits(opcode, 11, 7));
        Transfer::arm(
            opcode,
            Offset::Reg {
                rm: bits(opcode, 3, 0),
                shift,
            },
        )
    }
}

impl<A: EmulatorAccess> ArmEmulator<A> {
    /// Checks shared by the A32 forms: LDRT/STRT are not modeled and
    /// writeback may not target PC or the transfer register.
    fn check_arm_transfer(&self, opcode: u32, t: &Transfer) -> EmuResult<()> {
        if !bit_is_set(opcode, 24) && bit_is_set(opcode, 21) {
            return Err(self.unsupported(opcode));
        }
        if t.wback && (t.rn == PC_REG || t.rn == t.rt) {
            return Err(EmulationError::Unpredictable("writeback to pc or the transfer register"));
        }
        if let Offset::Reg { rm, .. } = t.offset {
            if rm == PC_REG {
                return Err(EmulationError::Unpredictable("pc as offset register"));
            }
        }
        Ok(())
    }

    /// Checks shared by the 32-bit Thumb `#+/-imm8` forms.
    fn check_thumb_imm8(&self, opcode: u32, t: &Transfer) -> EmuResult<()> {
        // unprivileged LDRT/STRT, and the undefined P == W == 0
        if (t.index && t.add && !t.wback) || (!t.index && !t.wback) {
            return Err(self.unsupported(opcode));
        }
        if t.wback && t.rn == t.rt {
            return Err(EmulationError::Unpredictable("writeback to the transfer register"));
        }
        Ok(())
    }

    /// Destination rules of the loads.
    fn check_load_target(&self, opcode: u32, size: MemSize, t: &Transfer) -> EmuResult<()> {
        match size {
            MemSize::Word if t.rt == PC_REG => self.check_it_tail(),
            MemSize::Byte if t.rt == PC_REG && self.is_thumb() => Err(self.unsupported(opcode)),
            MemSize::Byte if t.rt == PC_REG || (t.rt == SP_REG && self.is_thumb()) => {
                Err(EmulationError::Unpredictable("ldrb to sp or pc"))
            }
            _ => Ok(()),
        }
    }

    fn offset_value(&mut self, offset: Offset) -> EmuResult<u32> {
        match offset {
            Offset::Imm(imm32) => Ok(imm32),
            Offset::Reg { rm, shift: spec } => {
                let value = self.read_core_reg(rm)?;
                Ok(shift(value, spec.kind, spec.amount, self.carry_flag()))
            }
        }
    }

    /// Base, transfer address and updated base of `t`.
    fn transfer_addresses(&mut self, t: &Transfer) -> EmuResult<(u32, u32, u32)> {
        let base = if t.rn == PC_REG {
            align(self.read_core_reg(PC_REG)?, 4)
        } else {
            self.read_core_reg(t.rn)?
        };
        let offset = self.offset_value(t.offset)?;
        let offset_addr = if t.add {
            base.wrapping_add(offset)
        } else {
            base.wrapping_sub(offset)
        };
        let address = if t.index { offset_addr } else { base };
        Ok((base, address, offset_addr))
    }

    fn execute_load(&mut self, size: MemSize, t: Transfer) -> EmuResult<()> {
        let (base, address, offset_addr) = self.transfer_addresses(&t)?;
        if t.rt == PC_REG && address & 3 != 0 {
            return Err(EmulationError::Unpredictable("unaligned load to pc"));
        }

        let kind = if t.rn == SP_REG {
            ContextKind::PopRegisterOffStack
        } else {
            ContextKind::RegisterLoad
        };
        let info = match t.offset {
            Offset::Imm(_) => ContextInfo::RegisterPlusOffset {
                reg: Register::core(t.rn),
                offset: i64::from(address.wrapping_sub(base) as i32),
            },
            Offset::Reg { rm, .. } => ContextInfo::RegisterPlusIndirectOffset {
                base: Register::core(t.rn),
                offset_reg: Register::core(rm),
            },
        };
        let context = Context::new(kind, info);
        let data = self.read_memory(&context, address, size.bytes())? as u32;

        if t.wback {
            let delta = i64::from(offset_addr.wrapping_sub(base) as i32);
            self.write_base_register(t.rn, offset_addr, delta)?;
        }

        match size {
            MemSize::Byte => self.write_core_reg(&context, t.rt, data),
            MemSize::Word if t.rt == PC_REG => self.load_write_pc(&context, data),
            MemSize::Word if self.unaligned_support() || address & 3 == 0 => {
                self.write_core_reg(&context, t.rt, data)
            }
            MemSize::Word if self.mode() == ProcessorMode::Arm => {
                let rotated = rotate_right(data, 8 * (address & 3));
                self.write_core_reg(&context, t.rt, rotated)
            }
            MemSize::Word => self.write_unknown_register(t.rt),
        }
    }

    fn execute_store(&mut self, size: MemSize, t: Transfer) -> EmuResult<()> {
        let (base, address, offset_addr) = self.transfer_addresses(&t)?;
        // PCStoreValue() for rt == pc
        let value = self.read_core_reg(t.rt)?;

        let kind = if t.rn == SP_REG {
            ContextKind::PushRegisterOnStack
        } else {
            ContextKind::RegisterStore
        };
        let info = match t.offset {
            Offset::Imm(_) => ContextInfo::RegisterToRegisterPlusOffset {
                data_reg: Register::core(t.rt),
                base: Register::core(t.rn),
                offset: i64::from(address.wrapping_sub(base) as i32),
            },
            Offset::Reg { rm, .. } => ContextInfo::RegisterToRegisterPlusIndirectOffset {
                data_reg: Register::core(t.rt),
                base: Register::core(t.rn),
                offset_reg: Register::core(rm),
            },
        };
        let context = Context::new(kind, info);

        match size {
            MemSize::Byte => self.write_memory(&context, address, 1, u64::from(value & 0xff))?,
            MemSize::Word if self.unaligned_support() || address & 3 == 0 => {
                self.write_word(&context, address, value)?
            }
            MemSize::Word => self.write_unknown_memory(address)?,
        }

        if t.wback {
            let delta = i64::from(offset_addr.wrapping_sub(base) as i32);
            self.write_base_register(t.rn, offset_addr, delta)?;
        }
        Ok(())
    }

    pub(super) fn emulate_load_imm(
        &mut self,
        size: MemSize,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let t = match (self.mode(), size, encoding) {
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T1) => Transfer::offset(
                bits(opcode, 2, 0),
                bits(opcode, 5, 3),
                Offset::Imm(bits(opcode, 10, 6) << 2),
            ),
            (ProcessorMode::Thumb, MemSize::Byte, Encoding::T1) => Transfer::offset(
                bits(opcode, 2, 0),
                bits(opcode, 5, 3),
                Offset::Imm(bits(opcode, 10, 6)),
            ),
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T2) => Transfer::offset(
                bits(opcode, 10, 8),
                SP_REG,
                Offset::Imm(bits(opcode, 7, 0) << 2),
            ),
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T3)
            | (ProcessorMode::Thumb, MemSize::Byte, Encoding::T2) => Transfer::offset(
                bits(opcode, 15, 12),
                bits(opcode, 19, 16),
                Offset::Imm(bits(opcode, 11, 0)),
            ),
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T4)
            | (ProcessorMode::Thumb, MemSize::Byte, Encoding::T3) => {
                let t = Transfer::thumb_imm8(opcode);
                self.check_thumb_imm8(opcode, &t)?;
                t
            }
            (ProcessorMode::Arm, _, Encoding::A1) => {
                let t = Transfer::arm(opcode, Offset::Imm(bits(opcode, 11, 0)));
                self.check_arm_transfer(opcode, &t)?;
                t
            }
            (_, _, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        self.check_load_target(opcode, size, &t)?;
        self.execute_load(size, t)
    }

    /// PC-relative loads: the base is the word-aligned PC.
    pub(super) fn emulate_load_literal(
        &mut self,
        size: MemSize,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let t = match (self.mode(), size, encoding) {
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T1) if !bit_is_set(opcode, 31) => {
                Transfer::offset(bits(opcode, 10, 8), PC_REG, Offset::Imm(bits(opcode, 7, 0) << 2))
            }
            (ProcessorMode::Thumb, _, Encoding::T1 | Encoding::T2) | (ProcessorMode::Arm, _, Encoding::A1) => {
                Transfer {
                    add: bit_is_set(opcode, 23),
                    ..Transfer::offset(bits(opcode, 15, 12), PC_REG, Offset::Imm(bits(opcode, 11, 0)))
                }
            }
            (_, _, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        self.check_load_target(opcode, size, &t)?;
        self.execute_load(size, t)
    }

    pub(super) fn emulate_load_reg(
        &mut self,
        size: MemSize,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let t = match (self.mode(), encoding) {
            (ProcessorMode::Thumb, Encoding::T1) => Transfer::offset(
                bits(opcode, 2, 0),
                bits(opcode, 5, 3),
                Offset::Reg {
                    rm: bits(opcode, 8, 6),
                    shift: ShiftSpec::NONE,
                },
            ),
            (ProcessorMode::Thumb, Encoding::T2) => {
                let rm = bits(opcode, 3, 0);
                if bad_reg(rm) {
                    return Err(EmulationError::Unpredictable("sp or pc as offset register"));
                }
                Transfer::offset(
                    bits(opcode, 15, 12),
                    bits(opcode, 19, 16),
                    Offset::Reg {
                        rm,
                        shift: ShiftSpec::lsl(bits(opcode, 5, 4)),
                    },
                )
            }
            (ProcessorMode::Arm, Encoding::A1) => {
                let t = Transfer::arm_register_offset(opcode);
                self.check_arm_transfer(opcode, &t)?;
                t
            }
            (_, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        self.check_load_target(opcode, size, &t)?;
        self.execute_load(size, t)
    }

    pub(super) fn emulate_store_imm(
        &mut self,
        size: MemSize,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let t = match (self.mode(), size, encoding) {
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T1) => Transfer::offset(
                bits(opcode, 2, 0),
                bits(opcode, 5, 3),
                Offset::Imm(bits(opcode, 10, 6) << 2),
            ),
            (ProcessorMode::Thumb, MemSize::Byte, Encoding::T1) => Transfer::offset(
                bits(opcode, 2, 0),
                bits(opcode, 5, 3),
                Offset::Imm(bits(opcode, 10, 6)),
            ),
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T2) => Transfer::offset(
                bits(opcode, 10, 8),
                SP_REG,
                Offset::Imm(bits(opcode, 7, 0) << 2),
            ),
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T3)
            | (ProcessorMode::Thumb, MemSize::Byte, Encoding::T2) => {
                let t = Transfer::offset(
                    bits(opcode, 15, 12),
                    bits(opcode, 19, 16),
                    Offset::Imm(bits(opcode, 11, 0)),
                );
                if t.rn == PC_REG {
                    return Err(self.unsupported(opcode));
                }
                t
            }
            (ProcessorMode::Thumb, MemSize::Word, Encoding::T4)
            | (ProcessorMode::Thumb, MemSize::Byte, Encoding::T3) => {
                let t = Transfer::thumb_imm8(opcode);
                if t.rn == PC_REG {
                    return Err(self.unsupported(opcode));
                }
                self.check_thumb_imm8(opcode, &t)?;
                t
            }
            (ProcessorMode::Arm, _, Encoding::A1) => {
                let t = Transfer::arm(opcode, Offset::Imm(bits(opcode, 11, 0)));
                self.check_arm_transfer(opcode, &t)?;
                t
            }
            (_, _, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        self.check_store_source(size, &t)?;
        self.execute_store(size, t)
    }

    pub(super) fn emulate_store_reg(
        &mut self,
        size: MemSize,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let t = match (self.mode(), encoding) {
            (ProcessorMode::Thumb, Encoding::T1) => Transfer::offset(
                bits(opcode, 2, 0),
                bits(opcode, 5, 3),
                Offset::Reg {
                    rm: bits(opcode, 8, 6),
                    shift: ShiftSpec::NONE,
                },
            ),
            (ProcessorMode::Thumb, Encoding::T2) => {
                let (rn, rm) = (bits(opcode, 19, 16), bits(opcode, 3, 0));
                if rn == PC_REG {
                    return Err(self.unsupported(opcode));
                }
                if bad_reg(rm) {
                    return Err(EmulationError::Unpredictable("sp or pc as offset register"));
                }
                Transfer::offset(
                    bits(opcode, 15, 12),
                    rn,
                    Offset::Reg {
                        rm,
                        shift: ShiftSpec::lsl(bits(opcode, 5, 4)),
                    },
                )
            }
            (ProcessorMode::Arm, Encoding::A1) => {
                let t = Transfer::arm_register_offset(opcode);
                self.check_arm_transfer(opcode, &t)?;
                t
            }
            (_, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        self.check_store_source(size, &t)?;
        self.execute_store(size, t)
    }

    /// Source rules of the stores. Narrow Thumb forms only name r0-r7.
    fn check_store_source(&self, size: MemSize, t: &Transfer) -> EmuResult<()> {
        let bad = match (self.mode(), size) {
            (ProcessorMode::Thumb, MemSize::Word) => t.rt == PC_REG,
            (ProcessorMode::Thumb, MemSize::Byte) => bad_reg(t.rt),
            (_, MemSize::Byte) => t.rt == PC_REG,
            _ => false,
        };
        if bad {
            return Err(EmulationError::Unpredictable("store of sp or pc"));
        }
        Ok(())
    }
}
