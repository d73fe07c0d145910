// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! B, BL, BLX, BX, CBZ/CBNZ and TBB/TBH.

use super::ArmEmulator;
use crate::access::EmulatorAccess;
use crate::arith::bad_reg;
use crate::bits::{align, bit, bit_is_set, bits, sign_extend};
use crate::context::{Context, ContextInfo, ContextKind, ProcessorMode, Register, PC_REG, SP_REG};
use crate::decoder::Encoding;
use crate::{EmuResult, EmulationError};

/// `S:I1:I2:imm10:imm11:'0'` of the 32-bit Thumb branch forms, with
/// `I1 = NOT(J1 XOR S)` and `I2 = NOT(J2 XOR S)`.
fn thumb_branch_offset(opcode: u32) -> i32 {
    let s = bit(opcode, 26);
    let i1 = !(bit(opcode, 13) ^ s) & 1;
    let i2 = !(bit(opcode, 11) ^ s) & 1;
    let imm = (s << 24) | (i1 << 23) | (i2 << 22) | (bits(opcode, 25, 16) << 12) | (bits(opcode, 10, 0) << 1);
    sign_extend(imm, 25) as i32
}

/// Offset of BLX (immediate) T2: `S:I1:I2:imm10H:imm10L:'00'`.
fn thumb_blx_offset(opcode: u32) -> i32 {
    let s = bit(opcode, 26);
    let i1 = !(bit(opcode, 13) ^ s) & 1;
    let i2 = !(bit(opcode, 11) ^ s) & 1;
    let imm = (s << 24) | (i1 << 23) | (i2 << 22) | (bits(opcode, 25, 16) << 12) | (bits(opcode, 10, 1) << 2);
    sign_extend(imm, 25) as i32
}

impl<A: EmulatorAccess> ArmEmulator<A> {
    /// Return address for a branch with link: the next instruction, with
    /// bit 0 set when returning to Thumb code.
    fn link_address(&self, pc: u32, size: u32) -> u32 {
        if self.is_thumb() {
            // pc is the fetch address + 4
            pc.wrapping_sub(4).wrapping_add(size) | 1
        } else {
            pc.wrapping_sub(4)
        }
    }

    pub(super) fn emulate_b(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let offset = match encoding {
            Encoding::T1 => {
                // cond 1110 is UDF and 1111 is SVC
                if bits(opcode, 11, 8) >= 0xe {
                    return Err(EmulationError::UnsupportedEncoding {
                        opcode,
                        mode: ProcessorMode::Thumb,
                    });
                }
                if self.in_it_block() {
                    return Err(EmulationError::Unpredictable("conditional branch inside an IT block"));
                }
                sign_extend(bits(opcode, 7, 0) << 1, 9) as i32
            }
            Encoding::T2 => {
                self.check_it_tail()?;
                sign_extend(bits(opcode, 10, 0) << 1, 12) as i32
            }
            Encoding::T3 => {
                // cond 111x encodes other instructions in this space
                if bits(opcode, 25, 22) >= 0xe {
                    return Err(EmulationError::UnsupportedEncoding {
                        opcode,
                        mode: ProcessorMode::Thumb,
                    });
                }
                if self.in_it_block() {
                    return Err(EmulationError::Unpredictable("conditional branch inside an IT block"));
                }
                let imm = (bit(opcode, 26) << 20)
                    | (bit(opcode, 11) << 19)
                    | (bit(opcode, 13) << 18)
                    | (bits(opcode, 21, 16) << 12)
                    | (bits(opcode, 10, 0) << 1);
                sign_extend(imm, 21) as i32
            }
            Encoding::T4 => {
                self.check_it_tail()?;
                thumb_branch_offset(opcode)
            }
            Encoding::A1 => sign_extend(bits(opcode, 23, 0) << 2, 26) as i32,
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        let pc = self.read_core_reg(PC_REG)?;
        let target = pc.wrapping_add_signed(offset);
        let context = Context::new(
            ContextKind::RelativeBranchImmediate,
            ContextInfo::IsaAndImmediateSigned {
                mode: self.mode(),
                value: offset,
            },
        );
        self.branch_write_pc(&context, target)
    }

    /// BL and BLX (immediate).
    pub(super) fn emulate_branch_link(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let pc = self.read_core_reg(PC_REG)?;
        let (offset, target_mode, base) = match encoding {
            Encoding::T1 => {
                self.check_it_tail()?;
                (thumb_branch_offset(opcode), ProcessorMode::Thumb, pc)
            }
            Encoding::T2 => {
                self.check_it_tail()?;
                (thumb_blx_offset(opcode), ProcessorMode::Arm, align(pc, 4))
            }
            Encoding::A1 => (
                sign_extend(bits(opcode, 23, 0) << 2, 26) as i32,
                ProcessorMode::Arm,
                pc,
            ),
            Encoding::A2 => {
                let imm = (bits(opcode, 23, 0) << 2) | (bit(opcode, 24) << 1);
                (sign_extend(imm, 26) as i32, ProcessorMode::Thumb, pc)
            }
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        let target = base.wrapping_add_signed(offset);
        let context = Context::new(
            ContextKind::RelativeBranchImmediate,
            ContextInfo::IsaAndImmediateSigned {
                mode: target_mode,
                value: offset,
            },
        );
        let lr = self.link_address(pc, 4);
        self.write_register(&context, Register::RA, u64::from(lr))?;

        if target_mode == self.mode() {
            self.branch_write_pc(&context, target)
        } else {
            // BLX <label> always changes instruction set
            let interworking = match target_mode {
                ProcessorMode::Thumb => target | 1,
                _ => target & !3,
            };
            self.bx_write_pc(&context, interworking)
        }
    }

    /// BLX (register).
    pub(super) fn emulate_blx_reg(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let (rm, size) = match encoding {
            Encoding::T1 => {
                self.check_it_tail()?;
                (bits(opcode, 6, 3), 2)
            }
            Encoding::A1 => (bits(opcode, 3, 0), 4),
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        if rm == PC_REG {
            return Err(EmulationError::Unpredictable("blx pc"));
        }
        let pc = self.read_core_reg(PC_REG)?;
        let target = self.read_core_reg(rm)?;
        let context = Context::new(
            ContextKind::AbsoluteBranchRegister,
            ContextInfo::Register {
                reg: Register::core(rm),
            },
        );
        let lr = self.link_address(pc, size);
        self.write_register(&context, Register::RA, u64::from(lr))?;
        self.bx_write_pc(&context, target)
    }

    pub(super) fn emulate_bx(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let rm = match encoding {
            Encoding::T1 => {
                self.check_it_tail()?;
                bits(opcode, 6, 3)
            }
            Encoding::A1 => bits(opcode, 3, 0),
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        let target = self.read_core_reg(rm)?;
        let context = Context::new(
            ContextKind::AbsoluteBranchRegister,
            ContextInfo::Register {
                reg: Register::core(rm),
            },
        );
        self.bx_write_pc(&context, target)
    }

    /// CBZ and CBNZ.
    pub(super) fn emulate_cbz(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        if encoding != Encoding::T1 {
            return Err(EmulationError::EncodingMismatch(encoding));
        }
        if self.in_it_block() {
            return Err(EmulationError::Unpredictable("cbz inside an IT block"));
        }
        let nonzero = bit_is_set(opcode, 11);
        let rn = bits(opcode, 2, 0);
        let imm32 = (bit(opcode, 9) << 6) | (bits(opcode, 7, 3) << 1);

        let value = self.read_core_reg(rn)?;
        if nonzero == (value == 0) {
            return Ok(());
        }
        let pc = self.read_core_reg(PC_REG)?;
        let context = Context::new(
            ContextKind::RelativeBranchImmediate,
            ContextInfo::IsaAndImmediate {
                mode: ProcessorMode::Thumb,
                value: imm32,
            },
        );
        self.branch_write_pc(&context, pc.wrapping_add(imm32))
    }

    /// TBB and TBH: a forward branch by twice a byte or halfword table entry.
    pub(super) fn emulate_table_branch(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        if encoding != Encoding::T1 {
            return Err(EmulationError::EncodingMismatch(encoding));
        }
        let (rn, rm, halfword) = (bits(opcode, 19, 16), bits(opcode, 3, 0), bit_is_set(opcode, 4));
        if rn == SP_REG || bad_reg(rm) {
            return Err(EmulationError::Unpredictable("table branch with sp or pc"));
        }
        self.check_it_tail()?;

        let base = self.read_core_reg(rn)?;
        let index = self.read_core_reg(rm)?;
        let (address, size) = if halfword {
            (base.wrapping_add(index << 1), 2)
        } else {
            (base.wrapping_add(index), 1)
        };
        let read_context = Context::new(
            ContextKind::TableBranchReadMemory,
            ContextInfo::RegisterPlusIndirectOffset {
                base: Register::core(rn),
                offset_reg: Register::core(rm),
            },
        );
        let entry = self.read_memory(&read_context, address, size)? as u32;
        let offset = 2 * entry;

        let pc = self.read_core_reg(PC_REG)?;
        let context = Context::new(
            ContextKind::RelativeBranchImmediate,
            ContextInfo::Offset {
                offset: i64::from(offset),
            },
        );
        self.branch_write_pc(&context, pc.wrapping_add(offset))
    }
}
