// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! LDM and STM in their four addressing modes.

use super::ArmEmulator;
use crate::access::EmulatorAccess;
use crate::arch::ArmVariants;
use crate::bits::{bit_count, bit_is_set, bits, lowest_set_bit};
use crate::context::{Context, ContextInfo, ContextKind, ProcessorMode, Register, PC_REG, SP_REG};
use crate::decoder::{BlockMode, Encoding};
use crate::{EmuResult, EmulationError};

/// Base register, register list and writeback flag of one transfer.
#[derive(Debug, Clone, Copy)]
struct BlockTransfer {
    rn: u32,
    registers: u32,
    wback: bool,
}

impl BlockTransfer {
    fn narrow(opcode: u32) -> Self {
        let rn = bits(opcode, 10, 8);
        let registers = bits(opcode, 7, 0);
        BlockTransfer {
            rn,
            registers,
            wback: true,
        }
    }

    fn wide(opcode: u32) -> Self {
        BlockTransfer {
            rn: bits(opcode, 19, 16),
            registers: bits(opcode, 15, 0),
            wback: bit_is_set(opcode, 21),
        }
    }

    fn count(&self) -> u32 {
        bit_count(self.registers)
    }

    fn contains(&self, n: u32) -> bool {
        bit_is_set(self.registers, n)
    }

    fn delta(&self, mode: BlockMode) -> i64 {
        let size = 4 * i64::from(self.count());
        if mode.is_increment() {
            size
        } else {
            -size
        }
    }
}

impl<A: EmulatorAccess> ArmEmulator<A> {
    fn load_multiple_operands(&self, opcode: u32, encoding: Encoding) -> EmuResult<BlockTransfer> {
        match (self.mode(), encoding) {
            (ProcessorMode::Thumb, Encoding::T1) if !bit_is_set(opcode, 31) => {
                // writeback unless the base is also loaded
                let mut t = BlockTransfer::narrow(opcode);
                t.wback = !t.contains(t.rn);
                if t.count() < 1 {
                    return Err(EmulationError::Unpredictable("ldm of an empty list"));
                }
                Ok(t)
            }
            (ProcessorMode::Thumb, Encoding::T1 | Encoding::T2) => {
                let t = BlockTransfer::wide(opcode);
                if t.contains(SP_REG) || t.rn == PC_REG || t.count() < 2 {
                    return Err(EmulationError::Unpredictable("ldm.w register list"));
                }
                if t.contains(PC_REG) && t.contains(14) {
                    return Err(EmulationError::Unpredictable("ldm.w of both lr and pc"));
                }
                if t.contains(PC_REG) {
                    self.check_it_tail()?;
                }
                if t.wback && t.contains(t.rn) {
                    return Err(EmulationError::Unpredictable("ldm.w writeback to a loaded base"));
                }
                Ok(t)
            }
            (ProcessorMode::Arm, Encoding::A1) => {
                let t = BlockTransfer::wide(opcode);
                if t.rn == PC_REG || t.count() < 1 {
                    return Err(EmulationError::Unpredictable("ldm base or register list"));
                }
                if t.wback && t.contains(t.rn) && self.arch_at_least(ArmVariants::ARMV7) {
                    return Err(EmulationError::Unpredictable("ldm writeback to a loaded base"));
                }
                Ok(t)
            }
            (_, other) => Err(EmulationError::EncodingMismatch(other)),
        }
    }

    fn store_multiple_operands(&self, opcode: u32, encoding: Encoding) -> EmuResult<BlockTransfer> {
        match (self.mode(), encoding) {
            (ProcessorMode::Thumb, Encoding::T1) if !bit_is_set(opcode, 31) => {
                let t = BlockTransfer::narrow(opcode);
                if t.count() < 1 {
                    return Err(EmulationError::Unpredictable("stm of an empty list"));
                }
                Ok(t)
            }
            (ProcessorMode::Thumb, Encoding::T1 | Encoding::T2) => {
                let t = BlockTransfer::wide(opcode);
                if t.contains(PC_REG) || t.contains(SP_REG) || t.rn == PC_REG || t.count() < 2 {
                    return Err(EmulationError::Unpredictable("stm.w register list"));
                }
                if t.wback && t.contains(t.rn) {
                    return Err(EmulationError::Unpredictable("stm.w writeback with a stored base"));
                }
                Ok(t)
            }
            (ProcessorMode::Arm, Encoding::A1) => {
                let t = BlockTransfer::wide(opcode);
                if t.rn == PC_REG || t.count() < 1 {
                    return Err(EmulationError::Unpredictable("stm base or register list"));
                }
                Ok(t)
            }
            (_, other) => Err(EmulationError::EncodingMismatch(other)),
        }
    }

    pub(super) fn emulate_ldm(&mut self, mode: BlockMode, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let t = self.load_multiple_operands(opcode, encoding)?;
        let base = self.read_core_reg(t.rn)?;
        let kind = if t.rn == SP_REG {
            ContextKind::PopRegisterOffStack
        } else {
            ContextKind::RegisterLoad
        };

        let mut address = mode.start_address(base, t.count());
        for n in 0..PC_REG {
            if !t.contains(n) {
                continue;
            }
            let context = Context::register_plus_offset(
                kind,
                Register::core(t.rn),
                i64::from(address.wrapping_sub(base) as i32),
            );
            let value = self.read_word(&context, address)?;
            self.write_core_reg(&context, n, value)?;
            address = address.wrapping_add(4);
        }
        if t.contains(PC_REG) {
            let context = Context::register_plus_offset(
                kind,
                Register::core(t.rn),
                i64::from(address.wrapping_sub(base) as i32),
            );
            let value = self.read_word(&context, address)?;
            self.load_write_pc(&context, value)?;
        }

        if t.wback {
            if t.contains(t.rn) {
                self.write_unknown_register(t.rn)?;
            } else {
                let delta = t.delta(mode);
                let value = (i64::from(base) + delta) as u32;
                self.write_base_register(t.rn, value, delta)?;
            }
        }
        Ok(())
    }

    pub(super) fn emulate_stm(&mut self, mode: BlockMode, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let t = self.store_multiple_operands(opcode, encoding)?;
        let base = self.read_core_reg(t.rn)?;
        let kind = if t.rn == SP_REG {
            ContextKind::PushRegisterOnStack
        } else {
            ContextKind::RegisterStore
        };
        let lowest = lowest_set_bit(t.registers);

        let mut address = mode.start_address(base, t.count());
        for n in 0..=PC_REG {
            if !t.contains(n) {
                continue;
            }
            if n == t.rn && t.wback && n != lowest {
                self.write_unknown_memory(address)?;
            } else {
                // PC stores the biased value, PCStoreValue()
                let value = self.read_core_reg(n)?;
                let context = Context::new(
                    kind,
                    ContextInfo::RegisterToRegisterPlusOffset {
                        data_reg: Register::core(n),
                        base: Register::core(t.rn),
                        offset: i64::from(address.wrapping_sub(base) as i32),
                    },
                );
                self.write_word(&context, address, value)?;
            }
            address = address.wrapping_add(4);
        }

        if t.wback {
            let delta = t.delta(mode);
            let value = (i64::from(base) + delta) as u32;
            self.write_base_register(t.rn, value, delta)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow_fields() {
        // ldm r1!, {r0, r2}
        let t = BlockTransfer::narrow(0xc905);
        assert_eq!(t.rn, 1);
        assert_eq!(t.registers, 0b101);
        assert_eq!(t.count(), 2);
    }

    #[test]
    fn test_wide_fields_and_delta() {
        // stmdb sp!, {r4-r7, lr}
        let t = BlockTransfer::wide(0xe92d_40f0);
        assert_eq!(t.rn, SP_REG);
        assert!(t.wback);
        assert_eq!(t.count(), 5);
        assert_eq!(t.delta(BlockMode::DecrementBefore), -20);
        assert_eq!(t.delta(BlockMode::IncrementAfter), 20);
    }
}
