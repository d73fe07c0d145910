// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::ArmEmulator;
use crate::access::EmulatorAccess;
use crate::arith::{bad_reg, shift_c, ShiftSpec, ShiftType};
use crate::bits::{bit_is_set, bits};
use crate::context::{Context, ContextInfo, ContextKind, ProcessorMode, Register, PC_REG};
use crate::decoder::Encoding;
use crate::{EmuResult, EmulationError};

/// Shift applied by an immediate shift instruction with field `imm5`.
fn immediate_shift(kind: ShiftType, imm5: u32) -> ShiftSpec {
    let amount = match kind {
        ShiftType::Rrx => 1,
        ShiftType::Lsr | ShiftType::Asr if imm5 == 0 => 32,
        _ => imm5,
    };
    ShiftSpec { kind, amount }
}

impl<A: EmulatorAccess> ArmEmulator<A> {
    /// ASR, LSL, LSR, ROR and RRX by an immediate.
    pub(super) fn emulate_shift_imm(
        &mut self,
        kind: ShiftType,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let (rd, rm, imm5, setflags) = match (self.mode(), encoding) {
            (ProcessorMode::Thumb, Encoding::T1) if !bit_is_set(opcode, 31) => (
                bits(opcode, 2, 0),
                bits(opcode, 5, 3),
                bits(opcode, 10, 6),
                !self.in_it_block(),
            ),
            (ProcessorMode::Thumb, Encoding::T1 | Encoding::T2) => {
                let (rd, rm) = (bits(opcode, 11, 8), bits(opcode, 3, 0));
                if bad_reg(rd) || bad_reg(rm) {
                    return Err(EmulationError::Unpredictable("shift with sp or pc"));
                }
                let imm5 = (bits(opcode, 14, 12) << 2) | bits(opcode, 7, 6);
                (rd, rm, imm5, bit_is_set(opcode, 20))
            }
            (ProcessorMode::Arm, Encoding::A1) => {
                let (rd, setflags) = (bits(opcode, 15, 12), bit_is_set(opcode, 20));
                if rd == PC_REG && setflags {
                    return Err(EmulationError::UnsupportedEncoding {
                        opcode,
                        mode: ProcessorMode::Arm,
                    });
                }
                (rd, bits(opcode, 3, 0), bits(opcode, 11, 7), setflags)
            }
            (_, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        let shift = immediate_shift(kind, imm5);
        let value = self.read_core_reg(rm)?;
        let (result, carry) = shift_c(value, shift.kind, shift.amount, self.carry_flag());
        let context = Context::new(
            ContextKind::DataProcessing,
            ContextInfo::Register {
                reg: Register::core(rm),
            },
        );
        self.write_core_reg_optional_flags(&context, result, rd, setflags, Some(carry), None)
    }

    /// ASR, LSL, LSR and ROR by the bottom byte of a register.
    pub(super) fn emulate_shift_reg(
        &mut self,
        kind: ShiftType,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let (rd, rn, rm, setflags) = match (self.mode(), encoding) {
            (ProcessorMode::Thumb, Encoding::T1) => {
                let rdn = bits(opcode, 2, 0);
                (rdn, rdn, bits(opcode, 5, 3), !self.in_it_block())
            }
            (ProcessorMode::Thumb, Encoding::T2) => {
                let (rd, rn, rm) = (bits(opcode, 11, 8), bits(opcode, 19, 16), bits(opcode, 3, 0));
                if bad_reg(rd) || bad_reg(rn) || bad_reg(rm) {
                    return Err(EmulationError::Unpredictable("shift with sp or pc"));
                }
                (rd, rn, rm, bit_is_set(opcode, 20))
            }
            (ProcessorMode::Arm, Encoding::A1) => {
                let (rd, rm, rn) = (bits(opcode, 15, 12), bits(opcode, 11, 8), bits(opcode, 3, 0));
                if rd == PC_REG || rn == PC_REG || rm == PC_REG {
                    return Err(EmulationError::Unpredictable("register shift with pc"));
                }
                (rd, rn, rm, bit_is_set(opcode, 20))
            }
            (_, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        let value = self.read_core_reg(rn)?;
        let amount = bits(self.read_core_reg(rm)?, 7, 0);
        let (result, carry) = shift_c(value, kind, amount, self.carry_flag());
        let context = Context::new(
            ContextKind::DataProcessing,
            ContextInfo::Operands {
                op1: Register::core(rn),
                op2: Register::core(rm),
            },
        );
        self.write_core_reg_optional_flags(&context, result, rd, setflags, Some(carry), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_shift_amounts() {
        assert_eq!(immediate_shift(ShiftType::Lsr, 0).amount, 32);
        assert_eq!(immediate_shift(ShiftType::Asr, 0).amount, 32);
        assert_eq!(immediate_shift(ShiftType::Lsl, 3).amount, 3);
        assert_eq!(immediate_shift(ShiftType::Rrx, 0).amount, 1);
        assert_eq!(immediate_shift(ShiftType::Ror, 8).amount, 8);
    }
}
