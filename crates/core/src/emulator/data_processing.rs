// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Data-processing instructions: the ALU operations with an immediate or a
//! shifted register operand, MOV (register) and ADR.

use super::ArmEmulator;
use crate::access::EmulatorAccess;
use crate::arith::{
    add_with_carry, arm_expand_imm, arm_expand_imm_c, bad_reg, decode_imm_shift, shift_c,
    thumb_expand_imm_c, thumb_imm12, ShiftSpec,
};
use crate::bits::{align, bit, bit_is_set, bits};
use crate::context::{Context, ContextInfo, ContextKind, ProcessorMode, Register, PC_REG, SP_REG};
use crate::decoder::{AluOp, Encoding};
use crate::{EmuResult, EmulationError};

/// Decoded operand fields of one data-processing instruction.
#[derive(Debug, Clone, Copy)]
struct AluFields {
    rd: u32,
    rn: u32,
    setflags: bool,
}

/// Result of one ALU operation, before it is written back.
#[derive(Debug, Clone, Copy)]
struct AluOutput {
    result: u32,
    carry: Option<bool>,
    overflow: Option<bool>,
}

fn compute(op: AluOp, rn: u32, operand: u32, shifter_carry: bool, carry_in: bool) -> AluOutput {
    let logical = |result| AluOutput {
        result,
        carry: Some(shifter_carry),
        overflow: None,
    };
    let arith = |x, y, c| {
        let sum = add_with_carry(x, y, c);
        AluOutput {
            result: sum.result,
            carry: Some(sum.carry_out),
            overflow: Some(sum.overflow),
        }
    };
    match op {
        AluOp::And | AluOp::Tst => logical(rn & operand),
        AluOp::Eor | AluOp::Teq => logical(rn ^ operand),
        AluOp::Orr => logical(rn | operand),
        AluOp::Bic => logical(rn & !operand),
        AluOp::Mov => logical(operand),
        AluOp::Mvn => logical(!operand),
        AluOp::Add | AluOp::Cmn => arith(rn, operand, false),
        AluOp::Adc => arith(rn, operand, carry_in),
        AluOp::Sub | AluOp::Cmp => arith(rn, !operand, true),
        AluOp::Sbc => arith(rn, !operand, carry_in),
        AluOp::Rsb => arith(!rn, operand, true),
        AluOp::Rsc => arith(!rn, operand, carry_in),
    }
}

/// Operand rules of the 32-bit Thumb data-processing forms.
fn check_thumb_wide(op: AluOp, fields: &AluFields, rm: Option<u32>) -> EmuResult<()> {
    let AluFields { rd, rn, .. } = *fields;
    if rm.is_some_and(bad_reg) {
        return Err(EmulationError::Unpredictable("sp or pc as shifted register"));
    }
    let bad = match op {
        AluOp::Tst | AluOp::Teq => bad_reg(rn),
        AluOp::Cmp | AluOp::Cmn => rn == PC_REG,
        AluOp::Mov | AluOp::Mvn => bad_reg(rd),
        // SP-relative arithmetic may write SP
        AluOp::Add | AluOp::Sub => rd == PC_REG || rn == PC_REG || (rd == SP_REG && rn != SP_REG),
        _ => bad_reg(rd) || bad_reg(rn),
    };
    if bad {
        return Err(EmulationError::Unpredictable("sp or pc operand"));
    }
    Ok(())
}

impl<A: EmulatorAccess> ArmEmulator<A> {
    /// Context for the result of a data-processing instruction whose first
    /// source register is `source`. Compares have no destination.
    fn result_context(&self, rd: Option<u32>, source: Option<u32>, info: ContextInfo) -> Context {
        let kind = if rd == Some(SP_REG) {
            ContextKind::AdjustStackPointer
        } else if source == Some(SP_REG) && rd == Some(self.frame_register()) {
            ContextKind::SetFramePointer
        } else {
            match info {
                ContextInfo::RegisterPlusOffset { .. } => ContextKind::RegisterPlusOffset,
                ContextInfo::Operands { .. } | ContextInfo::Register { .. } => {
                    ContextKind::DataProcessing
                }
                _ => ContextKind::Immediate,
            }
        };
        Context::new(kind, info)
    }

    /// Writes back an ALU result, or only the flags for a compare.
    fn retire_alu(
        &mut self,
        op: AluOp,
        fields: AluFields,
        output: AluOutput,
        context: &Context,
    ) -> EmuResult<()> {
        if op.is_compare() {
            return self.write_flags(context, output.result, output.carry, output.overflow);
        }
        self.write_core_reg_optional_flags(
            context,
            output.result,
            fields.rd,
            fields.setflags,
            output.carry,
            output.overflow,
        )
    }

    pub(super) fn emulate_alu_imm(
        &mut self,
        op: AluOp,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let carry_in = self.carry_flag();
        let (fields, imm32, carry) = match (self.mode(), encoding) {
            (ProcessorMode::Arm, Encoding::A1) => {
                let fields = AluFields {
                    rd: bits(opcode, 15, 12),
                    rn: bits(opcode, 19, 16),
                    setflags: bit_is_set(opcode, 20) || op.is_compare(),
                };
                if fields.rd == PC_REG && fields.setflags && !op.is_compare() {
                    // SUBS PC, LR and friends return from an exception
                    return Err(EmulationError::UnsupportedEncoding {
                        opcode,
                        mode: ProcessorMode::Arm,
                    });
                }
                let (imm32, carry) = arm_expand_imm_c(bits(opcode, 11, 0), carry_in);
                (fields, imm32, carry)
            }
            // movw
            (ProcessorMode::Arm, Encoding::A2) => {
                let rd = bits(opcode, 15, 12);
                if rd == PC_REG {
                    return Err(EmulationError::Unpredictable("movw to pc"));
                }
                let imm16 = (bits(opcode, 19, 16) << 12) | bits(opcode, 11, 0);
                let fields = AluFields {
                    rd,
                    rn: 0,
                    setflags: false,
                };
                (fields, imm16, carry_in)
            }
            (ProcessorMode::Thumb, _) if bit_is_set(opcode, 31) => {
                self.thumb_wide_imm_fields(op, opcode, encoding, carry_in)?
            }
            (ProcessorMode::Thumb, _) => {
                let outside_it = !self.in_it_block();
                let (rd, rn, imm32) = match (op, encoding) {
                    (AluOp::Add | AluOp::Sub, Encoding::T1) => {
                        (bits(opcode, 2, 0), bits(opcode, 5, 3), bits(opcode, 8, 6))
                    }
                    (AluOp::Add | AluOp::Sub, Encoding::T2) => {
                        let rdn = bits(opcode, 10, 8);
                        (rdn, rdn, bits(opcode, 7, 0))
                    }
                    (AluOp::Mov, Encoding::T1) => (bits(opcode, 10, 8), 0, bits(opcode, 7, 0)),
                    (AluOp::Cmp, Encoding::T1) => (0, bits(opcode, 10, 8), bits(opcode, 7, 0)),
                    // rsbs <Rd>, <Rn>, #0
                    (AluOp::Rsb, Encoding::T1) => (bits(opcode, 2, 0), bits(opcode, 5, 3), 0),
                    (_, other) => return Err(EmulationError::EncodingMismatch(other)),
                };
                let fields = AluFields {
                    rd,
                    rn,
                    setflags: outside_it,
                };
                (fields, imm32, carry_in)
            }
            (_, other) => return Err(EmulationError::EncodingMismatch(other)),
        };

        let rn_value = if op.uses_rn() {
            self.read_core_reg(fields.rn)?
        } else {
            0
        };
        let output = compute(op, rn_value, imm32, carry, carry_in);

        let info = match op {
            AluOp::Add => ContextInfo::RegisterPlusOffset {
                reg: Register::core(fields.rn),
                offset: i64::from(imm32),
            },
            AluOp::Sub => ContextInfo::RegisterPlusOffset {
                reg: Register::core(fields.rn),
                offset: -i64::from(imm32),
            },
            _ => ContextInfo::Immediate {
                value: u64::from(imm32),
            },
        };
        let source = op.uses_rn().then_some(fields.rn);
        let rd = (!op.is_compare()).then_some(fields.rd);
        let context = self.result_context(rd, source, info);
        self.retire_alu(op, fields, output, &context)
    }

    /// Fields of the 32-bit Thumb immediate forms: modified immediates,
    /// the plain 12-bit `addw`/`subw` and the 16-bit `movw`.
    fn thumb_wide_imm_fields(
        &self,
        op: AluOp,
        opcode: u32,
        encoding: Encoding,
        carry_in: bool,
    ) -> EmuResult<(AluFields, u32, bool)> {
        let mut fields = AluFields {
            rd: bits(opcode, 11, 8),
            rn: bits(opcode, 19, 16),
            setflags: bit_is_set(opcode, 20) || op.is_compare(),
        };
        let (imm32, carry) = match (op, encoding) {
            (AluOp::Add | AluOp::Sub, Encoding::T4) => {
                fields.setflags = false;
                (thumb_imm12(opcode), carry_in)
            }
            (AluOp::Mov, Encoding::T3) => {
                fields.setflags = false;
                let imm16 = (bits(opcode, 19, 16) << 12)
                    | (bit(opcode, 26) << 11)
                    | (bits(opcode, 14, 12) << 8)
                    | bits(opcode, 7, 0);
                (imm16, carry_in)
            }
            _ => thumb_expand_imm_c(opcode, carry_in),
        };
        check_thumb_wide(op, &fields, None)?;
        Ok((fields, imm32, carry))
    }

    pub(super) fn emulate_alu_reg(
        &mut self,
        op: AluOp,
        opcode: u32,
        encoding: Encoding,
    ) -> EmuResult<()> {
        let (fields, rm, shift) = match (self.mode(), encoding) {
            (ProcessorMode::Arm, Encoding::A1) => {
                let fields = AluFields {
                    rd: bits(opcode, 15, 12),
                    rn: bits(opcode, 19, 16),
                    setflags: bit_is_set(opcode, 20) || op.is_compare(),
                };
                if fields.rd == PC_REG && fields.setflags && !op.is_compare() {
                    return Err(EmulationError::UnsupportedEncoding {
                        opcode,
                        mode: ProcessorMode::Arm,
                    });
                }
                let shift = decode_imm_shift(bits(opcode, 6, 5), bits(opcode, 11, 7));
                (fields, bits(opcode, 3, 0), shift)
            }
            (ProcessorMode::Thumb, _) if bit_is_set(opcode, 31) => {
                let fields = AluFields {
                    rd: bits(opcode, 11, 8),
                    rn: bits(opcode, 19, 16),
                    setflags: bit_is_set(opcode, 20) || op.is_compare(),
                };
                let rm = bits(opcode, 3, 0);
                check_thumb_wide(op, &fields, Some(rm))?;
                let imm5 = (bits(opcode, 14, 12) << 2) | bits(opcode, 7, 6);
                (fields, rm, decode_imm_shift(bits(opcode, 5, 4), imm5))
            }
            // adds/subs <Rd>, <Rn>, <Rm>
            (ProcessorMode::Thumb, Encoding::T1) if bits(opcode, 15, 10) == 0b000110 => {
                let fields = AluFields {
                    rd: bits(opcode, 2, 0),
                    rn: bits(opcode, 5, 3),
                    setflags: !self.in_it_block(),
                };
                (fields, bits(opcode, 8, 6), ShiftSpec::NONE)
            }
            (ProcessorMode::Thumb, Encoding::T1) => {
                let rdn = bits(opcode, 2, 0);
                let fields = AluFields {
                    rd: rdn,
                    rn: rdn,
                    setflags: !self.in_it_block() || op.is_compare(),
                };
                (fields, bits(opcode, 5, 3), ShiftSpec::NONE)
            }
            // add<c> <Rdn>, <Rm> and cmp <Rn>, <Rm> with high registers
            (ProcessorMode::Thumb, Encoding::T2) => {
                let rdn = (bit(opcode, 7) << 3) | bits(opcode, 2, 0);
                let rm = bits(opcode, 6, 3);
                let fields = AluFields {
                    rd: rdn,
                    rn: rdn,
                    setflags: op.is_compare(),
                };
                match op {
                    AluOp::Add => {
                        if rdn == PC_REG && rm == PC_REG {
                            return Err(EmulationError::Unpredictable("add pc, pc"));
                        }
                        if rdn == PC_REG {
                            self.check_it_tail()?;
                        }
                    }
                    AluOp::Cmp => {
                        if rdn < 8 && rm < 8 {
                            return Err(EmulationError::Unpredictable("cmp T2 with low registers"));
                        }
                        if rdn == PC_REG || rm == PC_REG {
                            return Err(EmulationError::Unpredictable("cmp with pc"));
                        }
                    }
                    _ => return Err(EmulationError::EncodingMismatch(encoding)),
                }
                (fields, rm, ShiftSpec::NONE)
            }
            (_, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        self.finish_alu_reg(op, fields, rm, shift)
    }

    fn finish_alu_reg(
        &mut self,
        op: AluOp,
        fields: AluFields,
        rm: u32,
        shift: ShiftSpec,
    ) -> EmuResult<()> {
        let carry_in = self.carry_flag();
        let rn_value = if op.uses_rn() {
            self.read_core_reg(fields.rn)?
        } else {
            0
        };
        let rm_value = self.read_core_reg(rm)?;
        let (shifted, shifter_carry) = shift_c(rm_value, shift.kind, shift.amount, carry_in);
        let output = compute(op, rn_value, shifted, shifter_carry, carry_in);

        let (info, source) = if op.uses_rn() {
            let info = ContextInfo::Operands {
                op1: Register::core(fields.rn),
                op2: Register::core(rm),
            };
            (info, Some(fields.rn))
        } else {
            (ContextInfo::Register { reg: Register::core(rm) }, None)
        };
        let rd = (!op.is_compare()).then_some(fields.rd);
        let context = self.result_context(rd, source, info);
        self.retire_alu(op, fields, output, &context)
    }

    /// MOV (register): `mov r7, sp` is the frame setup this recognizes.
    pub(super) fn emulate_mov_reg(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let (rd, rm, setflags) = match (self.mode(), encoding) {
            (ProcessorMode::Arm, Encoding::A1) => {
                let (rd, setflags) = (bits(opcode, 15, 12), bit_is_set(opcode, 20));
                if rd == PC_REG && setflags {
                    return Err(EmulationError::UnsupportedEncoding {
                        opcode,
                        mode: ProcessorMode::Arm,
                    });
                }
                (rd, bits(opcode, 3, 0), setflags)
            }
            (ProcessorMode::Thumb, Encoding::T1) => {
                let rd = (bit(opcode, 7) << 3) | bits(opcode, 2, 0);
                if rd == PC_REG {
                    self.check_it_tail()?;
                }
                (rd, bits(opcode, 6, 3), false)
            }
            (ProcessorMode::Thumb, Encoding::T2) => {
                if self.in_it_block() {
                    return Err(EmulationError::Unpredictable("movs inside an IT block"));
                }
                (bits(opcode, 2, 0), bits(opcode, 5, 3), true)
            }
            (ProcessorMode::Thumb, Encoding::T3) => {
                let (rd, rm, setflags) = (bits(opcode, 11, 8), bits(opcode, 3, 0), bit_is_set(opcode, 20));
                let bad = if setflags {
                    bad_reg(rd) || bad_reg(rm)
                } else {
                    rd == PC_REG || rm == PC_REG || (rd == SP_REG && rm == SP_REG)
                };
                if bad {
                    return Err(EmulationError::Unpredictable("mov.w with sp or pc"));
                }
                (rd, rm, setflags)
            }
            (_, other) => return Err(EmulationError::EncodingMismatch(other)),
        };
        let result = self.read_core_reg(rm)?;
        let info = ContextInfo::Register {
            reg: Register::core(rm),
        };
        let context = self.result_context(Some(rd), Some(rm), info);
        self.write_core_reg_optional_flags(&context, result, rd, setflags, None, None)
    }

    /// ADR, the PC-relative address forms of ADD and SUB.
    pub(super) fn emulate_adr(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let (rd, imm32, add) = match encoding {
            Encoding::T1 => (bits(opcode, 10, 8), bits(opcode, 7, 0) << 2, true),
            Encoding::T2 | Encoding::T3 => {
                let rd = bits(opcode, 11, 8);
                if bad_reg(rd) {
                    return Err(EmulationError::Unpredictable("adr to sp or pc"));
                }
                (rd, thumb_imm12(opcode), encoding == Encoding::T3)
            }
            Encoding::A1 | Encoding::A2 => (
                bits(opcode, 15, 12),
                arm_expand_imm(bits(opcode, 11, 0)),
                encoding == Encoding::A1,
            ),
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        let base = align(self.read_core_reg(PC_REG)?, 4);
        let (result, offset) = if add {
            (base.wrapping_add(imm32), i64::from(imm32))
        } else {
            (base.wrapping_sub(imm32), -i64::from(imm32))
        };
        let context = Context::register_plus_offset(ContextKind::RegisterPlusOffset, Register::PC, offset);
        self.write_core_reg_optional_flags(&context, result, rd, false, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_subtract_sets_borrow_as_carry() {
        let out = compute(AluOp::Sub, 5, 3, false, false);
        assert_eq!(out.result, 2);
        assert_eq!(out.carry, Some(true));
        let out = compute(AluOp::Cmp, 3, 5, false, false);
        assert_eq!(out.result, 0xffff_fffe);
        assert_eq!(out.carry, Some(false));
        assert_eq!(out.overflow, Some(false));
    }

    #[test]
    fn test_compute_carry_chained_ops() {
        assert_eq!(compute(AluOp::Adc, 1, 1, false, true).result, 3);
        assert_eq!(compute(AluOp::Sbc, 5, 1, false, false).result, 3);
        assert_eq!(compute(AluOp::Rsc, 1, 5, false, true).result, 4);
        assert_eq!(compute(AluOp::Rsb, 1, 5, false, false).result, 4);
    }

    #[test]
    fn test_compute_logical_uses_shifter_carry() {
        let out = compute(AluOp::Bic, 0xff, 0x0f, true, false);
        assert_eq!(out.result, 0xf0);
        assert_eq!(out.carry, Some(true));
        assert_eq!(out.overflow, None);
        assert_eq!(compute(AluOp::Mvn, 0, 0, false, false).result, u32::MAX);
    }

    #[test]
    fn test_thumb_wide_operand_rules() {
        let fields = AluFields {
            rd: SP_REG,
            rn: SP_REG,
            setflags: false,
        };
        assert!(check_thumb_wide(AluOp::Sub, &fields, None).is_ok());
        assert!(check_thumb_wide(AluOp::And, &fields, None).is_err());
        let fields = AluFields {
            rd: SP_REG,
            rn: 0,
            setflags: false,
        };
        assert!(check_thumb_wide(AluOp::Add, &fields, None).is_err());
        let fields = AluFields {
            rd: 0,
            rn: 1,
            setflags: false,
        };
        assert!(check_thumb_wide(AluOp::Orr, &fields, Some(PC_REG)).is_err());
    }
}
