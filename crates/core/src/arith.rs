// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Carry/overflow-correct arithmetic and the barrel shifter.

use crate::bits::{bit, bit_is_set, bits, rotate_right};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddWithCarryResult {
    pub result: u32,
    pub carry_out: bool,
    pub overflow: bool,
}

/// `AddWithCarry()`: computes `x + y + carry_in` in 64-bit so both the
/// unsigned carry and the signed overflow fall out of a comparison.
pub fn add_with_carry(x: u32, y: u32, carry_in: bool) -> AddWithCarryResult {
    let unsigned_sum = u64::from(x) + u64::from(y) + u64::from(carry_in);
    let signed_sum = i64::from(x as i32) + i64::from(y as i32) + i64::from(carry_in);
    let result = unsigned_sum as u32;
    AddWithCarryResult {
        result,
        carry_out: u64::from(result) != unsigned_sum,
        overflow: i64::from(result as i32) != signed_sum,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Lsl,
    Lsr,
    Asr,
    Ror,
    Rrx,
}

impl ShiftType {
    /// `DecodeRegShift()`: the two-bit type field of a register-controlled shift.
    pub fn from_bits(ty: u32) -> Self {
        match ty & 3 {
            0 => ShiftType::Lsl,
            1 => ShiftType::Lsr,
            2 => ShiftType::Asr,
            _ => ShiftType::Ror,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSpec {
    pub kind: ShiftType,
    pub amount: u32,
}

impl ShiftSpec {
    pub const NONE: ShiftSpec = ShiftSpec {
        kind: ShiftType::Lsl,
        amount: 0,
    };

    pub const fn lsl(amount: u32) -> Self {
        ShiftSpec {
            kind: ShiftType::Lsl,
            amount,
        }
    }
}

/// `DecodeImmShift()`: maps the type field and imm5 of an immediate shift to
/// the shift actually applied. LSR/ASR #0 encode #32, ROR #0 encodes RRX.
pub fn decode_imm_shift(ty: u32, imm5: u32) -> ShiftSpec {
    match ty & 3 {
        0 => ShiftSpec::lsl(imm5),
        1 => ShiftSpec {
            kind: ShiftType::Lsr,
            amount: if imm5 == 0 { 32 } else { imm5 },
        },
        2 => ShiftSpec {
            kind: ShiftType::Asr,
            amount: if imm5 == 0 { 32 } else { imm5 },
        },
        _ if imm5 == 0 => ShiftSpec {
            kind: ShiftType::Rrx,
            amount: 1,
        },
        _ => ShiftSpec {
            kind: ShiftType::Ror,
            amount: imm5,
        },
    }
}

/// `Shift_C()`: applies `kind` by `amount` and returns the shifter carry-out.
/// An amount of zero passes the value and the incoming carry through.
pub fn shift_c(value: u32, kind: ShiftType, amount: u32, carry_in: bool) -> (u32, bool) {
    if amount == 0 && kind != ShiftType::Rrx {
        return (value, carry_in);
    }
    match kind {
        ShiftType::Lsl => lsl_c(value, amount),
        ShiftType::Lsr => lsr_c(value, amount),
        ShiftType::Asr => asr_c(value, amount),
        ShiftType::Ror => ror_c(value, amount),
        ShiftType::Rrx => rrx_c(value, carry_in),
    }
}

pub fn shift(value: u32, kind: ShiftType, amount: u32, carry_in: bool) -> u32 {
    shift_c(value, kind, amount, carry_in).0
}

fn lsl_c(value: u32, amount: u32) -> (u32, bool) {
    match amount {
        0 => (value, false),
        1..=31 => (value << amount, bit_is_set(value, 32 - amount)),
        32 => (0, bit_is_set(value, 0)),
        _ => (0, false),
    }
}

fn lsr_c(value: u32, amount: u32) -> (u32, bool) {
    match amount {
        0 => (value, false),
        1..=31 => (value >> amount, bit_is_set(value, amount - 1)),
        32 => (0, bit_is_set(value, 31)),
        _ => (0, false),
    }
}

fn asr_c(value: u32, amount: u32) -> (u32, bool) {
    match amount {
        0 => (value, false),
        1..=31 => (
            ((value as i32) >> amount) as u32,
            bit_is_set(value, amount - 1),
        ),
        _ => {
            let sign = bit_is_set(value, 31);
            (if sign { u32::MAX } else { 0 }, sign)
        }
    }
}

fn ror_c(value: u32, amount: u32) -> (u32, bool) {
    let result = rotate_right(value, amount);
    (result, bit_is_set(result, 31))
}

fn rrx_c(value: u32, carry_in: bool) -> (u32, bool) {
    ((u32::from(carry_in) << 31) | (value >> 1), bit_is_set(value, 0))
}

/// `ARMExpandImm_C()`: an 8-bit value rotated right by twice the 4-bit
/// rotation field of a 12-bit A32 modified immediate.
pub fn arm_expand_imm_c(imm12: u32, carry_in: bool) -> (u32, bool) {
    let unrotated = bits(imm12, 7, 0);
    let amount = 2 * bits(imm12, 11, 8);
    if amount == 0 {
        (unrotated, carry_in)
    } else {
        ror_c(unrotated, amount)
    }
}

pub fn arm_expand_imm(imm12: u32) -> u32 {
    arm_expand_imm_c(imm12, false).0
}

/// `ThumbExpandImm_C()` over the `i:imm3:imm8` fields of a 32-bit Thumb opcode.
pub fn thumb_expand_imm_c(opcode: u32, carry_in: bool) -> (u32, bool) {
    let imm12 = thumb_imm12(opcode);
    let imm8 = bits(imm12, 7, 0);
    if bits(imm12, 11, 10) == 0 {
        let value = match bits(imm12, 9, 8) {
            0 => imm8,
            1 => (imm8 << 16) | imm8,
            2 => (imm8 << 24) | (imm8 << 8),
            _ => (imm8 << 24) | (imm8 << 16) | (imm8 << 8) | imm8,
        };
        (value, carry_in)
    } else {
        let unrotated = 0x80 | bits(imm12, 6, 0);
        ror_c(unrotated, bits(imm12, 11, 7))
    }
}

pub fn thumb_expand_imm(opcode: u32) -> u32 {
    thumb_expand_imm_c(opcode, false).0
}

/// `i:imm3:imm8` of a 32-bit Thumb opcode, unexpanded.
pub fn thumb_imm12(opcode: u32) -> u32 {
    (bit(opcode, 26) << 11) | (bits(opcode, 14, 12) << 8) | bits(opcode, 7, 0)
}

/// `imm7:'00'` of the 16-bit SP adjustment forms.
pub fn thumb_imm_scaled(opcode: u32) -> u32 {
    bits(opcode, 6, 0) << 2
}

/// `BadReg()`: SP or PC, neither of which most Thumb2 operands may name.
#[inline]
pub const fn bad_reg(n: u32) -> bool {
    n == 13 || n == 15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_with_carry_boundaries() {
        let r = add_with_carry(0xffff_ffff, 1, false);
        assert_eq!(r.result, 0);
        assert!(r.carry_out);
        assert!(!r.overflow);

        let r = add_with_carry(0x7fff_ffff, 1, false);
        assert_eq!(r.result, 0x8000_0000);
        assert!(!r.carry_out);
        assert!(r.overflow);

        // SUBS r0, r0, r0 via x + !y + 1
        let r = add_with_carry(5, !5, true);
        assert_eq!(r.result, 0);
        assert!(r.carry_out);
        assert!(!r.overflow);

        let r = add_with_carry(0xffff_ffff, 0xffff_ffff, true);
        assert_eq!(r.result, 0xffff_ffff);
        assert!(r.carry_out);
        assert!(!r.overflow);
    }

    #[test]
    fn test_decode_imm_shift_special_cases() {
        assert_eq!(decode_imm_shift(0, 0), ShiftSpec::NONE);
        assert_eq!(
            decode_imm_shift(1, 0),
            ShiftSpec {
                kind: ShiftType::Lsr,
                amount: 32
            }
        );
        assert_eq!(
            decode_imm_shift(3, 0),
            ShiftSpec {
                kind: ShiftType::Rrx,
                amount: 1
            }
        );
        assert_eq!(
            decode_imm_shift(3, 4),
            ShiftSpec {
                kind: ShiftType::Ror,
                amount: 4
            }
        );
    }

    #[test]
    fn test_shift_c() {
        assert_eq!(shift_c(0x8000_0001, ShiftType::Lsl, 1, false), (2, true));
        assert_eq!(shift_c(0x8000_0001, ShiftType::Lsl, 32, false), (0, true));
        assert_eq!(shift_c(0x8000_0001, ShiftType::Lsl, 33, true), (0, false));
        assert_eq!(shift_c(0x8000_0001, ShiftType::Lsr, 1, false), (0x4000_0000, true));
        assert_eq!(shift_c(0x8000_0000, ShiftType::Lsr, 32, false), (0, true));
        assert_eq!(shift_c(0x8000_0000, ShiftType::Asr, 4, false), (0xf800_0000, false));
        assert_eq!(shift_c(0x8000_0000, ShiftType::Asr, 40, false), (u32::MAX, true));
        assert_eq!(shift_c(0x0000_0001, ShiftType::Ror, 1, false), (0x8000_0000, true));
        assert_eq!(shift_c(0x0000_0003, ShiftType::Rrx, 1, true), (0x8000_0001, true));
        // zero amount keeps the incoming carry
        assert_eq!(shift_c(0x1234, ShiftType::Asr, 0, true), (0x1234, true));
    }

    #[test]
    fn test_arm_expand_imm() {
        // mov r0, #0xff000000 -> imm12 = 0x4ff
        assert_eq!(arm_expand_imm_c(0x4ff, false), (0xff00_0000, true));
        assert_eq!(arm_expand_imm_c(0x0ff, true), (0xff, true));
        assert_eq!(arm_expand_imm(0x101), 0x4000_0000);
    }

    #[test]
    fn test_thumb_expand_imm() {
        // i:imm3:imm8 placed at bit 26, 14:12 and 7:0
        let enc = |i: u32, imm3: u32, imm8: u32| (i << 26) | (imm3 << 12) | imm8;
        assert_eq!(thumb_expand_imm(enc(0, 0, 0xab)), 0x0000_00ab);
        assert_eq!(thumb_expand_imm(enc(0, 1, 0xab)), 0x00ab_00ab);
        assert_eq!(thumb_expand_imm(enc(0, 2, 0xab)), 0xab00_ab00);
        assert_eq!(thumb_expand_imm(enc(0, 3, 0xab)), 0xabab_abab);
        // 0x80 | 0x2b rotated right by 8
        assert_eq!(thumb_expand_imm_c(enc(0, 4, 0x2b), false), (0xab00_0000, true));
        assert_eq!(thumb_imm12(enc(1, 7, 0xff)), 0xfff);
        assert_eq!(thumb_imm_scaled(0xb082), 8);
        assert!(bad_reg(13) && bad_reg(15) && !bad_reg(14));
    }
}
