// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bit-field helpers over 32-bit instruction words.
//!
//! Field positions are inclusive and numbered from bit 0, matching the
//! notation of the ARM Architecture Reference Manual (`opcode<11:8>` is
//! `bits(opcode, 11, 8)`).

/// Returns bit `pos` of `word` as 0 or 1.
#[inline]
pub const fn bit(word: u32, pos: u32) -> u32 {
    (word >> pos) & 1
}

#[inline]
pub const fn bit_is_set(word: u32, pos: u32) -> bool {
    bit(word, pos) == 1
}

#[inline]
pub const fn bit_is_clear(word: u32, pos: u32) -> bool {
    bit(word, pos) == 0
}

/// Extracts `word<hi:lo>` right-aligned.
#[inline]
pub const fn bits(word: u32, hi: u32, lo: u32) -> u32 {
    let width = hi - lo + 1;
    if width >= 32 {
        word >> lo
    } else {
        (word >> lo) & ((1 << width) - 1)
    }
}

/// Sign-extends the low `width` bits of `value` to 32 bits.
#[inline]
pub const fn sign_extend(value: u32, width: u32) -> u32 {
    if width == 0 || width >= 32 {
        return value;
    }
    let shift = 32 - width;
    (((value << shift) as i32) >> shift) as u32
}

/// Keeps the low `width` bits of `value`.
#[inline]
pub const fn zero_extend(value: u32, width: u32) -> u32 {
    if width >= 32 {
        value
    } else {
        value & ((1 << width) - 1)
    }
}

#[inline]
pub const fn rotate_right(value: u32, amount: u32) -> u32 {
    value.rotate_right(amount % 32)
}

/// Number of set bits, `BitCount()` in the ARM ARM.
#[inline]
pub const fn bit_count(value: u32) -> u32 {
    value.count_ones()
}

/// Trailing zero count; 32 for a zero word.
#[inline]
pub const fn trailing_zeros(value: u32) -> u32 {
    value.trailing_zeros()
}

/// `LowestSetBit()`; 32 for a zero word.
#[inline]
pub const fn lowest_set_bit(value: u32) -> u32 {
    trailing_zeros(value)
}

/// Rounds `value` down to a multiple of `alignment` (a power of two).
#[inline]
pub const fn align(value: u32, alignment: u32) -> u32 {
    value & !(alignment - 1)
}
