// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Condition codes, CPSR flag bits and the Thumb IT-block session.

use crate::bits::{bit_is_set, bits, trailing_zeros};
use bitflags::bitflags;

bitflags! {
    /// Current Program Status Register bits the emulator reads or writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Psr: u32 {
        const N = 1 << 31;
        const Z = 1 << 30;
        const C = 1 << 29;
        const V = 1 << 28;
        const Q = 1 << 27;
        const J = 1 << 24;
        const E = 1 << 9;
        const A = 1 << 8;
        const I = 1 << 7;
        const F = 1 << 6;
        const T = 1 << 5;
    }
}

impl Psr {
    pub fn carry(self) -> bool {
        self.contains(Psr::C)
    }
}

pub const COND_EQ: u32 = 0x0;
pub const COND_NE: u32 = 0x1;
pub const COND_AL: u32 = 0xe;
/// The `0b1111` condition field; always executes.
pub const COND_UNCOND: u32 = 0xf;

/// `ConditionPassed()` against the flags held in `cpsr`.
pub fn condition_passed(cond: u32, cpsr: u32) -> bool {
    let psr = Psr::from_bits_retain(cpsr);
    let n = psr.contains(Psr::N);
    let z = psr.contains(Psr::Z);
    let c = psr.contains(Psr::C);
    let v = psr.contains(Psr::V);

    let result = match bits(cond, 3, 1) {
        0 => z,             // EQ/NE
        1 => c,             // CS/CC
        2 => n,             // MI/PL
        3 => v,             // VS/VC
        4 => c && !z,       // HI/LS
        5 => n == v,        // GE/LT
        6 => n == v && !z,  // GT/LE
        _ => return true,   // AL, and 0b1111 regardless of bit 0
    };
    if bit_is_set(cond, 0) {
        !result
    } else {
        result
    }
}

/// Thumb IT-block state: the `firstcond:mask` byte and the number of
/// instructions left in the block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItSession {
    state: u8,
    remaining: u8,
}

/// Why an IT instruction could not open a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ItError {
    #[error("IT mask is zero")]
    EmptyMask,
    #[error("IT firstcond 0b1111 is not a condition")]
    InvalidCondition,
    #[error("IT AL block must cover exactly one instruction")]
    AlwaysWithTail,
}

impl ItSession {
    /// `ITInit`: opens a block from bits 7:0 of an IT instruction and returns
    /// its size. The session is left untouched on failure.
    pub fn init(&mut self, bits7_0: u32) -> Result<u8, ItError> {
        let firstcond = bits(bits7_0, 7, 4);
        let mask = bits(bits7_0, 3, 0);
        let trailing = trailing_zeros(mask);
        if trailing > 3 {
            return Err(ItError::EmptyMask);
        }
        let size = 4 - trailing;
        if firstcond == COND_UNCOND {
            return Err(ItError::InvalidCondition);
        }
        if firstcond == COND_AL && size != 1 {
            return Err(ItError::AlwaysWithTail);
        }
        self.state = bits(bits7_0, 7, 0) as u8;
        self.remaining = size as u8;
        Ok(self.remaining)
    }

    /// `ITAdvance`: steps past one instruction of the block.
    pub fn advance(&mut self) {
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.state = 0;
        } else {
            self.state = (self.state & 0xe0) | ((self.state << 1) & 0x1f);
        }
    }

    pub fn in_it_block(&self) -> bool {
        self.remaining != 0
    }

    pub fn last_in_it_block(&self) -> bool {
        self.remaining == 1
    }

    /// Condition of the next instruction in the block, AL outside one.
    pub fn cond(&self) -> u32 {
        if self.in_it_block() {
            bits(u32::from(self.state), 7, 4)
        } else {
            COND_AL
        }
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub fn reset(&mut self) {
        *self = ItSession::default();
    }
}

/// The condition a Thumb instruction executes under: the embedded `cond`
/// field of B T1 and B T3, otherwise the IT session's.
pub fn thumb_condition(opcode: u32, is_wide: bool, it: &ItSession) -> u32 {
    if !is_wide {
        if bits(opcode, 15, 12) == 0xd && bits(opcode, 11, 8) != 0xf {
            return bits(opcode, 11, 8);
        }
    } else if bits(opcode, 31, 27) == 0x1e
        && bits(opcode, 15, 14) == 0b10
        && !bit_is_set(opcode, 12)
        && bits(opcode, 25, 22) <= 0xd
    {
        return bits(opcode, 25, 22);
    }
    it.cond()
}
