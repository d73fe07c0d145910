// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use armulet_core::arith::add_with_carry;
use armulet_core::condition::{condition_passed, ItError, ItSession, COND_AL, COND_EQ, COND_NE};
use armulet_core::decoder::BlockMode;

const SAMPLES: &[u32] = &[
    0,
    1,
    2,
    0x7fff_ffff,
    0x8000_0000,
    0x8000_0001,
    0xffff_fffe,
    0xffff_ffff,
    0x1234_5678,
    0xdead_beef,
];

#[test]
fn test_add_with_carry_matches_wide_arithmetic() {
    for &x in SAMPLES {
        for &y in SAMPLES {
            for carry_in in [false, true] {
                let r = add_with_carry(x, y, carry_in);
                let wide = u64::from(x) + u64::from(y) + u64::from(carry_in);
                assert_eq!(r.result, wide as u32, "{x:#x} + {y:#x} + {carry_in}");
                assert_eq!(r.carry_out, wide >= 1 << 32, "{x:#x} + {y:#x} + {carry_in}");

                let sign = |v: u32| v >> 31;
                let overflow = sign(x) == sign(y) && sign(r.result) != sign(x);
                assert_eq!(r.overflow, overflow, "{x:#x} + {y:#x} + {carry_in}");
            }
        }
    }
}

#[test]
fn test_it_window_sizes() {
    let mut it = ItSession::default();
    assert_eq!(it.init(0b0000_0000), Err(ItError::EmptyMask));
    assert!(!it.in_it_block());

    for (mask, size) in [(0b1000u32, 1u8), (0b0100, 2), (0b1100, 2), (0b0010, 3), (0b0001, 4)] {
        let mut it = ItSession::default();
        assert_eq!(it.init((COND_NE << 4) | mask), Ok(size));
        for _ in 0..size {
            assert!(it.in_it_block());
            it.advance();
        }
        assert!(!it.in_it_block(), "mask {mask:#06b}");
    }
}

#[test]
fn test_condition_complements() {
    for flags in 0..16u32 {
        let cpsr = flags << 28;
        assert!(condition_passed(COND_AL, cpsr));
        assert_ne!(condition_passed(COND_EQ, cpsr), condition_passed(COND_NE, cpsr));
    }
}

#[test]
fn test_decrement_before_is_increment_after_less_frame() {
    for &base in SAMPLES {
        for count in 1..=16 {
            let db = BlockMode::DecrementBefore.start_address(base, count);
            let ia = BlockMode::IncrementAfter.start_address(base, count);
            assert_eq!(db, ia.wrapping_sub(4 * count));
        }
    }
}
