// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! In-memory register file and sparse memory implementing [`EmulatorAccess`].

use crate::access::{AccessError, AccessResult, EmulatorAccess};
use crate::condition::Psr;
use crate::context::{
    Context, Register, RegisterKind, DWARF_D0, DWARF_R0, DWARF_S0, GENERIC_FLAGS, GENERIC_FP,
    GENERIC_PC, GENERIC_RA, GENERIC_SP, LR_REG, PC_REG, SP_REG,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Destination of one logged write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WriteTarget {
    Register { reg: Register },
    Memory { address: u64, size: usize },
}

/// One write performed through [`EmulationState`], with its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    pub context: Context,
    pub target: WriteTarget,
    pub value: u64,
}

impl fmt::Display for WriteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteTarget::Register { reg } => write!(f, "{reg}"),
            WriteTarget::Memory { address, size } => write!(f, "[{address:#x}]:{size}"),
        }
    }
}

impl fmt::Display for WriteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:#x} ({})", self.target, self.value, self.context)
    }
}

/// Where a [`Register`] lives in the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Core(usize),
    Cpsr,
    Single(usize),
    Double(usize),
}

#[derive(Debug, Clone, Default)]
pub struct EmulationState {
    r: [u32; 16],
    cpsr: u32,
    /// d0-d31; s(2n) and s(2n+1) are the low and high halves of d(n).
    d: [u64; 32],
    memory: BTreeMap<u64, u8>,
    /// Reads of bytes never written return zero instead of failing.
    pub zero_fill: bool,
    writes: Vec<WriteRecord>,
}

impl EmulationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state whose unwritten memory reads as zero.
    pub fn zero_filled() -> Self {
        Self {
            zero_fill: true,
            ..Self::default()
        }
    }

    /// Seeds memory without logging a write.
    pub fn load(&mut self, address: u64, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.memory.insert(address.wrapping_add(i as u64), *byte);
        }
    }

    pub fn core(&self, n: u32) -> u32 {
        self.r[n as usize & 0xf]
    }

    pub fn set_core(&mut self, n: u32, value: u32) {
        self.r[n as usize & 0xf] = value;
    }

    pub fn pc(&self) -> u32 {
        self.r[PC_REG as usize]
    }

    pub fn set_pc(&mut self, value: u32) {
        self.r[PC_REG as usize] = value;
    }

    pub fn sp(&self) -> u32 {
        self.r[SP_REG as usize]
    }

    pub fn set_sp(&mut self, value: u32) {
        self.r[SP_REG as usize] = value;
    }

    pub fn cpsr(&self) -> u32 {
        self.cpsr
    }

    pub fn set_cpsr(&mut self, value: u32) {
        self.cpsr = value;
    }

    pub fn is_thumb(&self) -> bool {
        Psr::from_bits_retain(self.cpsr).contains(Psr::T)
    }

    pub fn set_thumb(&mut self, thumb: bool) {
        let mut psr = Psr::from_bits_retain(self.cpsr);
        psr.set(Psr::T, thumb);
        self.cpsr = psr.bits();
    }

    pub fn double(&self, n: u32) -> u64 {
        self.d[n as usize & 0x1f]
    }

    pub fn set_double(&mut self, n: u32, value: u64) {
        self.d[n as usize & 0x1f] = value;
    }

    pub fn single(&self, n: u32) -> u32 {
        let d = self.d[(n as usize >> 1) & 0xf];
        if n & 1 == 0 {
            d as u32
        } else {
            (d >> 32) as u32
        }
    }

    pub fn set_single(&mut self, n: u32, value: u32) {
        let d = &mut self.d[(n as usize >> 1) & 0xf];
        *d = if n & 1 == 0 {
            (*d & 0xffff_ffff_0000_0000) | u64::from(value)
        } else {
            (*d & 0x0000_0000_ffff_ffff) | (u64::from(value) << 32)
        };
    }

    /// Little-endian value of `size` bytes at `address`, if all are present.
    pub fn peek(&self, address: u64, size: usize) -> Option<u64> {
        let mut value = 0u64;
        for i in (0..size).rev() {
            let byte = match self.memory.get(&address.wrapping_add(i as u64)) {
                Some(byte) => *byte,
                None if self.zero_fill => 0,
                None => return None,
            };
            value = (value << 8) | u64::from(byte);
        }
        Some(value)
    }

    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }

    /// Returns the logged writes and clears the log.
    pub fn take_writes(&mut self) -> Vec<WriteRecord> {
        std::mem::take(&mut self.writes)
    }

    /// The frame pointer follows the instruction set in CPSR.
    fn frame_register(&self) -> u32 {
        if self.is_thumb() {
            7
        } else {
            11
        }
    }

    fn slot(&self, reg: Register) -> Option<Slot> {
        match (reg.kind, reg.number) {
            (RegisterKind::Generic, GENERIC_PC) => Some(Slot::Core(PC_REG as usize)),
            (RegisterKind::Generic, GENERIC_SP) => Some(Slot::Core(SP_REG as usize)),
            (RegisterKind::Generic, GENERIC_FP) => Some(Slot::Core(self.frame_register() as usize)),
            (RegisterKind::Generic, GENERIC_RA) => Some(Slot::Core(LR_REG as usize)),
            (RegisterKind::Generic, GENERIC_FLAGS) => Some(Slot::Cpsr),
            (RegisterKind::Dwarf, n) if (DWARF_R0..DWARF_R0 + 16).contains(&n) => {
                Some(Slot::Core((n - DWARF_R0) as usize))
            }
            (RegisterKind::Dwarf, n) if (DWARF_S0..DWARF_S0 + 32).contains(&n) => {
                Some(Slot::Single((n - DWARF_S0) as usize))
            }
            (RegisterKind::Dwarf, n) if (DWARF_D0..DWARF_D0 + 32).contains(&n) => {
                Some(Slot::Double((n - DWARF_D0) as usize))
            }
            _ => None,
        }
    }
}

impl EmulatorAccess for EmulationState {
    fn read_register(&mut self, reg: Register) -> AccessResult<u64> {
        match self.slot(reg).ok_or(AccessError::Register(reg))? {
            Slot::Core(n) => Ok(u64::from(self.r[n])),
            Slot::Cpsr => Ok(u64::from(self.cpsr)),
            Slot::Single(n) => Ok(u64::from(self.single(n as u32))),
            Slot::Double(n) => Ok(self.d[n]),
        }
    }

    fn write_register(&mut self, context: &Context, reg: Register, value: u64) -> AccessResult<()> {
        match self.slot(reg).ok_or(AccessError::Register(reg))? {
            Slot::Core(n) => self.r[n] = value as u32,
            Slot::Cpsr => self.cpsr = value as u32,
            Slot::Single(n) => self.set_single(n as u32, value as u32),
            Slot::Double(n) => self.d[n] = value,
        }
        self.writes.push(WriteRecord {
            context: *context,
            target: WriteTarget::Register { reg },
            value,
        });
        Ok(())
    }

    fn read_memory(&mut self, _context: &Context, address: u64, size: usize) -> AccessResult<u64> {
        if size == 0 || size > 8 {
            return Err(AccessError::MemoryRead { address, size });
        }
        self.peek(address, size)
            .ok_or(AccessError::MemoryRead { address, size })
    }

    fn write_memory(
        &mut self,
        context: &Context,
        address: u64,
        size: usize,
        value: u64,
    ) -> AccessResult<()> {
        if size == 0 || size > 8 {
            return Err(AccessError::MemoryWrite { address, size });
        }
        let bytes = value.to_le_bytes();
        self.load(address, &bytes[..size]);
        self.writes.push(WriteRecord {
            context: *context,
            target: WriteTarget::Memory { address, size },
            value,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextKind;

    #[test]
    fn test_single_double_aliasing() {
        let mut state = EmulationState::new();
        state.set_double(1, 0x1122_3344_5566_7788);
        assert_eq!(state.single(2), 0x5566_7788);
        assert_eq!(state.single(3), 0x1122_3344);

        state.set_single(3, 0xaabb_ccdd);
        assert_eq!(state.double(1), 0xaabb_ccdd_5566_7788);
    }

    #[test]
    fn test_frame_pointer_follows_isa() {
        let mut state = EmulationState::new();
        state.set_core(7, 0x70);
        state.set_core(11, 0xb0);
        let fp = Register::generic(GENERIC_FP);
        assert_eq!(state.read_register(fp).unwrap(), 0xb0);
        state.set_thumb(true);
        assert_eq!(state.read_register(fp).unwrap(), 0x70);
    }

    #[test]
    fn test_memory_is_little_endian_and_logged() {
        let mut state = EmulationState::new();
        let context = Context::no_args(ContextKind::RegisterStore);
        state.write_memory(&context, 0x100, 4, 0xdead_beef).unwrap();
        assert_eq!(state.peek(0x100, 1), Some(0xef));
        assert_eq!(state.read_memory(&context, 0x102, 2).unwrap(), 0xdead);
        assert_eq!(state.writes().len(), 1);
        assert_eq!(
            state.writes()[0].target,
            WriteTarget::Memory {
                address: 0x100,
                size: 4
            }
        );
    }

    #[test]
    fn test_unwritten_memory() {
        let mut state = EmulationState::new();
        let context = Context::no_args(ContextKind::ReadOpcode);
        assert_eq!(
            state.read_memory(&context, 0x40, 4),
            Err(AccessError::MemoryRead {
                address: 0x40,
                size: 4
            })
        );
        state.zero_fill = true;
        assert_eq!(state.read_memory(&context, 0x40, 4), Ok(0));
    }

    #[test]
    fn test_write_record_display() {
        let mut state = EmulationState::new();
        let context = Context::register_plus_offset(ContextKind::AdjustStackPointer, Register::SP, -8);
        state.write_register(&context, Register::SP, 0xff8).unwrap();
        assert_eq!(
            state.writes()[0].to_string(),
            "sp = 0xff8 (AdjustStackPointer [sp-8])"
        );
    }

    #[test]
    fn test_unknown_register() {
        let mut state = EmulationState::new();
        let reg = Register::dwarf(500);
        assert_eq!(state.read_register(reg), Err(AccessError::Register(reg)));
    }
}
