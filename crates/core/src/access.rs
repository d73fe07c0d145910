// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::context::{Context, Register};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Register {0} is not available")]
    Register(Register),
    #[error("Memory read of {size} bytes at {address:#x} failed")]
    MemoryRead { address: u64, size: usize },
    #[error("Memory write of {size} bytes at {address:#x} failed")]
    MemoryWrite { address: u64, size: usize },
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Register and memory capability the emulator runs against.
///
/// Implementations may talk to a live process, a core file or an in-memory
/// model. Values are little-endian and `size` is 1, 2, 4 or 8 bytes. Every
/// mutating call carries the [`Context`] explaining it.
pub trait EmulatorAccess {
    fn read_register(&mut self, reg: Register) -> AccessResult<u64>;

    fn write_register(&mut self, context: &Context, reg: Register, value: u64)
        -> AccessResult<()>;

    fn read_memory(&mut self, context: &Context, address: u64, size: usize) -> AccessResult<u64>;

    fn write_memory(
        &mut self,
        context: &Context,
        address: u64,
        size: usize,
        value: u64,
    ) -> AccessResult<()>;
}

impl<T: EmulatorAccess + ?Sized> EmulatorAccess for &mut T {
    fn read_register(&mut self, reg: Register) -> AccessResult<u64> {
        (**self).read_register(reg)
    }

    fn write_register(
        &mut self,
        context: &Context,
        reg: Register,
        value: u64,
    ) -> AccessResult<()> {
        (**self).write_register(context, reg, value)
    }

    fn read_memory(&mut self, context: &Context, address: u64, size: usize) -> AccessResult<u64> {
        (**self).read_memory(context, address, size)
    }

    fn write_memory(
        &mut self,
        context: &Context,
        address: u64,
        size: usize,
        value: u64,
    ) -> AccessResult<()> {
        (**self).write_memory(context, address, size, value)
    }
}

impl<T: EmulatorAccess + ?Sized> EmulatorAccess for Box<T> {
    fn read_register(&mut self, reg: Register) -> AccessResult<u64> {
        (**self).read_register(reg)
    }

    fn write_register(
        &mut self,
        context: &Context,
        reg: Register,
        value: u64,
    ) -> AccessResult<()> {
        (**self).write_register(context, reg, value)
    }

    fn read_memory(&mut self, context: &Context, address: u64, size: usize) -> AccessResult<u64> {
        (**self).read_memory(context, address, size)
    }

    fn write_memory(
        &mut self,
        context: &Context,
        address: u64,
        size: usize,
        value: u64,
    ) -> AccessResult<()> {
        (**self).write_memory(context, address, size, value)
    }
}
