// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Decode-and-execute core for ARM and Thumb/Thumb2 instructions.
//!
//! [`ArmEmulator`] computes the side effects of one instruction without
//! running it on a target. Registers and memory are reached through an
//! injected [`EmulatorAccess`] and every write it issues carries a
//! [`Context`] saying why it happened, which is what lets an unwinder
//! rebuild frame state from a prologue (see [`unwind`]).

pub mod access;
pub mod arch;
pub mod arith;
pub mod bits;
pub mod condition;
pub mod context;
pub mod decoder;
pub mod emulator;
pub mod state;
pub mod unwind;


pub use access::{AccessError, AccessResult, EmulatorAccess};
pub use arch::ArmVariants;
pub use context::{Context, ContextInfo, ContextKind, ProcessorMode, Register, RegisterKind};
pub use decoder::{Encoding, InstrSize};
pub use emulator::{ArmEmulator, EmulatorOptions, Instruction, Retired};
pub use state::{EmulationState, WriteRecord, WriteTarget};

#[derive(Debug, thiserror::Error)]
pub enum EmulationError {
    #[error("No decode row for {opcode:#010x} in {mode:?} mode")]
    UnsupportedEncoding { opcode: u32, mode: ProcessorMode },
    #[error("UNPREDICTABLE: {0}")]
    Unpredictable(&'static str),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("Unknown architecture {0:?}")]
    InvalidArchitecture(String),
    #[error("No instruction has been fetched")]
    NoInstruction,
    #[error("Handler does not implement encoding {0:?}")]
    EncodingMismatch(Encoding),
}

pub type EmuResult<T> = Result<T, EmulationError>;

/// Entry points the rest of a debugger drives an emulator through.
pub trait InstructionEmulator {
    /// Selects the architecture version by name. Returns `false` and falls
    /// back to the oldest architecture when the name is not recognized.
    fn set_architecture(&mut self, name: &str) -> bool;

    /// Fetches the instruction at the current PC and classifies its
    /// instruction set and width.
    fn read_instruction(&mut self) -> EmuResult<Instruction>;

    /// Decodes, condition-checks and executes the fetched instruction.
    fn evaluate_instruction(&mut self) -> EmuResult<Retired>;
}
