// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Register naming and the tags attached to every emulated write.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruction set the processor is executing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorMode {
    #[default]
    Invalid,
    Arm,
    Thumb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    /// Role-based numbering, see the `GENERIC_*` constants.
    Generic,
    /// DWARF numbering for ARM.
    Dwarf,
}

pub const GENERIC_PC: u32 = 0;
pub const GENERIC_SP: u32 = 1;
pub const GENERIC_FP: u32 = 2;
pub const GENERIC_RA: u32 = 3;
pub const GENERIC_FLAGS: u32 = 4;

pub const DWARF_R0: u32 = 0;
pub const DWARF_S0: u32 = 64;
pub const DWARF_D0: u32 = 256;

pub const SP_REG: u32 = 13;
pub const LR_REG: u32 = 14;
pub const PC_REG: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Register {
    pub kind: RegisterKind,
    pub number: u32,
}

impl Register {
    pub const PC: Register = Register::generic(GENERIC_PC);
    pub const SP: Register = Register::generic(GENERIC_SP);
    pub const RA: Register = Register::generic(GENERIC_RA);
    pub const FLAGS: Register = Register::generic(GENERIC_FLAGS);

    pub const fn generic(number: u32) -> Self {
        Register {
            kind: RegisterKind::Generic,
            number,
        }
    }

    pub const fn dwarf(number: u32) -> Self {
        Register {
            kind: RegisterKind::Dwarf,
            number,
        }
    }

    /// Core register `r<n>`. SP, LR and PC use their generic names so every
    /// write to them is reported the same way.
    pub const fn core(n: u32) -> Self {
        match n {
            SP_REG => Register::SP,
            LR_REG => Register::RA,
            PC_REG => Register::PC,
            _ => Register::dwarf(DWARF_R0 + n),
        }
    }

    pub const fn single(n: u32) -> Self {
        Register::dwarf(DWARF_S0 + n)
    }

    pub const fn double(n: u32) -> Self {
        Register::dwarf(DWARF_D0 + n)
    }

    /// The core register index this names, if any. The frame pointer is
    /// resolved by the caller since it depends on the instruction set.
    pub fn core_index(self) -> Option<u32> {
        match (self.kind, self.number) {
            (RegisterKind::Generic, GENERIC_PC) => Some(PC_REG),
            (RegisterKind::Generic, GENERIC_SP) => Some(SP_REG),
            (RegisterKind::Generic, GENERIC_RA) => Some(LR_REG),
            (RegisterKind::Dwarf, n) if n <= 15 => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.number) {
            (RegisterKind::Generic, GENERIC_PC) => write!(f, "pc"),
            (RegisterKind::Generic, GENERIC_SP) => write!(f, "sp"),
            (RegisterKind::Generic, GENERIC_FP) => write!(f, "fp"),
            (RegisterKind::Generic, GENERIC_RA) => write!(f, "lr"),
            (RegisterKind::Generic, GENERIC_FLAGS) => write!(f, "cpsr"),
            (RegisterKind::Generic, n) => write!(f, "generic{n}"),
            (RegisterKind::Dwarf, n) if n <= 15 => write!(f, "r{n}"),
            (RegisterKind::Dwarf, n) if (DWARF_S0..DWARF_S0 + 32).contains(&n) => {
                write!(f, "s{}", n - DWARF_S0)
            }
            (RegisterKind::Dwarf, n) if (DWARF_D0..DWARF_D0 + 32).contains(&n) => {
                write!(f, "d{}", n - DWARF_D0)
            }
            (RegisterKind::Dwarf, n) => write!(f, "dwarf{n}"),
        }
    }
}

/// Why a write happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    ReadOpcode,
    Immediate,
    /// Result of a register-register operation.
    DataProcessing,
    PushRegisterOnStack,
    PopRegisterOffStack,
    AdjustStackPointer,
    /// A frame register set up from SP (`add r7, sp, #8`, `mov r7, sp`).
    SetFramePointer,
    /// Writeback of a base register other than SP.
    AdjustBaseRegister,
    RegisterPlusOffset,
    RegisterLoad,
    RegisterStore,
    RelativeBranchImmediate,
    AbsoluteBranchRegister,
    TableBranchReadMemory,
    SupervisorCall,
    WriteRegisterRandomBits,
    WriteMemoryRandomBits,
    /// Sequential PC update after an instruction that did not branch.
    AdvancePc,
}

/// Operands describing a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextInfo {
    NoArgs,
    RegisterPlusOffset {
        reg: Register,
        offset: i64,
    },
    RegisterPlusIndirectOffset {
        base: Register,
        offset_reg: Register,
    },
    RegisterToRegisterPlusOffset {
        data_reg: Register,
        base: Register,
        offset: i64,
    },
    RegisterToRegisterPlusIndirectOffset {
        data_reg: Register,
        base: Register,
        offset_reg: Register,
    },
    Operands {
        op1: Register,
        op2: Register,
    },
    Offset {
        offset: i64,
    },
    Immediate {
        value: u64,
    },
    Address {
        address: u64,
    },
    Isa {
        mode: ProcessorMode,
    },
    IsaAndImmediate {
        mode: ProcessorMode,
        value: u32,
    },
    IsaAndImmediateSigned {
        mode: ProcessorMode,
        value: i32,
    },
    Register {
        reg: Register,
    },
}

/// Tag attached to a single register or memory write. It is passed by
/// reference to the access collaborator and not retained by the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub kind: ContextKind,
    pub info: ContextInfo,
}

impl Context {
    pub const fn new(kind: ContextKind, info: ContextInfo) -> Self {
        Context { kind, info }
    }

    pub const fn no_args(kind: ContextKind) -> Self {
        Context::new(kind, ContextInfo::NoArgs)
    }

    pub const fn register_plus_offset(kind: ContextKind, reg: Register, offset: i64) -> Self {
        Context::new(kind, ContextInfo::RegisterPlusOffset { reg, offset })
    }

    pub const fn with_info(self, info: ContextInfo) -> Self {
        Context::new(self.kind, info)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        match self.info {
            ContextInfo::NoArgs => Ok(()),
            ContextInfo::RegisterPlusOffset { reg, offset } => write!(f, " [{reg}{offset:+}]"),
            ContextInfo::RegisterPlusIndirectOffset { base, offset_reg } => {
                write!(f, " [{base}+{offset_reg}]")
            }
            ContextInfo::RegisterToRegisterPlusOffset {
                data_reg,
                base,
                offset,
            } => write!(f, " {data_reg} -> [{base}{offset:+}]"),
            ContextInfo::RegisterToRegisterPlusIndirectOffset {
                data_reg,
                base,
                offset_reg,
            } => write!(f, " {data_reg} -> [{base}+{offset_reg}]"),
            ContextInfo::Operands { op1, op2 } => write!(f, " ({op1}, {op2})"),
            ContextInfo::Offset { offset } => write!(f, " {offset:+}"),
            ContextInfo::Immediate { value } => write!(f, " #{value:#x}"),
            ContextInfo::Address { address } => write!(f, " @{address:#x}"),
            ContextInfo::Isa { mode } => write!(f, " {mode:?}"),
            ContextInfo::IsaAndImmediate { mode, value } => write!(f, " {mode:?} #{value:#x}"),
            ContextInfo::IsaAndImmediateSigned { mode, value } => {
                write!(f, " {mode:?} {value:+}")
            }
            ContextInfo::Register { reg } => write!(f, " {reg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_register_naming() {
        assert_eq!(Register::core(0), Register::dwarf(0));
        assert_eq!(Register::core(13), Register::SP);
        assert_eq!(Register::core(14), Register::RA);
        assert_eq!(Register::core(15), Register::PC);
        for n in 0..16 {
            assert_eq!(Register::core(n).core_index(), Some(n));
        }
        assert_eq!(Register::FLAGS.core_index(), None);
        assert_eq!(Register::double(8).to_string(), "d8");
        assert_eq!(Register::single(3).to_string(), "s3");
    }

    #[test]
    fn test_context_display() {
        let ctx = Context::new(
            ContextKind::PushRegisterOnStack,
            ContextInfo::RegisterToRegisterPlusOffset {
                data_reg: Register::RA,
                base: Register::SP,
                offset: -4,
            },
        );
        assert_eq!(ctx.to_string(), "PushRegisterOnStack lr -> [sp-4]");
        let ctx = Context::register_plus_offset(ContextKind::AdjustStackPointer, Register::SP, -16);
        assert_eq!(ctx.to_string(), "AdjustStackPointer [sp-16]");
    }
}
