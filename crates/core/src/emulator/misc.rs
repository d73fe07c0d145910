// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::ArmEmulator;
use crate::access::EmulatorAccess;
use crate::bits::bits;
use crate::context::{Context, ContextInfo, ContextKind, Register, PC_REG};
use crate::decoder::Encoding;
use crate::{EmuResult, EmulationError};

impl<A: EmulatorAccess> ArmEmulator<A> {
    /// SVC. Only the return address is modeled; the exception entry itself
    /// is left to the caller.
    pub(super) fn emulate_svc(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        let pc = self.read_core_reg(PC_REG)?;
        let (imm, lr) = match encoding {
            Encoding::T1 => (bits(opcode, 7, 0), pc.wrapping_sub(2) | 1),
            Encoding::A1 => (bits(opcode, 23, 0), pc.wrapping_sub(4)),
            other => return Err(EmulationError::EncodingMismatch(other)),
        };
        let context = Context::new(
            ContextKind::SupervisorCall,
            ContextInfo::IsaAndImmediate {
                mode: self.mode(),
                value: imm,
            },
        );
        self.write_register(&context, Register::RA, u64::from(lr))
    }

    /// IT: opens a conditional block over the next one to four instructions.
    pub(super) fn emulate_it(&mut self, opcode: u32, encoding: Encoding) -> EmuResult<()> {
        if encoding != Encoding::T1 {
            return Err(EmulationError::EncodingMismatch(encoding));
        }
        if self.in_it_block() {
            return Err(EmulationError::Unpredictable("it inside an IT block"));
        }
        match self.it_session.init(bits(opcode, 7, 0)) {
            Ok(size) => {
                tracing::trace!("IT block of {} instructions", size);
                Ok(())
            }
            Err(err) => {
                tracing::debug!("IT {:#06x} rejected: {}", opcode, err);
                Err(EmulationError::Unpredictable("invalid it mask"))
            }
        }
    }
}
