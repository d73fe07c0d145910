// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Command-line operands: opcode lists and register assignments.

use anyhow::{bail, Context, Result};
use std::str::FromStr;

pub fn parse_u32_addr(s: &str) -> Result<u32, String> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex address '{}': {}", s, e))
    } else {
        u32::from_str(trimmed).map_err(|e| format!("Invalid address '{}': {}", s, e))
    }
}

/// A register assignment given as `NAME=VALUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegAssignment {
    pub index: u32,
    pub value: u32,
}

impl FromStr for RegAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected NAME=VALUE, got '{}'", s))?;
        let index = match name.trim().to_ascii_lowercase().as_str() {
            "sp" => 13,
            "lr" => 14,
            "pc" => 15,
            other => other
                .strip_prefix('r')
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n < 16)
                .ok_or_else(|| format!("Unknown register '{}'", name))?,
        };
        let value = parse_u32_addr(value)?;
        Ok(RegAssignment { index, value })
    }
}

/// Encodes opcode words as they sit in memory.
///
/// ARM opcodes are 32-bit words. A Thumb opcode of up to four hex digits is
/// one halfword; a longer one is a 32-bit instruction whose first halfword
/// is the high half.
pub fn assemble(opcodes: &[String], thumb: bool) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(opcodes.len() * 4);
    for text in opcodes {
        let digits = text.trim().trim_start_matches("0x").trim_start_matches("0X");
        if digits.is_empty() || digits.len() > 8 {
            bail!("Invalid opcode '{}'", text);
        }
        let value = u32::from_str_radix(digits, 16)
            .with_context(|| format!("Invalid opcode '{}'", text))?;
        if !thumb {
            bytes.extend_from_slice(&value.to_le_bytes());
        } else if digits.len() <= 4 {
            bytes.extend_from_slice(&(value as u16).to_le_bytes());
        } else {
            bytes.extend_from_slice(&((value >> 16) as u16).to_le_bytes());
            bytes.extend_from_slice(&(value as u16).to_le_bytes());
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u32_addr() {
        assert_eq!(parse_u32_addr("0x8000"), Ok(0x8000));
        assert_eq!(parse_u32_addr("32768"), Ok(0x8000));
        assert!(parse_u32_addr("0xzz").is_err());
    }

    #[test]
    fn test_reg_assignment() {
        assert_eq!(
            "r7=0x10".parse::<RegAssignment>(),
            Ok(RegAssignment { index: 7, value: 0x10 })
        );
        assert_eq!("SP=4096".parse::<RegAssignment>().map(|r| r.index), Ok(13));
        assert!("r16=1".parse::<RegAssignment>().is_err());
        assert!("r1".parse::<RegAssignment>().is_err());
    }

    #[test]
    fn test_assemble_thumb_widths() {
        let opcodes = vec!["b580".to_string(), "0xf000f802".to_string()];
        let bytes = assemble(&opcodes, true).unwrap();
        assert_eq!(bytes, vec![0x80, 0xb5, 0x00, 0xf0, 0x02, 0xf8]);
    }

    #[test]
    fn test_assemble_arm_words() {
        let bytes = assemble(&["e92d4003".to_string()], false).unwrap();
        assert_eq!(bytes, vec![0x03, 0x40, 0x2d, 0xe9]);
        assert!(assemble(&["xyz".to_string()], false).is_err());
    }
}
