// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_arch() -> String {
    "armv7".to_string()
}

fn default_max_instructions() -> usize {
    64
}

fn default_initial_sp() -> u32 {
    0x7fff_0000
}

/// Limits of prologue analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnwindLimits {
    #[serde(default = "default_max_instructions")]
    pub max_instructions: usize,
    /// Synthetic stack pointer at function entry.
    #[serde(default = "default_initial_sp")]
    pub initial_sp: u32,
}

impl Default for UnwindLimits {
    fn default() -> Self {
        Self {
            max_instructions: default_max_instructions(),
            initial_sp: default_initial_sp(),
        }
    }
}

/// Settings of one emulator session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Architecture variant name, e.g. `armv7` or `thumbv7em-none-eabihf`.
    #[serde(default = "default_arch")]
    pub arch: String,
    #[serde(default)]
    pub ignore_conditions: bool,
    #[serde(default)]
    pub auto_advance_pc: bool,
    #[serde(default)]
    pub unwind: UnwindLimits,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            arch: default_arch(),
            ignore_conditions: false,
            auto_advance_pc: false,
            unwind: UnwindLimits::default(),
        }
    }
}

impl EmulatorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read emulator config at {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid emulator config {:?}", path.as_ref()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Emulator Config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.arch.trim().is_empty() {
            anyhow::bail!("Field 'arch' cannot be empty");
        }

        if self.unwind.max_instructions == 0 {
            anyhow::bail!("Limit 'unwind.max_instructions' must be greater than zero");
        }

        Ok(())
    }
}
