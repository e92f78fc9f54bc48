//! Architecture tags.
//!
//! The architecture tag (`TOCK_ARCH`) names the CPU core family. It selects
//! the core-specific startup and trap handling code, the binutils prefix used
//! to inspect the kernel image, and the set of target triples that can
//! compile for the core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Instruction set family of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchFamily {
    Arm,
    RiscV,
}

/// A CPU core family recognised by the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TockArch {
    #[serde(rename = "cortex-m0")]
    CortexM0,
    #[serde(rename = "cortex-m0p")]
    CortexM0p,
    #[serde(rename = "cortex-m3")]
    CortexM3,
    #[serde(rename = "cortex-m4")]
    CortexM4,
    #[serde(rename = "cortex-m7")]
    CortexM7,
    #[serde(rename = "rv32i")]
    Rv32i,
    #[serde(rename = "rv32imc")]
    Rv32imc,
    #[serde(rename = "rv32imac")]
    Rv32imac,
}

impl TockArch {
    /// Every recognised architecture, in display order.
    pub const ALL: [TockArch; 8] = [
        TockArch::CortexM0,
        TockArch::CortexM0p,
        TockArch::CortexM3,
        TockArch::CortexM4,
        TockArch::CortexM7,
        TockArch::Rv32i,
        TockArch::Rv32imc,
        TockArch::Rv32imac,
    ];

    /// The tag as written in board files and in `TOCK_ARCH`.
    pub fn as_str(self) -> &'static str {
        match self {
            TockArch::CortexM0 => "cortex-m0",
            TockArch::CortexM0p => "cortex-m0p",
            TockArch::CortexM3 => "cortex-m3",
            TockArch::CortexM4 => "cortex-m4",
            TockArch::CortexM7 => "cortex-m7",
            TockArch::Rv32i => "rv32i",
            TockArch::Rv32imc => "rv32imc",
            TockArch::Rv32imac => "rv32imac",
        }
    }

    /// All tags, for error messages and listings.
    pub fn known_tags() -> Vec<&'static str> {
        Self::ALL.iter().map(|a| a.as_str()).collect()
    }

    pub fn family(self) -> ArchFamily {
        match self {
            TockArch::CortexM0
            | TockArch::CortexM0p
            | TockArch::CortexM3
            | TockArch::CortexM4
            | TockArch::CortexM7 => ArchFamily::Arm,
            TockArch::Rv32i | TockArch::Rv32imc | TockArch::Rv32imac => ArchFamily::RiscV,
        }
    }

    /// Instruction-set component of the triples that compile for this core.
    pub fn isa(self) -> &'static str {
        match self {
            TockArch::CortexM0 | TockArch::CortexM0p => "thumbv6m",
            TockArch::CortexM3 => "thumbv7m",
            TockArch::CortexM4 | TockArch::CortexM7 => "thumbv7em",
            TockArch::Rv32i => "riscv32i",
            TockArch::Rv32imc => "riscv32imc",
            TockArch::Rv32imac => "riscv32imac",
        }
    }

    /// Whether a triple's instruction-set component matches this core.
    pub fn accepts_isa(self, isa: &str) -> bool {
        isa == self.isa()
    }

    /// The triple used when a board names only an architecture.
    pub fn default_triple(self) -> String {
        match self.family() {
            ArchFamily::Arm => format!("{}-none-eabi", self.isa()),
            ArchFamily::RiscV => format!("{}-unknown-none-elf", self.isa()),
        }
    }

    /// Prefix of the cross binutils (`objdump`, `objcopy`) for this core.
    pub fn binutils_prefix(self) -> &'static str {
        match self.family() {
            ArchFamily::Arm => "arm-none-eabi-",
            ArchFamily::RiscV => "riscv64-unknown-elf-",
        }
    }

    /// ELF file format string reported by `objdump -f` for kernels of this core.
    pub fn elf_format(self) -> &'static str {
        match self.family() {
            ArchFamily::Arm => "elf32-littlearm",
            ArchFamily::RiscV => "elf32-littleriscv",
        }
    }
}

impl fmt::Display for TockArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TockArch {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| BoardError::UnknownArch {
                arch: s.to_string(),
                known: Self::known_tags(),
            })
    }
}
