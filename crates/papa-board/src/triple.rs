//! Target triple parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};

/// A cross-compilation target triple such as `thumbv7m-none-eabi` or
/// `riscv32imc-unknown-none-elf`.
///
/// Rust triples omit the vendor for most bare-metal Arm targets, so both
/// `isa-os-abi` and `isa-vendor-os-abi` forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetTriple {
    raw: String,
    isa_end: usize,
    vendor: Option<String>,
    os: String,
    abi: String,
}

impl TargetTriple {
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| BoardError::InvalidTriple {
            triple: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.split('-').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty component"));
        }
        let (vendor, os, abi) = match parts.as_slice() {
            [_, os, abi] => (None, *os, *abi),
            [_, vendor, os, abi] => (Some(vendor.to_string()), *os, *abi),
            _ => return Err(invalid("expected 3 or 4 dash-separated components")),
        };

        Ok(Self {
            raw: s.to_string(),
            isa_end: parts[0].len(),
            vendor,
            os: os.to_string(),
            abi: abi.to_string(),
        })
    }

    /// Instruction-set component, e.g. `thumbv7m`.
    pub fn isa(&self) -> &str {
        &self.raw[..self.isa_end]
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn abi(&self) -> &str {
        &self.abi
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the triple targets bare metal (no operating system).
    pub fn is_bare_metal(&self) -> bool {
        self.os == "none"
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for TargetTriple {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TargetTriple {
    type Error = BoardError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<TargetTriple> for String {
    fn from(t: TargetTriple) -> String {
        t.raw
    }
}
