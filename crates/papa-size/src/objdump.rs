//! Parsing `objdump -f` and `objdump -x` output.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use regex::Regex;
use serde::Serialize;

use crate::error::{Result, SizeError};

/// Kernel image segments the report looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Code and constant data.
    Text,
    /// Initialized variables: stored in flash, copied to RAM at boot.
    Relocate,
    /// Zero-initialized variables.
    Sram,
    /// Kernel stack.
    Stack,
    /// RAM reserved for applications.
    AppMemory,
}

impl Segment {
    pub const ALL: [Segment; 5] = [
        Segment::Text,
        Segment::Relocate,
        Segment::Sram,
        Segment::Stack,
        Segment::AppMemory,
    ];

    /// Section name without the leading dot.
    pub fn name(self) -> &'static str {
        match self {
            Segment::Text => "text",
            Segment::Relocate => "relocate",
            Segment::Sram => "sram",
            Segment::Stack => "stack",
            Segment::AppMemory => "app_memory",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

/// One symbol table entry in a tracked segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSymbol {
    pub addr: u64,
    pub segment: Segment,
    pub size: u64,
    /// Name as printed by objdump (possibly mangled).
    pub name: String,
}

/// The parts of `objdump -x` the report needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjdumpListing {
    /// Section sizes in bytes.
    pub sections: BTreeMap<Segment, u64>,
    pub symbols: Vec<RawSymbol>,
}

enum Region {
    Start,
    Sections,
    SymbolTable,
}

const SEGMENTS: &str = "text|relocate|sram|stack|app_memory";

impl ObjdumpListing {
    /// Parse the output of `objdump -x`.
    ///
    /// Lines before the `Sections:` header are ignored; lines that do not
    /// describe one of the tracked segments are skipped.
    pub fn parse(output: &str) -> Result<Self> {
        let section_re = Regex::new(&format!(r"^\S+\s+\.({SEGMENTS})\s+(\S+).+"))?;
        let symbol_re = Regex::new(&format!(
            r"^(\S+)\s+\w+\s+\w*\s+\.({SEGMENTS})\s+(\S+)\s+(.+)"
        ))?;

        let mut listing = Self::default();
        let mut region = Region::Start;

        for line in output.lines() {
            let line = line.trim();
            match line {
                "Sections:" => {
                    region = Region::Sections;
                    continue;
                }
                "SYMBOL TABLE:" => {
                    region = Region::SymbolTable;
                    continue;
                }
                _ => {}
            }

            match region {
                Region::Start => {}
                Region::Sections => {
                    let Some(caps) = section_re.captures(line) else {
                        continue;
                    };
                    let (Some(segment), Some(size)) =
                        (Segment::from_name(&caps[1]), parse_hex(&caps[2]))
                    else {
                        continue;
                    };
                    listing.sections.insert(segment, size);
                }
                Region::SymbolTable => {
                    let Some(caps) = symbol_re.captures(line) else {
                        continue;
                    };
                    let (Some(addr), Some(segment), Some(size)) = (
                        parse_hex(&caps[1]),
                        Segment::from_name(&caps[2]),
                        parse_hex(&caps[3]),
                    ) else {
                        log::debug!("skipping unparsable symbol line: {line}");
                        continue;
                    };
                    listing.symbols.push(RawSymbol {
                        addr,
                        segment,
                        size,
                        name: caps[4].to_string(),
                    });
                }
            }
        }

        Ok(listing)
    }

    /// Size of a section, failing if objdump did not report it.
    pub fn section(&self, segment: Segment) -> Result<u64> {
        self.sections
            .get(&segment)
            .copied()
            .ok_or(SizeError::MissingSection {
                name: segment.name(),
            })
    }
}

fn parse_hex(s: &str) -> Option<u64> {
    u64::from_str_radix(s, 16).ok()
}

/// Extract the file format from `objdump -f` output, e.g. `elf32-littlearm`.
pub fn file_format(header: &str) -> Result<Option<String>> {
    let re = Regex::new(r"file format (\S+)")?;
    Ok(header
        .lines()
        .find_map(|line| re.captures(line).map(|c| c[1].to_string())))
}

/// Check that `objdump -f` output reports `expected`.
pub fn check_format(elf: &str, header: &str, expected: &str) -> Result<()> {
    match file_format(header)? {
        None => Err(SizeError::UnknownFormat {
            elf: elf.to_string(),
        }),
        Some(found) if found != expected => Err(SizeError::UnsupportedFormat {
            found,
            expected: expected.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

/// Run `objdump <flag> <elf>` and capture its standard output.
pub fn run_objdump(objdump: &str, flag: &str, elf: &Path) -> Result<String> {
    log::debug!("{objdump} {flag} {}", elf.display());
    let output = Command::new(objdump)
        .arg(flag)
        .arg(elf)
        .output()
        .map_err(|source| SizeError::Spawn {
            program: objdump.to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(SizeError::ObjdumpFailed {
            program: objdump.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "
papa:     file format elf32-littlearm
architecture: armv7, flags 0x00000112:
EXEC_P, HAS_SYMS, D_PAGED
start address 0x00040001
";

    const LISTING: &str = "
papa:     file format elf32-littlearm

Sections:
Idx Name          Size      VMA       LMA       File off  Algn
  0 .stack        00001000  20000000  20000000  00030000  2**0
                  ALLOC
  1 .text         00010400  00040000  00040000  00010000  2**2
                  CONTENTS, ALLOC, LOAD, READONLY, CODE
  2 .ARM.exidx    00000010  00050400  00050400  00020400  2**2
                  CONTENTS, ALLOC, LOAD, READONLY, DATA
SYMBOL TABLE:
00040000 l    d  .text\t00000000 .text
20001000 g     O .relocate\t00000008 _ZN3h1b4uart5UART017h0123456789abcdefE
00040068 g     F .text\t00000010 .hidden __aeabi_memcpy
00050400 l     O .ARM.exidx\t00000010 exidx_entry
";

    #[test]
    fn detects_file_format() {
        assert_eq!(file_format(HEADER).unwrap().as_deref(), Some("elf32-littlearm"));
        assert_eq!(file_format("garbage").unwrap(), None);
    }

    #[test]
    fn format_check() {
        assert!(check_format("papa", HEADER, "elf32-littlearm").is_ok());
        let err = check_format("papa", HEADER, "elf32-littleriscv").unwrap_err();
        assert!(err.to_string().contains("elf32-littlearm architecture not supported"));
        assert!(matches!(
            check_format("papa", "", "elf32-littlearm").unwrap_err(),
            SizeError::UnknownFormat { .. }
        ));
    }

    #[test]
    fn parses_tracked_sections_only() {
        let listing = ObjdumpListing::parse(LISTING).unwrap();
        assert_eq!(listing.section(Segment::Stack).unwrap(), 0x1000);
        assert_eq!(listing.section(Segment::Text).unwrap(), 0x10400);
        assert_eq!(listing.sections.len(), 2);
        assert!(matches!(
            listing.section(Segment::Sram).unwrap_err(),
            SizeError::MissingSection { name: "sram" }
        ));
    }

    #[test]
    fn parses_symbols_in_tracked_segments() {
        let listing = ObjdumpListing::parse(LISTING).unwrap();
        assert_eq!(listing.symbols.len(), 3);
        assert_eq!(
            listing.symbols[1],
            RawSymbol {
                addr: 0x2000_1000,
                segment: Segment::Relocate,
                size: 8,
                name: "_ZN3h1b4uart5UART017h0123456789abcdefE".into(),
            }
        );
        assert_eq!(listing.symbols[2].name, ".hidden __aeabi_memcpy");
    }

    #[test]
    fn lines_before_sections_are_ignored() {
        let listing = ObjdumpListing::parse("  0 .text 00000010 0 0 0 2**2\n").unwrap();
        assert!(listing.sections.is_empty());
    }

    #[test]
    fn missing_objdump_is_spawn_error() {
        let err = run_objdump("papa-no-such-objdump", "-f", Path::new("papa")).unwrap_err();
        assert!(matches!(err, SizeError::Spawn { .. }));
    }
}
