//! Memory usage report for Tock kernel images.
//!
//! Reads the section headers and symbol table of a kernel ELF (through the
//! cross `objdump`), and reports how much flash and RAM the kernel uses,
//! broken down by crate or module. Symbols are demangled and grouped by path
//! prefix; gaps between variables are reported as waste on request.

pub mod error;
pub mod objdump;
pub mod report;
pub mod symbol;

use std::path::Path;

pub use error::{Result, SizeError};
pub use objdump::{check_format, file_format, ObjdumpListing, Segment};
pub use report::{MemoryReport, MemorySummary, ReportOptions, SectionSizes};

/// Build a report from captured `objdump -f` and `objdump -x` output.
pub fn report_from_objdump(
    elf: &str,
    header: &str,
    listing: &str,
    expected_format: &str,
) -> Result<MemoryReport> {
    check_format(elf, header, expected_format)?;
    let listing = ObjdumpListing::parse(listing)?;
    MemoryReport::from_listing(elf, &listing)
}

/// Run `objdump` on `elf` and build its report.
///
/// `expected_format` is the ELF format the kernel must have, e.g.
/// `elf32-littlearm`; any other format is rejected.
pub fn analyze_elf(elf: &Path, objdump: &str, expected_format: &str) -> Result<MemoryReport> {
    let header = objdump::run_objdump(objdump, "-f", elf)?;
    let listing = objdump::run_objdump(objdump, "-x", elf)?;
    report_from_objdump(&elf.display().to_string(), &header, &listing, expected_format)
}
