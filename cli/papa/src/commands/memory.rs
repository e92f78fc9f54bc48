//! `papa memory`: kernel flash and RAM usage.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use papa_board::Board;
use papa_size::{analyze_elf, MemoryReport, ReportOptions};

/// Analyze the board's kernel image (or `elf`) and print the report.
pub fn run(
    board: &Board,
    elf: Option<&Path>,
    options: &ReportOptions,
    format: Option<&str>,
) -> Result<()> {
    let elf: PathBuf = elf.map_or_else(|| board.artifact_path(), Path::to_path_buf);
    if !elf.is_file() {
        bail!(
            "kernel image {} not found; run 'papa build' first",
            elf.display()
        );
    }

    let report = analyze_elf(&elf, &board.tools.objdump, board.descriptor.tock_arch.elf_format())
        .with_context(|| format!("analyzing {}", elf.display()))?;
    print_report(&report, options, format)
}

fn print_report(report: &MemoryReport, options: &ReportOptions, format: Option<&str>) -> Result<()> {
    match format {
        None | Some("human") => print!("{}", report.render(options)),
        Some("json") => println!(
            "{}",
            serde_json::to_string_pretty(&report.summary(options))?
        ),
        Some(other) => bail!("unknown format '{other}' (expected human or json)"),
    }
    Ok(())
}
