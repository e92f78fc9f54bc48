//! `papa doctor`: toolchain diagnostics.

use std::path::Path;
use std::process::Command;

use anyhow::Result;
use papa_board::{BoardManifest, BoardOverrides};

/// Print toolchain and board diagnostic information.
pub fn run(start_dir: &Path, overrides: &BoardOverrides) -> Result<()> {
    println!("=== papa doctor ===");
    println!();
    println!("papa version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- Board ---");
    match BoardManifest::find_and_load(start_dir) {
        Ok(Some((_, dir))) => println!("  Board.toml: found at {}", dir.display()),
        Ok(None) => println!("  Board.toml: not found (using built-in papa board)"),
        Err(e) => println!("  Board.toml: error: {e}"),
    }

    let board = match papa_board::manifest::load_board(start_dir, overrides) {
        Ok(board) => board,
        Err(e) => {
            println!("  Resolution failed: {e}");
            return Ok(());
        }
    };
    for (key, value) in board.descriptor.env_vars() {
        println!("  {key:<10} {value}");
    }
    match board.validate() {
        Ok(()) => println!("  Validation: ok"),
        Err(issues) => {
            for issue in issues {
                println!("  {:?}: {}", issue.severity, issue.message);
            }
        }
    }
    println!();

    println!("--- System Tools ---");
    print_tool_status(&board.tools.cargo, &["--version"]);
    print_tool_status("rustc", &["--version"]);
    print_tool_status(&board.tools.objdump, &["--version"]);
    print_tool_status(&board.tools.objcopy, &["--version"]);
    println!();

    println!("--- Rust Target ---");
    let triple = board.descriptor.target.as_str();
    match installed_targets() {
        Some(targets) if targets.iter().any(|t| t == triple) => {
            println!("  {triple}: installed");
        }
        Some(_) => println!("  {triple}: missing (rustup target add {triple})"),
        None => println!("  {triple}: unknown (rustup not found)"),
    }

    Ok(())
}

fn print_tool_status(name: &str, args: &[&str]) {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first_line = version.lines().next().unwrap_or("(unknown version)");
            println!("  {name}: {first_line}");
        }
        Err(_) => {
            println!("  {name}: not found");
        }
    }
}

fn installed_targets() -> Option<Vec<String>> {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .collect(),
    )
}
