//! `papa board`: inspect, validate and create board definitions.

use std::path::Path;

use anyhow::{bail, Context, Result};
use papa_board::manifest::{board_to_toml, discover_boards, template, BOARD_FILE};
use papa_board::{builtin_boards, Board, BoardManifest, Severity, TockArch};

/// Print the resolved board.
pub fn show(board: &Board, format: Option<&str>) -> Result<()> {
    match format {
        Some("toml") => {
            print!("{}", board_to_toml(&BoardManifest::from_board(board))?);
            return Ok(());
        }
        Some("json") => {
            println!("{}", serde_json::to_string_pretty(board)?);
            return Ok(());
        }
        Some(other) => bail!("unknown format '{other}' (expected toml or json)"),
        None => {}
    }

    let desc = &board.descriptor;
    println!("=== Board: {} ===", desc.platform);
    println!("  Directory:     {}", board.root.display());
    println!();
    println!("--- Identifiers ---");
    for (key, value) in desc.env_vars() {
        println!("  {key:<10} {value}");
    }
    println!("  Profile:   {}", desc.profile.dir_name());
    println!();
    println!("--- Build ---");
    println!("  Target dir:    {}", board.build.target_dir.display());
    match board.build.linker_script {
        Some(ref script) => println!("  Linker script: {}", script.display()),
        None => println!("  Linker script: (none)"),
    }
    println!("  RUSTFLAGS:     {}", papa_build::rustflags(board).join(" "));
    if !board.build.features.is_empty() {
        println!("  Features:      {}", board.build.features.join(","));
    }
    println!("  Kernel image:  {}", board.artifact_path().display());
    println!();
    println!("--- Tools ---");
    println!("  cargo:   {}", board.tools.cargo);
    println!("  objdump: {}", board.tools.objdump);
    println!("  objcopy: {}", board.tools.objcopy);
    Ok(())
}

/// Report every validation issue; fail if any is an error.
pub fn validate(board: &Board) -> Result<()> {
    let issues = match board.validate() {
        Ok(()) => {
            println!("Board '{}' is valid.", board.descriptor.platform);
            return Ok(());
        }
        Err(issues) => issues,
    };

    let mut errors = 0;
    for issue in &issues {
        let label = match issue.severity {
            Severity::Error => {
                errors += 1;
                "error"
            }
            Severity::Warning => "warning",
        };
        println!("  {label}: {}", issue.message);
    }

    if errors > 0 {
        bail!(
            "board '{}' has {errors} error(s)",
            board.descriptor.platform
        );
    }
    println!(
        "Board '{}' is valid ({} warning(s)).",
        board.descriptor.platform,
        issues.len()
    );
    Ok(())
}

/// List built-in boards and the board directories under `root`.
pub fn list(root: &Path) -> Result<()> {
    println!("Built-in boards:");
    for (name, description) in builtin_boards() {
        println!("  {name:<20} {description}");
    }

    let found = discover_boards(root)
        .with_context(|| format!("scanning {}", root.display()))?;
    if !found.is_empty() {
        println!();
        println!("Boards under {}:", root.display());
        for (name, path) in found {
            println!("  {name:<20} {}", path.display());
        }
    }
    Ok(())
}

/// Write a starter `Board.toml` into `dir`.
pub fn init(dir: &Path, platform: Option<&str>, arch: Option<&str>) -> Result<()> {
    let path = dir.join(BOARD_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let platform = match platform {
        Some(p) => p.to_string(),
        None => dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("cannot derive a platform name from {}", dir.display()))?,
    };
    let arch: TockArch = arch.unwrap_or("cortex-m3").parse()?;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating {}", dir.display()))?;
    std::fs::write(&path, template(&platform, arch)?)
        .with_context(|| format!("writing {}", path.display()))?;

    println!("Created {} ({platform}, {arch})", path.display());
    Ok(())
}
