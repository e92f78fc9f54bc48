//! `papa build|check|doc|bin|lst`: delegate to cargo and binutils.

use anyhow::{Context, Result};
use papa_board::Board;
use papa_build::{run_action, BuildAction, CommandRunner};

/// Run a compiling action for `board`.
pub fn run(board: &Board, action: BuildAction, runner: &mut dyn CommandRunner) -> Result<()> {
    let desc = &board.descriptor;
    println!(
        "{action}: {} (TARGET={}, TOCK_ARCH={})",
        desc.platform, desc.target, desc.tock_arch
    );

    let outcome = run_action(action, board, runner)
        .with_context(|| format!("{action} failed for board '{}'", desc.platform))?;

    for artifact in &outcome.artifacts {
        println!("  produced {}", artifact.display());
    }
    Ok(())
}
