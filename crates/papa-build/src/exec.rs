//! Executing action plans.

use std::fs;
use std::path::PathBuf;

use papa_board::Board;

use crate::action::BuildAction;
use crate::error::{BuildError, Result};
use crate::plan::{plan, Step};
use crate::runner::CommandRunner;

/// What an executed plan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Number of programs run.
    pub commands_run: usize,
    /// Outputs confirmed to exist.
    pub artifacts: Vec<PathBuf>,
    /// Directories removed. Empty when there was nothing to clean.
    pub removed: Vec<PathBuf>,
}

/// Execute `steps` in order, stopping at the first failure.
pub fn execute(steps: &[Step], runner: &mut dyn CommandRunner) -> Result<Outcome> {
    let mut outcome = Outcome::default();
    for step in steps {
        match step {
            Step::Run(invocation) => {
                runner.run(invocation)?;
                outcome.commands_run += 1;
            }
            Step::RemoveDir(dir) => {
                if dir.exists() {
                    fs::remove_dir_all(dir).map_err(|source| BuildError::Io {
                        path: dir.clone(),
                        source,
                    })?;
                    log::info!("Removed {}", dir.display());
                    outcome.removed.push(dir.clone());
                } else {
                    log::info!("Already clean: {} does not exist", dir.display());
                }
            }
            Step::ExpectArtifact(path) => {
                if !path.is_file() {
                    return Err(BuildError::ArtifactMissing { path: path.clone() });
                }
                log::debug!("produced {}", path.display());
                outcome.artifacts.push(path.clone());
            }
        }
    }
    Ok(outcome)
}

/// Validate `board`, then plan and execute `action` for it.
pub fn run_action(
    action: BuildAction,
    board: &Board,
    runner: &mut dyn CommandRunner,
) -> Result<Outcome> {
    board.ensure_valid()?;
    log::debug!(
        "{action}: TARGET={} PLATFORM={} TOCK_ARCH={}",
        board.descriptor.target,
        board.descriptor.platform,
        board.descriptor.tock_arch
    );
    execute(&plan(action, board), runner)
}
