//! `papa clean`: remove build artifacts for the board's triple.

use anyhow::{Context, Result};
use papa_board::Board;
use papa_build::{run_action, BuildAction, CommandRunner};

/// Remove everything built for the board's target triple.
pub fn run(board: &Board, runner: &mut dyn CommandRunner) -> Result<()> {
    let outcome = run_action(BuildAction::Clean, board, runner)
        .with_context(|| format!("cleaning {}", board.triple_dir().display()))?;

    if outcome.removed.is_empty() {
        println!(
            "Already clean: {} does not exist",
            board.triple_dir().display()
        );
    }
    for dir in &outcome.removed {
        println!("Removed {}", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use papa_board::BoardDescriptor;
    use papa_build::RecordingRunner;

    use super::*;

    #[test]
    fn clean_removes_triple_dir() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::from_descriptor(BoardDescriptor::papa(), dir.path());
        fs::create_dir_all(board.artifact_path().parent().unwrap()).unwrap();
        fs::write(board.artifact_path(), b"data").unwrap();

        run(&board, &mut RecordingRunner::new()).unwrap();
        assert!(!board.triple_dir().exists());
    }

    #[test]
    fn clean_handles_already_clean() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::from_descriptor(BoardDescriptor::papa(), dir.path());
        // Nothing built yet
        run(&board, &mut RecordingRunner::new()).unwrap();
        run(&board, &mut RecordingRunner::new()).unwrap();
    }
}
