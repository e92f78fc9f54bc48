//! Errors from delegated build actions.

use std::path::PathBuf;

use papa_board::BoardError;
use thiserror::Error;

/// Convenience alias for results within the build crate.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while planning or running a build action.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' failed with {}", exit_status(.code))]
    Failed { program: String, code: Option<i32> },

    #[error("expected build output {} was not produced", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
