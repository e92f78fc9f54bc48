//! Error types for board configuration.

use std::path::PathBuf;

/// Errors that can occur while loading or resolving a board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading board files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Board file not found.
    #[error("board file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The architecture tag is not one the build knows how to handle.
    #[error("unknown architecture '{arch}' (known: {})", known.join(", "))]
    UnknownArch {
        /// The tag as written.
        arch: String,
        /// Every recognised tag.
        known: Vec<&'static str>,
    },

    /// The target triple is malformed.
    #[error("invalid target triple '{triple}': {reason}")]
    InvalidTriple {
        /// The triple as written.
        triple: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The descriptor failed validation.
    #[error("invalid board: {}", issues.join("; "))]
    Invalid {
        /// Error-level validation messages.
        issues: Vec<String>,
    },
}

/// Result type for board operations.
pub type Result<T> = std::result::Result<T, BoardError>;
