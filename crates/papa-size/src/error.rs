//! Errors from the memory usage report.

use thiserror::Error;

/// Convenience alias for results within the size crate.
pub type Result<T> = std::result::Result<T, SizeError>;

/// Errors that can occur while inspecting a kernel image.
#[derive(Debug, Error)]
pub enum SizeError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' failed: {stderr}")]
    ObjdumpFailed { program: String, stderr: String },

    #[error("could not detect the file format of {elf}")]
    UnknownFormat { elf: String },

    #[error("{found} architecture not supported, only {expected} supported")]
    UnsupportedFormat { found: String, expected: String },

    #[error("section .{name} not found in objdump output")]
    MissingSection { name: &'static str },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
