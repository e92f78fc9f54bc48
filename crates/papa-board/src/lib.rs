//! Board configuration descriptor for Tock boards.
//!
//! A board is identified by three values that the build consumes:
//! - **Target triple:** selects the cross-compilation toolchain
//! - **Platform:** selects board-specific startup and linker assets
//! - **Architecture tag:** selects core-specific startup and trap code
//!
//! The values come from a `Board.toml` file (optionally including a shared
//! sibling file) or from the built-in descriptors, and are validated before
//! any build action is delegated.

pub mod arch;
pub mod board;
pub mod error;
pub mod manifest;
pub mod triple;

pub use arch::{ArchFamily, TockArch};
pub use board::{
    builtin_boards, resolve_builtin, validate_descriptor, Board, BoardDescriptor, BuildProfile,
    BuildSettings, Severity, Toolchain, ValidationIssue,
};
pub use error::{BoardError, Result};
pub use manifest::{BoardManifest, BoardOverrides};
pub use triple::TargetTriple;
