//! Delegated build actions for Tock boards.
//!
//! A build action is turned into a plan of [`Step`]s parameterised by the
//! board's target triple, platform and architecture, then executed through a
//! [`CommandRunner`]. Compilation itself is delegated to cargo; this crate
//! only decides what to invoke and checks that the expected outputs appear.

pub mod action;
pub mod error;
pub mod exec;
pub mod plan;
pub mod runner;

pub use action::BuildAction;
pub use error::{BuildError, Result};
pub use exec::{execute, run_action, Outcome};
pub use plan::{plan, rustflags, Invocation, Step, ENCODED_RUSTFLAGS};
pub use runner::{CommandRunner, RecordingRunner, SystemRunner};
