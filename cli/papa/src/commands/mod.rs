//! CLI command implementations.

pub mod board;
pub mod build;
pub mod clean;
pub mod doctor;
pub mod memory;
