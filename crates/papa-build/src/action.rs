//! Build actions a board forwards to the build system.

use std::fmt;
use std::str::FromStr;

/// A named build action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildAction {
    /// Compile and link the kernel ELF.
    Build,
    /// Type-check without producing the kernel image.
    Check,
    /// Remove everything built for the board's triple.
    Clean,
    /// Generate documentation.
    Doc,
    /// Build, then convert the ELF to a raw binary image.
    Bin,
    /// Build, then write a disassembly listing.
    Lst,
}

impl BuildAction {
    pub const ALL: [BuildAction; 6] = [
        BuildAction::Build,
        BuildAction::Check,
        BuildAction::Clean,
        BuildAction::Doc,
        BuildAction::Bin,
        BuildAction::Lst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuildAction::Build => "build",
            BuildAction::Check => "check",
            BuildAction::Clean => "clean",
            BuildAction::Doc => "doc",
            BuildAction::Bin => "bin",
            BuildAction::Lst => "lst",
        }
    }

    /// Whether the action needs a linked kernel ELF.
    pub fn needs_kernel(self) -> bool {
        matches!(
            self,
            BuildAction::Build | BuildAction::Bin | BuildAction::Lst
        )
    }
}

impl fmt::Display for BuildAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown build action '{s}'"))
    }
}
