//! Board descriptor and resolved board model.
//!
//! A [`BoardDescriptor`] carries the identifiers a board declares. A
//! [`Board`] adds everything needed to drive a build for it: where the
//! board lives, where output goes, which flags and tools to use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::arch::TockArch;
use crate::error::{BoardError, Result};
use crate::triple::TargetTriple;

/// Cargo build profile; also names the output sub-directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildProfile {
    #[default]
    Release,
    Debug,
}

impl BuildProfile {
    pub fn dir_name(self) -> &'static str {
        match self {
            BuildProfile::Release => "release",
            BuildProfile::Debug => "debug",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "release" => Some(BuildProfile::Release),
            "debug" | "dev" => Some(BuildProfile::Debug),
            _ => None,
        }
    }
}

/// The identifiers a board declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardDescriptor {
    /// Board name, e.g. "papa". Keys board-specific sources and the output file name.
    pub platform: String,
    /// Cross-compilation target triple.
    pub target: TargetTriple,
    /// CPU core family.
    pub tock_arch: TockArch,
    /// Build profile for output paths.
    pub profile: BuildProfile,
}

impl BoardDescriptor {
    pub fn new(platform: impl Into<String>, target: TargetTriple, tock_arch: TockArch) -> Self {
        Self {
            platform: platform.into(),
            target,
            tock_arch,
            profile: BuildProfile::Release,
        }
    }

    /// The papa board: a Cortex-M3 part built for `thumbv7m-none-eabi`.
    pub fn papa() -> Self {
        let arch = TockArch::CortexM3;
        let target = TargetTriple::parse(&arch.default_triple())
            .unwrap_or_else(|_| unreachable!("default triples are well-formed"));
        Self::new("papa", target, arch)
    }

    /// Variables exported to every delegated build invocation.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("TARGET", self.target.to_string()),
            ("PLATFORM", self.platform.clone()),
            ("TOCK_ARCH", self.tock_arch.to_string()),
        ]
    }

    /// `<target_dir>/<triple>/<profile>`
    pub fn output_dir(&self, target_dir: &Path) -> PathBuf {
        target_dir
            .join(self.target.as_str())
            .join(self.profile.dir_name())
    }

    /// The kernel ELF, e.g. `target/thumbv7m-none-eabi/release/papa`.
    pub fn artifact_path(&self, target_dir: &Path) -> PathBuf {
        self.output_dir(target_dir).join(&self.platform)
    }

    /// Raw binary image next to the ELF.
    pub fn binary_path(&self, target_dir: &Path) -> PathBuf {
        self.output_dir(target_dir)
            .join(format!("{}.bin", self.platform))
    }

    /// Disassembly listing next to the ELF.
    pub fn listing_path(&self, target_dir: &Path) -> PathBuf {
        self.output_dir(target_dir)
            .join(format!("{}.lst", self.platform))
    }
}

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A validation issue found in a board definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

/// Validate a descriptor against the architectures the build recognises.
///
/// Returns `Ok(())` if there is nothing to report, or `Err(issues)` with
/// every error and warning found.
pub fn validate_descriptor(desc: &BoardDescriptor) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if desc.platform.is_empty() {
        issues.push(ValidationIssue::error("platform name is empty".into()));
    } else if !desc
        .platform
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        issues.push(ValidationIssue::error(format!(
            "platform name '{}' may only contain lowercase letters, digits, '_' and '-'",
            desc.platform
        )));
    }

    if !desc.tock_arch.accepts_isa(desc.target.isa()) {
        issues.push(ValidationIssue::error(format!(
            "target triple '{}' does not match architecture '{}' (expected an {} triple such as {})",
            desc.target,
            desc.tock_arch,
            desc.tock_arch.isa(),
            desc.tock_arch.default_triple()
        )));
    }

    if !desc.target.is_bare_metal() {
        issues.push(ValidationIssue::warning(format!(
            "target triple '{}' is not a bare-metal triple (os '{}')",
            desc.target,
            desc.target.os()
        )));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Build settings shared by every action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSettings {
    /// Cargo target directory (absolute or relative to the working directory).
    pub target_dir: PathBuf,
    /// Linker script passed to the linker, if any.
    pub linker_script: Option<PathBuf>,
    /// Extra `RUSTFLAGS`, appended after the board defaults.
    pub rustflags: Vec<String>,
    /// Cargo features to enable.
    pub features: Vec<String>,
}

/// External programs the build delegates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toolchain {
    pub cargo: String,
    pub objdump: String,
    pub objcopy: String,
}

impl Toolchain {
    /// Default tools for an architecture: `cargo` plus the cross binutils.
    pub fn for_arch(arch: TockArch) -> Self {
        let prefix = arch.binutils_prefix();
        Self {
            cargo: "cargo".into(),
            objdump: format!("{prefix}objdump"),
            objcopy: format!("{prefix}objcopy"),
        }
    }
}

/// A fully resolved board: descriptor plus everything needed to build it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    /// Directory containing the board's crate (cargo runs here).
    pub root: PathBuf,
    pub descriptor: BoardDescriptor,
    pub build: BuildSettings,
    pub tools: Toolchain,
}

impl Board {
    /// Resolve a board from a bare descriptor, using defaults for everything
    /// else. A `layout.ld` in `root` is picked up as the linker script.
    pub fn from_descriptor(descriptor: BoardDescriptor, root: &Path) -> Self {
        let layout = root.join("layout.ld");
        let tools = Toolchain::for_arch(descriptor.tock_arch);
        Self {
            root: root.to_path_buf(),
            build: BuildSettings {
                target_dir: root.join("target"),
                linker_script: layout.is_file().then_some(layout),
                rustflags: Vec::new(),
                features: Vec::new(),
            },
            descriptor,
            tools,
        }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.descriptor.artifact_path(&self.build.target_dir)
    }

    pub fn binary_path(&self) -> PathBuf {
        self.descriptor.binary_path(&self.build.target_dir)
    }

    pub fn listing_path(&self) -> PathBuf {
        self.descriptor.listing_path(&self.build.target_dir)
    }

    /// `<target_dir>/<triple>`: everything produced for this board's triple.
    pub fn triple_dir(&self) -> PathBuf {
        self.build.target_dir.join(self.descriptor.target.as_str())
    }

    /// Descriptor validation plus checks on the resolved settings.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationIssue>> {
        let mut issues = validate_descriptor(&self.descriptor).err().unwrap_or_default();

        if let Some(ref script) = self.build.linker_script {
            if !script.is_file() {
                issues.push(ValidationIssue::warning(format!(
                    "linker script {} does not exist",
                    script.display()
                )));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Fail on error-level issues, logging warnings.
    pub fn ensure_valid(&self) -> Result<()> {
        let Err(issues) = self.validate() else {
            return Ok(());
        };
        let mut errors = Vec::new();
        for issue in issues {
            match issue.severity {
                Severity::Warning => log::warn!("{}", issue.message),
                Severity::Error => errors.push(issue.message),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BoardError::Invalid { issues: errors })
        }
    }
}

/// Resolve a built-in board name to its descriptor.
pub fn resolve_builtin(name: &str) -> Option<BoardDescriptor> {
    match name {
        "papa" => Some(BoardDescriptor::papa()),
        _ => None,
    }
}

/// List all built-in boards.
pub fn builtin_boards() -> Vec<(&'static str, &'static str)> {
    vec![("papa", "papa development board (Cortex-M3, thumbv7m-none-eabi)")]
}
