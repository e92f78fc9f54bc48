//! `Board.toml` parsing, include merging, and resolution.
//!
//! A board directory carries a `Board.toml` that declares the board's
//! identifiers and, optionally, includes a shared sibling file holding build
//! settings common to every board:
//!
//! ```toml
//! include = "../common.toml"
//!
//! [board]
//! platform = "papa"
//! target = "thumbv7m-none-eabi"
//! tock-arch = "cortex-m3"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::arch::TockArch;
use crate::board::{Board, BoardDescriptor, BuildProfile, BuildSettings, Toolchain};
use crate::error::{BoardError, Result};
use crate::triple::TargetTriple;

/// File name searched for in board directories.
pub const BOARD_FILE: &str = "Board.toml";

/// The `Board.toml` file as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardManifest {
    /// Shared settings file, relative to the board directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<PathBuf>,
    /// Board identifiers (required).
    pub board: BoardSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// `[board]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardSection {
    pub platform: String,
    /// Defaults to the architecture's usual triple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub tock_arch: String,
}

/// `[build]` section; shared with the included file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linker_script: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rustflags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

/// `[tools]` section; shared with the included file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objdump: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objcopy: Option<String>,
}

/// The included shared file: build and tool settings, no identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SharedSettings {
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// Values that replace the manifest's before resolution (command-line flags,
/// `TARGET`/`PLATFORM`/`TOCK_ARCH` environment variables).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardOverrides {
    pub target: Option<String>,
    pub platform: Option<String>,
    pub tock_arch: Option<String>,
    pub profile: Option<String>,
}

impl BuildSection {
    /// Layer `self` over `base`: scalars from `self` win, lists concatenate
    /// base-first.
    fn over(self, base: BuildSection) -> BuildSection {
        BuildSection {
            profile: self.profile.or(base.profile),
            target_dir: self.target_dir.or(base.target_dir),
            linker_script: self.linker_script.or(base.linker_script),
            rustflags: base.rustflags.into_iter().chain(self.rustflags).collect(),
            features: base.features.into_iter().chain(self.features).collect(),
        }
    }
}

impl ToolsSection {
    fn over(self, base: ToolsSection) -> ToolsSection {
        ToolsSection {
            cargo: self.cargo.or(base.cargo),
            objdump: self.objdump.or(base.objdump),
            objcopy: self.objcopy.or(base.objcopy),
        }
    }
}

impl BoardManifest {
    /// Manifest equivalent of a bare descriptor.
    pub fn from_descriptor(desc: &BoardDescriptor) -> Self {
        Self {
            include: None,
            board: BoardSection {
                platform: desc.platform.clone(),
                target: Some(desc.target.to_string()),
                tock_arch: desc.tock_arch.to_string(),
            },
            build: BuildSection {
                profile: Some(desc.profile.dir_name().into()),
                ..BuildSection::default()
            },
            tools: ToolsSection::default(),
        }
    }

    /// Manifest describing an already resolved board, includes and defaults
    /// folded in.
    pub fn from_board(board: &Board) -> Self {
        let mut manifest = Self::from_descriptor(&board.descriptor);
        manifest.build.target_dir = Some(board.build.target_dir.clone());
        manifest.build.linker_script = board.build.linker_script.clone();
        manifest.build.rustflags = board.build.rustflags.clone();
        manifest.build.features = board.build.features.clone();
        manifest.tools = ToolsSection {
            cargo: Some(board.tools.cargo.clone()),
            objdump: Some(board.tools.objdump.clone()),
            objcopy: Some(board.tools.objcopy.clone()),
        };
        manifest
    }

    /// Search upward from `start_dir` for a `Board.toml` file, parse it and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(BOARD_FILE);
            if candidate.is_file() {
                let manifest = load_board_toml(&candidate)?;
                log::debug!("using {}", candidate.display());
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Merge the included shared file, if any, into this manifest.
    ///
    /// Only one level of inclusion is followed; an `include` key inside the
    /// shared file is not recognised.
    pub fn with_includes(mut self, board_dir: &Path) -> Result<Self> {
        let Some(include) = self.include.take() else {
            return Ok(self);
        };
        let path = board_dir.join(&include);
        if !path.is_file() {
            return Err(BoardError::NotFound { path });
        }
        let content = std::fs::read_to_string(&path)?;
        let shared: SharedSettings = toml::from_str(&content)?;
        log::debug!("included {}", path.display());

        self.build = self.build.over(shared.build);
        self.tools = self.tools.over(shared.tools);
        Ok(self)
    }

    /// Resolve into a typed [`Board`] rooted at `board_dir`.
    ///
    /// Fails on an unknown architecture tag or a malformed triple; there is
    /// no fallback architecture.
    pub fn resolve(&self, board_dir: &Path, overrides: &BoardOverrides) -> Result<Board> {
        let platform = overrides
            .platform
            .clone()
            .unwrap_or_else(|| self.board.platform.clone());

        let arch_tag = overrides
            .tock_arch
            .as_deref()
            .unwrap_or(&self.board.tock_arch);
        let tock_arch: TockArch = arch_tag.parse()?;

        let target = match overrides.target.as_deref().or(self.board.target.as_deref()) {
            Some(t) => TargetTriple::parse(t)?,
            None => TargetTriple::parse(&tock_arch.default_triple())?,
        };

        let profile = match overrides.profile.as_deref().or(self.build.profile.as_deref()) {
            Some(p) => BuildProfile::parse(p).ok_or_else(|| BoardError::Invalid {
                issues: vec![format!("unknown build profile '{p}' (expected release or debug)")],
            })?,
            None => BuildProfile::default(),
        };

        let descriptor = BoardDescriptor {
            platform,
            target,
            tock_arch,
            profile,
        };

        let target_dir = board_dir.join(
            self.build
                .target_dir
                .as_deref()
                .unwrap_or(Path::new("target")),
        );
        let linker_script = match self.build.linker_script {
            Some(ref script) => Some(board_dir.join(script)),
            None => Some(board_dir.join("layout.ld")).filter(|p| p.is_file()),
        };

        let defaults = Toolchain::for_arch(tock_arch);
        let tools = Toolchain {
            cargo: self.tools.cargo.clone().unwrap_or(defaults.cargo),
            objdump: self.tools.objdump.clone().unwrap_or(defaults.objdump),
            objcopy: self.tools.objcopy.clone().unwrap_or(defaults.objcopy),
        };

        Ok(Board {
            root: board_dir.to_path_buf(),
            descriptor,
            build: BuildSettings {
                target_dir,
                linker_script,
                rustflags: self.build.rustflags.clone(),
                features: self.build.features.clone(),
            },
            tools,
        })
    }
}

/// Load a board manifest from a file.
pub fn load_board_toml(path: &Path) -> Result<BoardManifest> {
    if !path.exists() {
        return Err(BoardError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_board_toml(&content)
}

/// Parse a board manifest from a TOML string.
pub fn parse_board_toml(toml_str: &str) -> Result<BoardManifest> {
    let manifest: BoardManifest = toml::from_str(toml_str)?;
    Ok(manifest)
}

/// Serialize a board manifest to pretty TOML.
pub fn board_to_toml(manifest: &BoardManifest) -> Result<String> {
    let toml_str = toml::to_string_pretty(manifest)?;
    Ok(toml_str)
}

/// Locate and resolve the board for `start_dir`.
///
/// Uses the nearest `Board.toml` (with its include merged); without one,
/// falls back to the built-in papa descriptor rooted at `start_dir`.
pub fn load_board(start_dir: &Path, overrides: &BoardOverrides) -> Result<Board> {
    let (manifest, dir) = match BoardManifest::find_and_load(start_dir)? {
        Some((manifest, dir)) => (manifest.with_includes(&dir)?, dir),
        None => {
            log::debug!(
                "no {BOARD_FILE} above {}; using built-in papa board",
                start_dir.display()
            );
            (
                BoardManifest::from_descriptor(&BoardDescriptor::papa()),
                start_dir.to_path_buf(),
            )
        }
    };
    manifest.resolve(&dir, overrides)
}

/// Generate a starter `Board.toml`.
pub fn template(platform: &str, arch: TockArch) -> Result<String> {
    let manifest = BoardManifest {
        include: None,
        board: BoardSection {
            platform: platform.into(),
            target: Some(arch.default_triple()),
            tock_arch: arch.to_string(),
        },
        build: BuildSection {
            profile: Some("release".into()),
            linker_script: Some("layout.ld".into()),
            ..BuildSection::default()
        },
        tools: ToolsSection::default(),
    };
    board_to_toml(&manifest)
}

/// Discover every `<root>/<name>/Board.toml`.
///
/// Returns a list of (directory name, file path) pairs sorted by name.
pub fn discover_boards(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut boards = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path().join(BOARD_FILE);
        if !path.is_file() {
            continue;
        }
        let name = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());
        if let Some(name) = name {
            boards.push((name.to_string(), path));
        }
    }
    boards.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(boards)
}
