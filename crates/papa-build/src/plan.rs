//! Translate a build action into concrete steps.

use std::fmt;
use std::path::PathBuf;

use papa_board::{ArchFamily, Board, BuildProfile};

use crate::action::BuildAction;

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables, on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Redirect standard output to this file instead of inheriting it.
    pub stdout: Option<PathBuf>,
}

impl Invocation {
    fn new(program: &str, cwd: PathBuf) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: Vec::new(),
            cwd,
            stdout: None,
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    /// Value of an environment variable set by this invocation.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Cargo reads this instead of `RUSTFLAGS` and splits it only on `\x1f`, so
/// flags may contain spaces.
pub const ENCODED_RUSTFLAGS: &str = "CARGO_ENCODED_RUSTFLAGS";

fn shell_quote(s: &str) -> String {
    if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
        format!("'{}'", s.replace('\'', r"'\''"))
    } else {
        s.to_string()
    }
}

/// Renders as a shell command line, for logs.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.env {
            write!(f, "{k}={} ", shell_quote(&v.replace('\x1f', " ")))?;
        }
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        if let Some(ref out) = self.stdout {
            write!(f, " > {}", shell_quote(&out.display().to_string()))?;
        }
        Ok(())
    }
}

/// One step of an action plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run an external program; a non-zero exit ends the plan.
    Run(Invocation),
    /// Remove a directory tree if it exists.
    RemoveDir(PathBuf),
    /// Fail unless the file exists.
    ExpectArtifact(PathBuf),
}

/// `RUSTFLAGS` for building the kernel of `board`.
pub fn rustflags(board: &Board) -> Vec<String> {
    let mut flags = Vec::new();
    if let Some(ref script) = board.build.linker_script {
        flags.push("-C".to_string());
        flags.push(format!("link-arg=-T{}", script.display()));
    }
    flags.extend(
        ["-C", "linker=rust-lld", "-C", "linker-flavor=ld.lld"]
            .iter()
            .map(|s| s.to_string()),
    );
    if board.descriptor.tock_arch.family() == ArchFamily::Arm {
        flags.extend(
            [
                "-C",
                "relocation-model=dynamic-no-pic",
                "-C",
                "link-arg=-zmax-page-size=512",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
    }
    flags.extend(board.build.rustflags.iter().cloned());
    flags
}

fn cargo(board: &Board, subcommand: &str) -> Invocation {
    let desc = &board.descriptor;
    let mut inv = Invocation::new(&board.tools.cargo, board.root.clone()).arg(subcommand);
    if desc.profile == BuildProfile::Release {
        inv = inv.arg("--release");
    }
    inv = inv
        .arg("--target")
        .arg(desc.target.as_str())
        .arg("--target-dir")
        .arg(board.build.target_dir.display().to_string());
    if !board.build.features.is_empty() {
        inv = inv.arg("--features").arg(board.build.features.join(","));
    }
    for (k, v) in desc.env_vars() {
        inv = inv.env(k, v);
    }
    inv.env(ENCODED_RUSTFLAGS, rustflags(board).join("\x1f"))
}

fn build_steps(board: &Board) -> Vec<Step> {
    vec![
        Step::Run(cargo(board, "build")),
        Step::ExpectArtifact(board.artifact_path()),
    ]
}

/// Plan the steps for `action` on `board`.
pub fn plan(action: BuildAction, board: &Board) -> Vec<Step> {
    match action {
        BuildAction::Build => build_steps(board),
        BuildAction::Check => vec![Step::Run(cargo(board, "check"))],
        BuildAction::Doc => {
            let mut doc = cargo(board, "doc");
            doc.args.push("--document-private-items".into());
            vec![Step::Run(doc)]
        }
        BuildAction::Clean => vec![Step::RemoveDir(board.triple_dir())],
        BuildAction::Bin => {
            let elf = board.artifact_path();
            let bin = board.binary_path();
            let mut steps = build_steps(board);
            steps.push(Step::Run(
                Invocation::new(&board.tools.objcopy, board.root.clone())
                    .arg("--output-target=binary")
                    .arg(elf.display().to_string())
                    .arg(bin.display().to_string()),
            ));
            steps.push(Step::ExpectArtifact(bin));
            steps
        }
        BuildAction::Lst => {
            let elf = board.artifact_path();
            let lst = board.listing_path();
            let mut steps = build_steps(board);
            let mut objdump = Invocation::new(&board.tools.objdump, board.root.clone())
                .arg("--disassemble-all")
                .arg("--source")
                .arg("--section-headers")
                .arg("--demangle")
                .arg(elf.display().to_string());
            objdump.stdout = Some(lst.clone());
            steps.push(Step::Run(objdump));
            steps.push(Step::ExpectArtifact(lst));
            steps
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use papa_board::{BoardDescriptor, TockArch, TargetTriple};

    use super::*;

    fn papa() -> Board {
        Board::from_descriptor(BoardDescriptor::papa(), Path::new("/src/boards/papa"))
    }

    fn first_run(steps: &[Step]) -> &Invocation {
        match &steps[0] {
            Step::Run(inv) => inv,
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn build_plan_for_papa() {
        let board = papa();
        let steps = plan(BuildAction::Build, &board);
        assert_eq!(steps.len(), 2);

        let cargo = first_run(&steps);
        assert_eq!(cargo.program, "cargo");
        assert_eq!(
            cargo.args,
            vec![
                "build",
                "--release",
                "--target",
                "thumbv7m-none-eabi",
                "--target-dir",
                "/src/boards/papa/target",
            ]
        );
        assert_eq!(cargo.cwd, Path::new("/src/boards/papa"));
        assert_eq!(cargo.env_value("TARGET"), Some("thumbv7m-none-eabi"));
        assert_eq!(cargo.env_value("PLATFORM"), Some("papa"));
        assert_eq!(cargo.env_value("TOCK_ARCH"), Some("cortex-m3"));

        assert_eq!(
            steps[1],
            Step::ExpectArtifact(PathBuf::from(
                "/src/boards/papa/target/thumbv7m-none-eabi/release/papa"
            ))
        );
    }

    #[test]
    fn check_plan_expects_no_artifact() {
        let steps = plan(BuildAction::Check, &papa());
        assert_eq!(steps.len(), 1);
        assert_eq!(first_run(&steps).args[0], "check");
    }

    #[test]
    fn doc_plan_documents_private_items() {
        let steps = plan(BuildAction::Doc, &papa());
        let doc = first_run(&steps);
        assert_eq!(doc.args[0], "doc");
        assert!(doc.args.iter().any(|a| a == "--document-private-items"));
    }

    #[test]
    fn clean_plan_removes_triple_dir() {
        let steps = plan(BuildAction::Clean, &papa());
        assert_eq!(
            steps,
            vec![Step::RemoveDir(PathBuf::from(
                "/src/boards/papa/target/thumbv7m-none-eabi"
            ))]
        );
    }

    #[test]
    fn debug_profile_drops_release_flag() {
        let mut board = papa();
        board.descriptor.profile = BuildProfile::Debug;
        let steps = plan(BuildAction::Build, &board);
        assert!(!first_run(&steps).args.iter().any(|a| a == "--release"));
        assert_eq!(
            steps[1],
            Step::ExpectArtifact(PathBuf::from(
                "/src/boards/papa/target/thumbv7m-none-eabi/debug/papa"
            ))
        );
    }

    #[test]
    fn features_are_joined() {
        let mut board = papa();
        board.build.features = vec!["with_ctap1".into(), "vendor_hid".into()];
        let steps = plan(BuildAction::Check, &board);
        let args = &first_run(&steps).args;
        let pos = args.iter().position(|a| a == "--features").unwrap();
        assert_eq!(args[pos + 1], "with_ctap1,vendor_hid");
    }

    #[test]
    fn bin_plan_runs_objcopy_after_build() {
        let steps = plan(BuildAction::Bin, &papa());
        assert_eq!(steps.len(), 4);
        match &steps[2] {
            Step::Run(inv) => {
                assert_eq!(inv.program, "arm-none-eabi-objcopy");
                assert_eq!(inv.args[0], "--output-target=binary");
            }
            other => panic!("expected objcopy, got {other:?}"),
        }
        assert_eq!(
            steps[3],
            Step::ExpectArtifact(PathBuf::from(
                "/src/boards/papa/target/thumbv7m-none-eabi/release/papa.bin"
            ))
        );
    }

    #[test]
    fn lst_plan_redirects_objdump() {
        let steps = plan(BuildAction::Lst, &papa());
        match &steps[2] {
            Step::Run(inv) => {
                assert_eq!(inv.program, "arm-none-eabi-objdump");
                assert_eq!(
                    inv.args[..4],
                    ["--disassemble-all", "--source", "--section-headers", "--demangle"]
                );
                assert_eq!(
                    inv.stdout.as_deref(),
                    Some(Path::new(
                        "/src/boards/papa/target/thumbv7m-none-eabi/release/papa.lst"
                    ))
                );
            }
            other => panic!("expected objdump, got {other:?}"),
        }
    }

    #[test]
    fn arm_rustflags() {
        let mut board = papa();
        board.build.linker_script = Some(PathBuf::from("/src/boards/papa/layout.ld"));
        board.build.rustflags = vec!["-C".into(), "opt-level=z".into()];
        let flags = rustflags(&board).join(" ");
        assert_eq!(
            flags,
            "-C link-arg=-T/src/boards/papa/layout.ld -C linker=rust-lld -C linker-flavor=ld.lld \
             -C relocation-model=dynamic-no-pic -C link-arg=-zmax-page-size=512 -C opt-level=z"
        );
    }

    #[test]
    fn linker_script_path_with_spaces_stays_one_flag() {
        let root = Path::new("/home/dev/My Boards/papa");
        let mut board = Board::from_descriptor(BoardDescriptor::papa(), root);
        board.build.linker_script = Some(root.join("layout.ld"));
        let steps = plan(BuildAction::Build, &board);

        let encoded = first_run(&steps).env_value(ENCODED_RUSTFLAGS).unwrap();
        let flags: Vec<&str> = encoded.split('\x1f').collect();
        assert_eq!(&flags[..2], ["-C", "link-arg=-T/home/dev/My Boards/papa/layout.ld"]);
        assert_eq!(flags, rustflags(&board));
        assert!(first_run(&steps).env_value("RUSTFLAGS").is_none());
    }

    #[test]
    fn riscv_rustflags_skip_arm_relocation_model() {
        let desc = BoardDescriptor::new(
            "arty",
            TargetTriple::parse("riscv32imac-unknown-none-elf").unwrap(),
            TockArch::Rv32imac,
        );
        let board = Board::from_descriptor(desc, Path::new("/b"));
        let flags = rustflags(&board);
        assert!(!flags.iter().any(|f| f.contains("relocation-model")));
        assert!(flags.iter().any(|f| f == "linker=rust-lld"));
    }

    #[test]
    fn display_quotes_rustflags() {
        let steps = plan(BuildAction::Check, &papa());
        let line = first_run(&steps).to_string();
        assert!(line.starts_with("TARGET=thumbv7m-none-eabi PLATFORM=papa TOCK_ARCH=cortex-m3 "));
        assert!(line.contains("CARGO_ENCODED_RUSTFLAGS='-C linker=rust-lld -C linker-flavor=ld.lld"));
        assert!(line.ends_with("--target-dir /src/boards/papa/target"));
    }
}
