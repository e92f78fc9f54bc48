//! End-to-end action tests for the papa board, with cargo replaced by a
//! recording runner.

use std::fs;
use std::path::Path;

use papa_board::manifest::{load_board, BOARD_FILE};
use papa_board::{BoardError, BoardOverrides};
use papa_build::{
    run_action, BuildAction, BuildError, RecordingRunner, Step, ENCODED_RUSTFLAGS,
};

const PAPA_BOARD: &str = r#"
include = "../common.toml"

[board]
platform = "papa"
target = "thumbv7m-none-eabi"
tock-arch = "cortex-m3"
"#;

const COMMON: &str = r#"
[build]
profile = "release"
"#;

fn papa_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let papa = dir.path().join("papa");
    fs::create_dir_all(&papa).unwrap();
    fs::write(papa.join(BOARD_FILE), PAPA_BOARD).unwrap();
    fs::write(papa.join("layout.ld"), "INCLUDE ../kernel_layout.ld\n").unwrap();
    fs::write(dir.path().join("common.toml"), COMMON).unwrap();
    dir
}

fn papa_dir(tree: &tempfile::TempDir) -> std::path::PathBuf {
    tree.path().join("papa")
}

#[test]
fn build_produces_release_artifact() {
    let tree = papa_tree();
    let board = load_board(&papa_dir(&tree), &BoardOverrides::default()).unwrap();
    let artifact = papa_dir(&tree).join("target/thumbv7m-none-eabi/release/papa");
    assert_eq!(board.artifact_path(), artifact);

    let mut runner = RecordingRunner::creating([artifact.clone()]);
    let outcome = run_action(BuildAction::Build, &board, &mut runner).unwrap();

    assert_eq!(outcome.commands_run, 1);
    assert_eq!(outcome.artifacts, vec![artifact]);
    let cargo = &runner.invocations[0];
    assert_eq!(cargo.env_value("TOCK_ARCH"), Some("cortex-m3"));
    let rustflags = cargo.env_value(ENCODED_RUSTFLAGS).unwrap();
    assert!(rustflags.contains("layout.ld"));
}

#[test]
fn board_under_path_with_spaces_keeps_linker_script_whole() {
    let dir = tempfile::tempdir().unwrap();
    let boards = dir.path().join("My Boards");
    let papa = boards.join("papa");
    fs::create_dir_all(&papa).unwrap();
    fs::write(papa.join(BOARD_FILE), PAPA_BOARD).unwrap();
    fs::write(papa.join("layout.ld"), "INCLUDE ../kernel_layout.ld\n").unwrap();
    fs::write(boards.join("common.toml"), COMMON).unwrap();

    let board = load_board(&papa, &BoardOverrides::default()).unwrap();
    let mut runner = RecordingRunner::creating([board.artifact_path()]);
    run_action(BuildAction::Build, &board, &mut runner).unwrap();

    let encoded = runner.invocations[0].env_value(ENCODED_RUSTFLAGS).unwrap();
    let script_arg = format!("link-arg=-T{}", papa.join("layout.ld").display());
    assert!(encoded.split('\x1f').any(|flag| flag == script_arg));
}

#[test]
fn check_produces_nothing_and_propagates_failure() {
    let tree = papa_tree();
    let board = load_board(&papa_dir(&tree), &BoardOverrides::default()).unwrap();

    let mut ok = RecordingRunner::new();
    let outcome = run_action(BuildAction::Check, &board, &mut ok).unwrap();
    assert!(outcome.artifacts.is_empty());
    assert!(!board.artifact_path().exists());

    let mut failing = RecordingRunner::failing(101);
    let err = run_action(BuildAction::Check, &board, &mut failing).unwrap_err();
    assert!(matches!(err, BuildError::Failed { code: Some(101), .. }));
}

#[test]
fn clean_is_idempotent() {
    let tree = papa_tree();
    let board = load_board(&papa_dir(&tree), &BoardOverrides::default()).unwrap();
    let artifact = board.artifact_path();
    fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    fs::write(&artifact, b"\x7fELF").unwrap();

    let mut runner = RecordingRunner::new();
    let first = run_action(BuildAction::Clean, &board, &mut runner).unwrap();
    assert_eq!(first.removed.len(), 1);
    assert!(!artifact.exists());
    assert!(!board.triple_dir().exists());

    let second = run_action(BuildAction::Clean, &board, &mut runner).unwrap();
    assert!(second.removed.is_empty());
    assert!(runner.invocations.is_empty());
}

#[test]
fn clean_leaves_other_triples_alone() {
    let tree = papa_tree();
    let board = load_board(&papa_dir(&tree), &BoardOverrides::default()).unwrap();
    let host = board.build.target_dir.join("debug");
    fs::create_dir_all(&host).unwrap();
    fs::create_dir_all(board.triple_dir()).unwrap();

    run_action(BuildAction::Clean, &board, &mut RecordingRunner::new()).unwrap();
    assert!(host.is_dir());
}

#[test]
fn unknown_arch_fails_before_anything_runs() {
    let tree = papa_tree();
    let overrides = BoardOverrides {
        tock_arch: Some("cortex-m99".into()),
        ..BoardOverrides::default()
    };
    let err = load_board(&papa_dir(&tree), &overrides).unwrap_err();
    assert!(matches!(err, BoardError::UnknownArch { .. }));
    assert!(err.to_string().contains("cortex-m99"));
}

#[test]
fn mismatched_triple_fails_validation() {
    let tree = papa_tree();
    let overrides = BoardOverrides {
        target: Some("riscv32imc-unknown-none-elf".into()),
        ..BoardOverrides::default()
    };
    let board = load_board(&papa_dir(&tree), &overrides).unwrap();
    let mut runner = RecordingRunner::new();
    let err = run_action(BuildAction::Build, &board, &mut runner).unwrap_err();
    assert!(matches!(err, BuildError::Board(BoardError::Invalid { .. })));
    assert!(runner.invocations.is_empty());
}

#[test]
fn lst_writes_listing_through_objdump() {
    let tree = papa_tree();
    let board = load_board(&papa_dir(&tree), &BoardOverrides::default()).unwrap();
    let mut runner = RecordingRunner::creating([board.artifact_path()]);
    let outcome = run_action(BuildAction::Lst, &board, &mut runner).unwrap();

    assert_eq!(runner.programs(), vec!["cargo", "arm-none-eabi-objdump"]);
    assert_eq!(
        outcome.artifacts,
        vec![board.artifact_path(), board.listing_path()]
    );
    assert!(Path::new(&board.listing_path()).is_file());
}

#[test]
fn plan_steps_are_stable_for_doc() {
    let tree = papa_tree();
    let board = load_board(&papa_dir(&tree), &BoardOverrides::default()).unwrap();
    let steps = papa_build::plan(BuildAction::Doc, &board);
    assert_eq!(steps.len(), 1);
    assert!(matches!(&steps[0], Step::Run(inv) if inv.args[0] == "doc"));
}
