//! Running external programs.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{BuildError, Result};
use crate::plan::Invocation;

/// Runs the external programs of a plan.
pub trait CommandRunner {
    /// Run `invocation` to completion; a non-zero exit is an error.
    fn run(&mut self, invocation: &Invocation) -> Result<()>;
}

/// Spawns real processes, inheriting stdio unless redirected.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        log::info!("{invocation}");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if let Some(ref out) = invocation.stdout {
            let file = File::create(out).map_err(|source| BuildError::Io {
                path: out.clone(),
                source,
            })?;
            cmd.stdout(Stdio::from(file));
        }

        let status = cmd.status().map_err(|source| BuildError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::Failed {
                program: invocation.program.clone(),
                code: status.code(),
            })
        }
    }
}

/// Records invocations instead of running them.
///
/// Optionally fails every run with a fixed exit code, and creates a set of
/// files on each successful run so plans that expect outputs can complete.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub invocations: Vec<Invocation>,
    pub fail_with: Option<i32>,
    pub creates: Vec<PathBuf>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose every invocation exits with `code`.
    pub fn failing(code: i32) -> Self {
        Self {
            fail_with: Some(code),
            ..Self::default()
        }
    }

    /// A runner that creates `paths` whenever an invocation succeeds.
    pub fn creating(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            creates: paths.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn programs(&self) -> Vec<&str> {
        self.invocations.iter().map(|i| i.program.as_str()).collect()
    }
}

fn touch(path: &Path) -> Result<()> {
    let io = |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, b"").map_err(io)
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<()> {
        self.invocations.push(invocation.clone());
        if let Some(code) = self.fail_with {
            return Err(BuildError::Failed {
                program: invocation.program.clone(),
                code: Some(code),
            });
        }
        for path in self.creates.iter().chain(invocation.stdout.iter()) {
            touch(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(cwd: PathBuf) -> Invocation {
        Invocation {
            program: "sh".into(),
            args: vec!["-c".into(), "echo \"$PLATFORM\"".into()],
            env: vec![("PLATFORM".into(), "papa".into())],
            cwd,
            stdout: None,
        }
    }

    #[test]
    fn recording_runner_records() {
        let mut runner = RecordingRunner::new();
        runner.run(&echo(PathBuf::from("."))).unwrap();
        assert_eq!(runner.programs(), vec!["sh"]);
    }

    #[test]
    fn recording_runner_fails_on_request() {
        let mut runner = RecordingRunner::failing(101);
        let err = runner.run(&echo(PathBuf::from("."))).unwrap_err();
        assert!(matches!(err, BuildError::Failed { code: Some(101), .. }));
        assert_eq!(runner.invocations.len(), 1);
    }

    #[test]
    fn recording_runner_creates_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a/b/papa");
        let mut runner = RecordingRunner::creating([out.clone()]);
        runner.run(&echo(dir.path().to_path_buf())).unwrap();
        assert!(out.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_redirects_stdout_with_env() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let mut inv = echo(dir.path().to_path_buf());
        inv.stdout = Some(out.clone());
        SystemRunner.run(&inv).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "papa\n");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation {
            program: "sh".into(),
            args: vec!["-c".into(), "exit 3".into()],
            env: Vec::new(),
            cwd: dir.path().to_path_buf(),
            stdout: None,
        };
        let err = SystemRunner.run(&inv).unwrap_err();
        assert!(matches!(err, BuildError::Failed { code: Some(3), .. }));
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let inv = Invocation {
            program: "papa-no-such-tool".into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: dir.path().to_path_buf(),
            stdout: None,
        };
        let err = SystemRunner.run(&inv).unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
    }
}
