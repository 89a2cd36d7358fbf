//! Synchronous external command execution.
//!
//! Every build step is a shell command line executed through the host shell
//! so that composed lines (`a && b`, `a & b`, `call script.bat`) behave the
//! way the underlying build systems expect. Output streams are inherited;
//! the orchestrator never captures build output.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExecError {
  #[error("command failed with exit code {code:?}: {cmd}")]
  CommandFailed { cmd: String, code: Option<i32> },
  #[error("failed to spawn command: {0}")]
  Spawn(#[from] io::Error),
}

/// One external command, with its working directory and environment overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub command: String,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
}

impl Invocation {
  pub fn new(command: impl Into<String>) -> Self {
    Self {
      command: command.into(),
      cwd: None,
      env: BTreeMap::new(),
    }
  }

  pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn envs(mut self, vars: BTreeMap<String, String>) -> Self {
    self.env.extend(vars);
    self
  }
}

/// Executes invocations. The production implementation shells out; tests
/// substitute a recording fake.
pub trait CommandRunner {
  fn run(&self, invocation: &Invocation) -> Result<(), ExecError>;
}

/// Runs invocations through the host shell, blocking until completion.
#[derive(Debug, Default)]
pub struct ShellRunner;

fn shell_command() -> (&'static str, &'static [&'static str]) {
  if cfg!(windows) {
    ("cmd.exe", &["/C"])
  } else {
    ("/bin/sh", &["-c"])
  }
}

impl CommandRunner for ShellRunner {
  fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
    let (shell, args) = shell_command();
    let mut command = Command::new(shell);
    command
      .args(args)
      .arg(&invocation.command)
      .stdin(Stdio::inherit())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit());
    if let Some(cwd) = &invocation.cwd {
      command.current_dir(cwd);
    }
    // Overlay on top of the inherited environment; resolved MSVC variables
    // shadow whatever the parent process carries.
    for (key, value) in &invocation.env {
      command.env(key, value);
    }
    debug!(command = %invocation.command, "executing");
    let status = command.status()?;
    if status.success() {
      Ok(())
    } else {
      Err(ExecError::CommandFailed {
        cmd: invocation.command.clone(),
        code: status.code(),
      })
    }
  }
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;

  #[test]
  fn successful_command_returns_ok() {
    let runner = ShellRunner;
    runner.run(&Invocation::new("true")).unwrap();
  }

  #[test]
  fn failure_carries_exit_code_and_command() {
    let runner = ShellRunner;
    let err = runner.run(&Invocation::new("exit 3")).unwrap_err();
    match err {
      ExecError::CommandFailed { cmd, code } => {
        assert_eq!(cmd, "exit 3");
        assert_eq!(code, Some(3));
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn working_directory_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ShellRunner;
    runner
      .run(&Invocation::new("touch here.txt").in_dir(dir.path()))
      .unwrap();
    assert!(dir.path().join("here.txt").is_file());
  }

  #[test]
  fn environment_overlay_reaches_the_child() {
    let dir = tempfile::tempdir().unwrap();
    let runner = ShellRunner;
    runner
      .run(
        &Invocation::new("printf %s \"$DEPFORGE_PROBE\" > probe.txt")
          .in_dir(dir.path())
          .env("DEPFORGE_PROBE", "overlay"),
      )
      .unwrap();
    let written = std::fs::read_to_string(dir.path().join("probe.txt")).unwrap();
    assert_eq!(written, "overlay");
  }
}
