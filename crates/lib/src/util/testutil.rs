//! Test doubles shared across the crate's unit tests.

use std::cell::RefCell;

use crate::process::{CommandRunner, ExecError, Invocation};
use crate::toolchain::{ToolchainEnv, ToolchainError, ToolchainResolver};
use crate::variant::Arch;

/// Records every invocation instead of executing it, optionally failing
/// the first command containing a given substring.
#[derive(Debug, Default)]
pub struct RecordingRunner {
  invocations: RefCell<Vec<Invocation>>,
  fail_on: Option<String>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_on(substring: impl Into<String>) -> Self {
    Self {
      invocations: RefCell::new(Vec::new()),
      fail_on: Some(substring.into()),
    }
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.invocations.borrow().clone()
  }

  pub fn commands(&self) -> Vec<String> {
    self
      .invocations
      .borrow()
      .iter()
      .map(|inv| inv.command.clone())
      .collect()
  }

  pub fn count(&self) -> usize {
    self.invocations.borrow().len()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
    self.invocations.borrow_mut().push(invocation.clone());
    if let Some(needle) = &self.fail_on {
      if invocation.command.contains(needle.as_str()) {
        return Err(ExecError::CommandFailed {
          cmd: invocation.command.clone(),
          code: Some(2),
        });
      }
    }
    Ok(())
  }
}

/// Resolves a canned environment, or fails every lookup.
#[derive(Debug, Default)]
pub struct FakeToolchain {
  fail: bool,
}

impl FakeToolchain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn unavailable() -> Self {
    Self { fail: true }
  }
}

impl ToolchainResolver for FakeToolchain {
  fn resolve(&self, arch: Arch, toolset: &str) -> Result<ToolchainEnv, ToolchainError> {
    if self.fail {
      return Err(ToolchainError::NotFound {
        toolset: toolset.to_string(),
        arch,
      });
    }
    let mut env = ToolchainEnv::new();
    env.insert("PATH".to_string(), format!("C:\\VC\\{toolset}\\{arch}\\bin"));
    env.insert("INCLUDE".to_string(), "C:\\VC\\include".to_string());
    Ok(env)
  }
}
