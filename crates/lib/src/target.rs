//! The target abstraction and the shared build error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fsops::FsError;
use crate::marker::MarkerError;
use crate::process::{CommandRunner, ExecError};
use crate::request::BuildRequest;
use crate::toolchain::{ToolchainError, ToolchainResolver};
use crate::variant::{Variant, VariantAxes};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("command execution failed: {0}")]
  Exec(#[from] ExecError),
  #[error("toolchain resolution failed: {0}")]
  Toolchain(#[from] ToolchainError),
  #[error("completion marker error: {0}")]
  Marker(#[from] MarkerError),
  #[error("filesystem error: {0}")]
  Fs(#[from] FsError),
  #[error("source tree not found for {target}: {path}")]
  MissingSourceTree { target: &'static str, path: PathBuf },
  #[error("a toolset version is required for Windows builds (pass --msvc)")]
  ToolsetRequired,
  #[error("failed to enter source directory: {0}")]
  Cwd(#[source] io::Error),
}

/// Shared state handed to every target during a build.
pub struct BuildContext<'a> {
  pub request: &'a BuildRequest,
  pub runner: &'a dyn CommandRunner,
  pub toolchain: &'a dyn ToolchainResolver,
}

impl BuildContext<'_> {
  /// The MSVC toolset version, which Windows paths require up front.
  pub fn toolset(&self) -> Result<&str, BuildError> {
    self
      .request
      .toolset
      .as_deref()
      .ok_or(BuildError::ToolsetRequired)
  }

  pub fn jobs(&self) -> usize {
    self.request.jobs
  }
}

/// One external dependency the pipeline can build.
///
/// Build methods run with the process working directory already inside
/// `source_dir`, so relative commands like `./bootstrap.sh` resolve.
pub trait Target {
  fn name(&self) -> &'static str;

  /// Where the dependency's sources live.
  fn source_dir(&self) -> PathBuf;

  /// Output trees discarded by a forced rebuild.
  fn clean_roots(&self) -> Vec<PathBuf>;

  /// Which matrix axes this target varies over on Windows.
  fn axes(&self) -> VariantAxes;

  /// Stage directory whose marker guards the single POSIX build.
  fn posix_stage_dir(&self) -> PathBuf;

  /// Stage directory whose marker guards one Windows variant.
  fn variant_stage_dir(&self, variant: Variant) -> PathBuf;

  /// One-time Windows setup before the variant loop.
  fn prepare_windows(&self, _ctx: &BuildContext<'_>) -> Result<(), BuildError> {
    Ok(())
  }

  fn build_posix(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError>;

  fn build_variant(&self, ctx: &BuildContext<'_>, variant: Variant) -> Result<(), BuildError>;
}
