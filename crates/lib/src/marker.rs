//! Per-variant completion markers.
//!
//! A zero-byte `build.done` file inside a variant's stage directory is the
//! only persisted state the orchestrator keeps. Its presence means the
//! variant finished successfully and can be skipped; it is written only
//! after every step of the variant succeeded, so a crashed or failed build
//! is always retried.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const MARKER_FILENAME: &str = "build.done";

#[derive(Debug, Error)]
pub enum MarkerError {
  #[error("failed to create stage directory {path}: {source}")]
  CreateDir { path: PathBuf, source: io::Error },
  #[error("failed to write completion marker {path}: {source}")]
  Write { path: PathBuf, source: io::Error },
  #[error("failed to remove {path}: {source}")]
  Clear { path: PathBuf, source: io::Error },
}

pub fn marker_path(stage_dir: &Path) -> PathBuf {
  stage_dir.join(MARKER_FILENAME)
}

/// Whether the variant staged in `stage_dir` already completed.
pub fn is_complete(stage_dir: &Path) -> bool {
  marker_path(stage_dir).is_file()
}

/// Record successful completion of the variant staged in `stage_dir`.
///
/// Creates the stage directory if the build system did not.
pub fn mark_complete(stage_dir: &Path) -> Result<(), MarkerError> {
  fs::create_dir_all(stage_dir).map_err(|source| MarkerError::CreateDir {
    path: stage_dir.to_path_buf(),
    source,
  })?;
  let path = marker_path(stage_dir);
  fs::write(&path, b"").map_err(|source| MarkerError::Write { path: path.clone(), source })?;
  debug!(marker = %path.display(), "recorded completion");
  Ok(())
}

/// Remove an output tree and any markers inside it. A missing tree is fine.
pub fn clear(output_root: &Path) -> Result<(), MarkerError> {
  match fs::remove_dir_all(output_root) {
    Ok(()) => {
      debug!(path = %output_root.display(), "cleared output tree");
      Ok(())
    }
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(MarkerError::Clear {
      path: output_root.to_path_buf(),
      source,
    }),
  }
}
