//! Scoped working-directory changes.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Enters a directory on construction and restores the previous working
/// directory on drop, including on the error path.
#[derive(Debug)]
pub struct CwdGuard {
  original: PathBuf,
}

impl CwdGuard {
  pub fn enter(dir: &Path) -> io::Result<Self> {
    let original = env::current_dir()?;
    env::set_current_dir(dir)?;
    Ok(Self { original })
  }
}

impl Drop for CwdGuard {
  fn drop(&mut self) {
    if let Err(err) = env::set_current_dir(&self.original) {
      warn!(
        dir = %self.original.display(),
        error = %err,
        "failed to restore working directory"
      );
    }
  }
}
