//! Directory layout of the host project.
//!
//! All dependency sources live under `extern/`, and a handful of shared
//! build assets live elsewhere in the tree. Centralizing the paths keeps
//! the target orchestrators free of string plumbing.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectLayout {
  root: PathBuf,
}

impl ProjectLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn extern_dir(&self) -> PathBuf {
    self.root.join("extern")
  }

  pub fn boost_dir(&self) -> PathBuf {
    self.extern_dir().join("boost")
  }

  pub fn openssl_dir(&self) -> PathBuf {
    self.extern_dir().join("openssl")
  }

  pub fn v8_dir(&self) -> PathBuf {
    self.extern_dir().join("v8")
  }

  pub fn zlib_dir(&self) -> PathBuf {
    self.extern_dir().join("zlib")
  }

  /// Shared gyp checkout used by the V8 build.
  pub fn gyp_dir(&self) -> PathBuf {
    self.root.join("build").join("tools").join("gyp")
  }

  /// gyp include file that disables cygwin path munging on Windows.
  pub fn nocygwin_gypi(&self) -> PathBuf {
    self.extern_dir().join("nocygwin.gypi")
  }
}
