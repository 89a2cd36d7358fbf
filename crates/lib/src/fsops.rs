//! Filesystem relocation of build outputs.
//!
//! Build systems leave their artifacts in tool-specific places; these
//! helpers move or copy them into the layout the host project links
//! against. Glob patterns are the simple `*`-only kind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum FsError {
  #[error("filesystem operation failed at {path}: {source}")]
  Io { path: PathBuf, source: io::Error },
}

impl FsError {
  fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }
}

/// Whether entries matched by a glob are copied or moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
  Copy,
  Move,
}

/// Match `name` against a `*`-only glob pattern.
pub fn matches_glob(pattern: &str, name: &str) -> bool {
  let mut parts = pattern.split('*');
  let Some(prefix) = parts.next() else {
    return false;
  };
  if !name.starts_with(prefix) {
    return false;
  }
  let mut rest = &name[prefix.len()..];
  let mut last: Option<&str> = None;
  for part in parts {
    if let Some(prev) = last {
      match rest.find(prev) {
        Some(at) => rest = &rest[at + prev.len()..],
        None => return false,
      }
    }
    last = Some(part);
  }
  match last {
    // No '*' in the pattern at all: require an exact match.
    None => rest.is_empty(),
    Some(suffix) => rest.ends_with(suffix),
  }
}

/// Transfer every direct child of `src_dir` matching `pattern` into
/// `dest_dir`, returning how many entries matched.
///
/// A missing source directory yields zero matches rather than an error;
/// builds legitimately skip producing some output directories.
pub fn transfer_glob(
  src_dir: &Path,
  pattern: &str,
  dest_dir: &Path,
  mode: Transfer,
) -> Result<usize, FsError> {
  let entries = match fs::read_dir(src_dir) {
    Ok(entries) => entries,
    Err(err) if err.kind() == io::ErrorKind::NotFound => {
      warn!(dir = %src_dir.display(), pattern, "glob source directory missing");
      return Ok(0);
    }
    Err(source) => return Err(FsError::io(src_dir, source)),
  };
  fs::create_dir_all(dest_dir).map_err(|source| FsError::io(dest_dir, source))?;
  let mut matched = 0;
  for entry in entries {
    let entry = entry.map_err(|source| FsError::io(src_dir, source))?;
    let name = entry.file_name();
    let Some(name) = name.to_str() else { continue };
    if !matches_glob(pattern, name) {
      continue;
    }
    let src = entry.path();
    let dest = dest_dir.join(name);
    if src.is_dir() {
      copy_dir(&src, &dest)?;
      if mode == Transfer::Move {
        fs::remove_dir_all(&src).map_err(|source| FsError::io(&src, source))?;
      }
    } else {
      fs::copy(&src, &dest).map_err(|source| FsError::io(&src, source))?;
      if mode == Transfer::Move {
        fs::remove_file(&src).map_err(|source| FsError::io(&src, source))?;
      }
    }
    matched += 1;
  }
  debug!(
    dir = %src_dir.display(),
    pattern,
    matched,
    "transferred glob matches"
  );
  Ok(matched)
}

/// Recursively copy `src` over `dest`, replacing any existing tree.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<(), FsError> {
  match fs::remove_dir_all(dest) {
    Ok(()) => {}
    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
    Err(source) => return Err(FsError::io(dest, source)),
  }
  for entry in WalkDir::new(src) {
    let entry = entry.map_err(|err| {
      let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("walk cycle"));
      FsError::io(src, source)
    })?;
    let rel = entry
      .path()
      .strip_prefix(src)
      .unwrap_or_else(|_| Path::new(""));
    let target = dest.join(rel);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(|source| FsError::io(&target, source))?;
    } else {
      fs::copy(entry.path(), &target).map_err(|source| FsError::io(entry.path(), source))?;
    }
  }
  Ok(())
}

/// Remove a directory tree; a missing tree is not an error.
pub fn remove_tree(path: &Path) -> Result<(), FsError> {
  match fs::remove_dir_all(path) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(FsError::io(path, source)),
  }
}

/// Copy a single file into `dest_dir`, keeping its name.
pub fn copy_file(src: &Path, dest_dir: &Path) -> Result<(), FsError> {
  fs::create_dir_all(dest_dir).map_err(|source| FsError::io(dest_dir, source))?;
  let name = src
    .file_name()
    .ok_or_else(|| FsError::io(src, io::Error::other("path has no file name")))?;
  fs::copy(src, dest_dir.join(name)).map_err(|source| FsError::io(src, source))?;
  Ok(())
}
