//! MSVC toolchain environment resolution.
//!
//! Windows variants need the full compiler environment (PATH, INCLUDE, LIB
//! and friends) that `vcvarsall.bat` establishes. The resolver locates a
//! Visual Studio installation, runs the script for the requested
//! architecture and toolset version, and captures the resulting variable
//! block so every subsequent build command can run under it.

use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::variant::Arch;

/// The captured compiler environment for one (architecture, toolset) pair.
pub type ToolchainEnv = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("no MSVC toolset {toolset} installation found for {arch}")]
  NotFound { toolset: String, arch: Arch },
  #[error("failed to capture toolchain environment: {0}")]
  Capture(#[from] io::Error),
  #[error("environment script {script} failed with exit code {code:?}")]
  VcvarsFailed { script: PathBuf, code: Option<i32> },
}

/// Resolves compiler environments. The production implementation shells
/// out to `vcvarsall.bat`; tests substitute a fake.
pub trait ToolchainResolver {
  fn resolve(&self, arch: Arch, toolset: &str) -> Result<ToolchainEnv, ToolchainError>;
}

/// Locates Visual Studio installations and captures their environments.
#[derive(Debug, Default)]
pub struct MsvcResolver;

const VS_YEARS: [&str; 3] = ["2022", "2019", "2017"];
const VS_EDITIONS: [&str; 4] = ["Enterprise", "Professional", "Community", "BuildTools"];

/// Candidate `vcvarsall.bat` locations, most specific first.
fn candidate_scripts() -> Vec<PathBuf> {
  let mut candidates = Vec::new();
  if let Ok(install_dir) = env::var("VSINSTALLDIR") {
    candidates.push(
      Path::new(&install_dir)
        .join("VC")
        .join("Auxiliary")
        .join("Build")
        .join("vcvarsall.bat"),
    );
  }
  let roots: Vec<String> = ["ProgramFiles", "ProgramFiles(x86)"]
    .iter()
    .filter_map(|var| env::var(var).ok())
    .collect();
  for root in &roots {
    for year in VS_YEARS {
      for edition in VS_EDITIONS {
        candidates.push(
          Path::new(root)
            .join("Microsoft Visual Studio")
            .join(year)
            .join(edition)
            .join("VC")
            .join("Auxiliary")
            .join("Build")
            .join("vcvarsall.bat"),
        );
      }
    }
  }
  // Pre-2017 installations advertise themselves through VS*COMNTOOLS.
  for var in ["VS140COMNTOOLS", "VS120COMNTOOLS"] {
    if let Ok(tools_dir) = env::var(var) {
      candidates.push(
        Path::new(&tools_dir)
          .join("..")
          .join("..")
          .join("VC")
          .join("vcvarsall.bat"),
      );
    }
  }
  candidates
}

fn locate_script(toolset: &str, arch: Arch) -> Result<PathBuf, ToolchainError> {
  candidate_scripts()
    .into_iter()
    .find(|path| path.is_file())
    .ok_or_else(|| ToolchainError::NotFound {
      toolset: toolset.to_string(),
      arch,
    })
}

/// Parse the `set` output captured after running an environment script.
fn parse_env_block(output: &str) -> ToolchainEnv {
  let mut env = ToolchainEnv::new();
  for line in output.lines() {
    let line = line.trim_end_matches('\r');
    if let Some((key, value)) = line.split_once('=') {
      if !key.is_empty() {
        env.insert(key.to_string(), value.to_string());
      }
    }
  }
  env
}

impl ToolchainResolver for MsvcResolver {
  fn resolve(&self, arch: Arch, toolset: &str) -> Result<ToolchainEnv, ToolchainError> {
    let script = locate_script(toolset, arch)?;
    debug!(script = %script.display(), %arch, toolset, "capturing toolchain environment");
    let line = format!(
      "call \"{}\" {} -vcvars_ver={} && set",
      script.display(),
      arch.as_str(),
      toolset
    );
    let output = Command::new("cmd.exe").args(["/C", &line]).output()?;
    if !output.status.success() {
      return Err(ToolchainError::VcvarsFailed {
        script,
        code: output.status.code(),
      });
    }
    Ok(parse_env_block(&String::from_utf8_lossy(&output.stdout)))
  }
}

/// Prepend `dir` to the path-list variable `name` inside `env`, falling
/// back to the process's own value when the overlay does not carry one.
pub fn prepend_path(env: &mut ToolchainEnv, name: &str, dir: &Path) {
  let sep = if cfg!(windows) { ';' } else { ':' };
  let existing = env
    .get(name)
    .cloned()
    .or_else(|| std::env::var(name).ok())
    .unwrap_or_default();
  let value = if existing.is_empty() {
    dir.display().to_string()
  } else {
    format!("{}{sep}{existing}", dir.display())
  };
  env.insert(name.to_string(), value);
}

/// First candidate directory containing `exe`, if any.
pub fn locate_interpreter(exe: &str, candidates: &[PathBuf]) -> Option<PathBuf> {
  candidates
    .iter()
    .find(|dir| dir.join(exe).is_file())
    .cloned()
}

/// Well-known Windows python installation directories, preferred order.
/// gyp needs a python 2 interpreter.
pub fn python_candidates() -> Vec<PathBuf> {
  vec![
    PathBuf::from(r"C:\Python27"),
    PathBuf::from(r"C:\Python"),
    PathBuf::from(r"\Python27"),
    PathBuf::from(r"\Python"),
  ]
}

/// Well-known Windows perl installation directories, preferred order.
pub fn perl_candidates() -> Vec<PathBuf> {
  let mut candidates = vec![
    PathBuf::from(r"C:\Perl\bin"),
    PathBuf::from(r"C:\Perl64\bin"),
    PathBuf::from(r"\Perl\bin"),
    PathBuf::from(r"\Perl64\bin"),
  ];
  for var in ["ProgramFiles", "ProgramFiles(x86)"] {
    if let Ok(root) = env::var(var) {
      candidates.push(Path::new(&root).join("Git").join("bin"));
    }
  }
  candidates
}
