//! Host platform detection.

use std::fmt;

/// Operating systems the orchestrator can build on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime.
  ///
  /// Returns `None` if the OS is not supported.
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// The build-path family this OS belongs to.
  pub fn family(&self) -> PlatformFamily {
    match self {
      Self::Windows => PlatformFamily::Windows,
      Self::Linux | Self::MacOs => PlatformFamily::Posix,
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The two build paths a target can take.
///
/// POSIX targets build a single implicit variant with the system toolchain;
/// Windows targets build an (architecture × configuration) matrix under a
/// resolved MSVC environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
  Posix,
  Windows,
}

impl PlatformFamily {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Posix => "posix",
      Self::Windows => "windows",
    }
  }
}

impl fmt::Display for PlatformFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
