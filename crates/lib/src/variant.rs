//! Build variants: architecture and configuration axes.
//!
//! On POSIX hosts every target builds a single implicit variant. On Windows
//! a target declares which axes it varies over and the dispatcher expands
//! the full (architecture × configuration) matrix, optionally narrowed by
//! request filters.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Target CPU architecture for a Windows build variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X86,
  X64,
}

impl Arch {
  /// All architectures, in matrix expansion order.
  pub const DEFAULT_SET: [Arch; 2] = [Arch::X86, Arch::X64];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X64 => "x64",
    }
  }

  /// Address model for b2 (`address-model=`).
  pub fn address_model(&self) -> u32 {
    match self {
      Self::X86 => 32,
      Self::X64 => 64,
    }
  }

  /// Architecture name in gyp's dialect (`-Dtarget_arch=`).
  pub fn gyp_arch(&self) -> &'static str {
    match self {
      Self::X86 => "ia32",
      Self::X64 => "x64",
    }
  }

  /// Platform name in msbuild's dialect (`/p:Platform=`).
  pub fn msbuild_platform(&self) -> &'static str {
    match self {
      Self::X86 => "Win32",
      Self::X64 => "x64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Error)]
#[error("unknown architecture: {0} (expected x86 or x64)")]
pub struct ParseArchError(String);

impl FromStr for Arch {
  type Err = ParseArchError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "x86" => Ok(Self::X86),
      "x64" => Ok(Self::X64),
      other => Err(ParseArchError(other.to_string())),
    }
  }
}

/// Build configuration for a Windows build variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Config {
  Debug,
  Release,
}

impl Config {
  /// All configurations, in matrix expansion order.
  pub const DEFAULT_SET: [Config; 2] = [Config::Debug, Config::Release];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Debug => "Debug",
      Self::Release => "Release",
    }
  }
}

impl fmt::Display for Config {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Error)]
#[error("unknown configuration: {0} (expected Debug or Release)")]
pub struct ParseConfigError(String);

impl FromStr for Config {
  type Err = ParseConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "Debug" | "debug" => Ok(Self::Debug),
      "Release" | "release" => Ok(Self::Release),
      other => Err(ParseConfigError(other.to_string())),
    }
  }
}

/// One concrete point in a target's build matrix.
///
/// `config` is `None` for targets whose output does not vary by
/// configuration (their architecture build serves both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
  pub arch: Arch,
  pub config: Option<Config>,
}

impl fmt::Display for Variant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.config {
      Some(config) => write!(f, "{}/{config}", self.arch),
      None => write!(f, "{}", self.arch),
    }
  }
}

/// Which matrix axes a target varies over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantAxes {
  pub has_config_axis: bool,
}

impl VariantAxes {
  pub const ARCH_ONLY: VariantAxes = VariantAxes { has_config_axis: false };
  pub const ARCH_AND_CONFIG: VariantAxes = VariantAxes { has_config_axis: true };
}

/// Expand the variant matrix for the given axes, narrowed by the filters.
///
/// Ordering is architecture-major: all variants of one architecture are
/// produced before the next architecture starts.
pub fn matrix(
  axes: VariantAxes,
  arch_filter: Option<Arch>,
  config_filter: Option<Config>,
) -> Vec<Variant> {
  let arches: Vec<Arch> = match arch_filter {
    Some(arch) => vec![arch],
    None => Arch::DEFAULT_SET.to_vec(),
  };
  let mut variants = Vec::new();
  for arch in arches {
    if axes.has_config_axis {
      let configs: Vec<Config> = match config_filter {
        Some(config) => vec![config],
        None => Config::DEFAULT_SET.to_vec(),
      };
      for config in configs {
        variants.push(Variant { arch, config: Some(config) });
      }
    } else {
      variants.push(Variant { arch, config: None });
    }
  }
  variants
}
