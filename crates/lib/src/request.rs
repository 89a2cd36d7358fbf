//! A single build request as resolved from the command line.

use std::thread;

use crate::platform::{Os, PlatformFamily};
use crate::variant::{Arch, Config};

/// Everything the pipeline needs to know about one invocation.
#[derive(Debug, Clone)]
pub struct BuildRequest {
  /// Host operating system the build runs on.
  pub os: Os,
  /// Narrow Windows builds to a single architecture.
  pub arch: Option<Arch>,
  /// Narrow Windows builds to a single configuration.
  pub config: Option<Config>,
  /// Discard all prior outputs and markers before building.
  pub force: bool,
  /// Alias of `force` kept as a distinct flag for scripting callers.
  pub force_external: bool,
  /// MSVC toolset version, e.g. "14.2". Required on Windows.
  pub toolset: Option<String>,
  /// Parallel job count passed to the underlying build systems.
  pub jobs: usize,
}

impl BuildRequest {
  pub fn new(os: Os) -> Self {
    Self {
      os,
      arch: None,
      config: None,
      force: false,
      force_external: false,
      toolset: None,
      jobs: default_jobs(),
    }
  }

  pub fn family(&self) -> PlatformFamily {
    self.os.family()
  }

  /// Whether prior outputs should be discarded before building.
  pub fn wants_clean(&self) -> bool {
    self.force || self.force_external
  }
}

/// Default parallel job count: one per available hardware thread.
pub fn default_jobs() -> usize {
  thread::available_parallelism().map(usize::from).unwrap_or(4)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn either_force_flag_requests_cleanup() {
    let mut request = BuildRequest::new(Os::Linux);
    assert!(!request.wants_clean());
    request.force = true;
    assert!(request.wants_clean());

    let mut request = BuildRequest::new(Os::Linux);
    request.force_external = true;
    assert!(request.wants_clean());
  }

  #[test]
  fn default_jobs_is_positive() {
    assert!(default_jobs() >= 1);
  }
}
