//! The top-level build pipeline.
//!
//! Builds the dependencies strictly in order; a failure stops the
//! pipeline so later stages never build against half-finished outputs.

use tracing::info;

use crate::cwd::CwdGuard;
use crate::dispatch;
use crate::layout::ProjectLayout;
use crate::platform::PlatformFamily;
use crate::process::CommandRunner;
use crate::request::BuildRequest;
use crate::target::{BuildContext, BuildError, Target};
use crate::targets::{Boost, OpenSsl, V8};
use crate::toolchain::ToolchainResolver;

/// The dependencies, in fixed build order.
pub fn targets(layout: &ProjectLayout) -> Vec<Box<dyn Target>> {
  vec![
    Box::new(Boost::new(layout)),
    Box::new(OpenSsl::new(layout)),
    Box::new(V8::new(layout)),
  ]
}

/// Run the whole pipeline for one request.
pub fn run(
  request: &BuildRequest,
  layout: &ProjectLayout,
  runner: &dyn CommandRunner,
  toolchain: &dyn ToolchainResolver,
) -> Result<(), BuildError> {
  if request.family() == PlatformFamily::Windows && request.toolset.is_none() {
    return Err(BuildError::ToolsetRequired);
  }
  let ctx = BuildContext { request, runner, toolchain };
  for target in targets(layout) {
    let source = target.source_dir();
    if !source.is_dir() {
      return Err(BuildError::MissingSourceTree {
        target: target.name(),
        path: source,
      });
    }
    info!(dep = target.name(), "entering source tree");
    let _guard = CwdGuard::enter(&source).map_err(BuildError::Cwd)?;
    dispatch::build_target(target.as_ref(), &ctx)?;
  }
  info!("all dependencies built");
  Ok(())
}

#[cfg(test)]
mod tests {
  use serial_test::serial;
  use tempfile::TempDir;

  use super::*;
  use crate::marker;
  use crate::platform::Os;
  use crate::util::testutil::{FakeToolchain, RecordingRunner};

  fn temp_project() -> (TempDir, ProjectLayout) {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    for tree in [
      layout.boost_dir(),
      layout.openssl_dir(),
      layout.v8_dir(),
      layout.zlib_dir(),
    ] {
      std::fs::create_dir_all(tree).unwrap();
    }
    (dir, layout)
  }

  fn linux_request() -> BuildRequest {
    let mut request = BuildRequest::new(Os::Linux);
    request.jobs = 4;
    request
  }

  #[test]
  #[serial]
  fn full_posix_run_builds_all_three_in_order() {
    let (_dir, layout) = temp_project();
    let request = linux_request();
    let runner = RecordingRunner::new();
    let toolchain = FakeToolchain::new();

    run(&request, &layout, &runner, &toolchain).unwrap();

    let commands = runner.commands();
    assert_eq!(commands.len(), 5);
    assert_eq!(commands[0], "./bootstrap.sh");
    assert!(commands[1].starts_with("./b2 headers"));
    assert!(commands[2].starts_with("./config "));
    assert_eq!(commands[3], "make build_libs");
    assert!(commands[4].starts_with("make -j4 native"));

    assert!(marker::is_complete(&layout.boost_dir().join("stage").join("lib")));
    assert!(marker::is_complete(&layout.openssl_dir().join("lib")));
    assert!(marker::is_complete(&layout.v8_dir().join("lib")));

    // Everything is marked complete, so a second run does nothing.
    run(&request, &layout, &runner, &toolchain).unwrap();
    assert_eq!(runner.count(), 5);
  }

  #[test]
  #[serial]
  fn failure_stops_the_pipeline_without_marking() {
    let (_dir, layout) = temp_project();
    let request = linux_request();
    let runner = RecordingRunner::failing_on("make build_libs");
    let toolchain = FakeToolchain::new();

    let err = run(&request, &layout, &runner, &toolchain).unwrap_err();
    assert!(matches!(err, BuildError::Exec(_)));

    // Boost finished, OpenSSL failed mid-way, V8 never started.
    assert_eq!(runner.count(), 4);
    assert!(marker::is_complete(&layout.boost_dir().join("stage").join("lib")));
    assert!(!marker::is_complete(&layout.openssl_dir().join("lib")));
    assert!(!marker::is_complete(&layout.v8_dir().join("lib")));
  }

  #[test]
  #[serial]
  fn force_rebuilds_everything() {
    let (_dir, layout) = temp_project();
    let mut request = linux_request();
    let runner = RecordingRunner::new();
    let toolchain = FakeToolchain::new();
    run(&request, &layout, &runner, &toolchain).unwrap();

    request.force = true;
    run(&request, &layout, &runner, &toolchain).unwrap();
    assert_eq!(runner.count(), 10);
  }

  #[test]
  #[serial]
  fn windows_without_a_toolset_is_rejected_up_front() {
    let (_dir, layout) = temp_project();
    let request = BuildRequest::new(Os::Windows);
    let runner = RecordingRunner::new();
    let toolchain = FakeToolchain::new();

    let err = run(&request, &layout, &runner, &toolchain).unwrap_err();
    assert!(matches!(err, BuildError::ToolsetRequired));
    assert_eq!(runner.count(), 0);
  }

  #[test]
  #[serial]
  fn missing_source_tree_is_reported_before_building() {
    let (_dir, layout) = temp_project();
    std::fs::remove_dir_all(layout.openssl_dir()).unwrap();
    let request = linux_request();
    let runner = RecordingRunner::new();
    let toolchain = FakeToolchain::new();

    let err = run(&request, &layout, &runner, &toolchain).unwrap_err();
    match err {
      BuildError::MissingSourceTree { target, path } => {
        assert_eq!(target, "openssl");
        assert_eq!(path, layout.openssl_dir());
      }
      other => panic!("unexpected error: {other:?}"),
    }
    // Boost already ran; the pipeline stopped at the missing tree.
    assert_eq!(runner.count(), 2);
  }
}
