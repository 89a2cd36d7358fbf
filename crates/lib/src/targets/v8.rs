//! V8 build orchestration.
//!
//! POSIX hosts drive the gyp-generated makefiles directly (with the shared
//! gyp checkout symlinked into place) and collect the shared libraries
//! into `lib/`. Windows regenerates the msvs projects per variant and
//! builds them with msbuild, staging into `lib/<arch>/<config>/`.

use std::path::PathBuf;

use crate::fsops::{self, Transfer};
use crate::layout::ProjectLayout;
use crate::platform::Os;
use crate::process::Invocation;
use crate::target::{BuildContext, BuildError, Target};
use crate::toolchain::{locate_interpreter, prepend_path, python_candidates};
use crate::variant::{Config, Variant, VariantAxes};

/// Shared libraries produced by a native build.
const POSIX_LIBS: [&str; 3] = ["v8", "icui18n", "icuuc"];

pub struct V8 {
  build_dir: PathBuf,
  lib_dir: PathBuf,
  gyp_dir: PathBuf,
  nocygwin: PathBuf,
}

impl V8 {
  pub fn new(layout: &ProjectLayout) -> Self {
    let build_dir = layout.v8_dir();
    Self {
      lib_dir: build_dir.join("lib"),
      gyp_dir: layout.gyp_dir(),
      nocygwin: layout.nocygwin_gypi(),
      build_dir,
    }
  }

  /// Make the shared gyp checkout visible where V8's makefiles expect it.
  #[cfg(unix)]
  fn link_gyp(&self) -> Result<(), BuildError> {
    use crate::fsops::FsError;

    let build = self.build_dir.join("build");
    let link = build.join("gyp");
    std::fs::create_dir_all(&build)
      .map_err(|source| FsError::Io { path: build, source })?;
    // symlink_metadata also sees dangling links, which exists() would miss.
    if std::fs::symlink_metadata(&link).is_err() {
      std::os::unix::fs::symlink(&self.gyp_dir, &link)
        .map_err(|source| FsError::Io { path: link, source })?;
    }
    Ok(())
  }

  #[cfg(not(unix))]
  fn link_gyp(&self) -> Result<(), BuildError> {
    Ok(())
  }

  /// Rewrite the dylib install names so the host binary can carry the
  /// libraries next to itself.
  fn fixup_install_names(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
    for lib in POSIX_LIBS {
      ctx.runner.run(&Invocation::new(format!(
        "install_name_tool -id @executable_path/lib{lib}.dylib out/native/lib{lib}.dylib"
      )))?;
      for dep in ["icui18n", "icuuc"] {
        ctx.runner.run(&Invocation::new(format!(
          "install_name_tool -change /usr/local/lib/lib{dep}.dylib \
           @executable_path/lib{dep}.dylib out/native/lib{lib}.dylib"
        )))?;
      }
    }
    Ok(())
  }
}

impl Target for V8 {
  fn name(&self) -> &'static str {
    "v8"
  }

  fn source_dir(&self) -> PathBuf {
    self.build_dir.clone()
  }

  fn clean_roots(&self) -> Vec<PathBuf> {
    vec![
      self.build_dir.join("build").join("Debug"),
      self.build_dir.join("build").join("Release"),
      self.lib_dir.clone(),
    ]
  }

  fn axes(&self) -> VariantAxes {
    VariantAxes::ARCH_AND_CONFIG
  }

  fn posix_stage_dir(&self) -> PathBuf {
    self.lib_dir.clone()
  }

  fn variant_stage_dir(&self, variant: Variant) -> PathBuf {
    let config = variant.config.unwrap_or(Config::Release);
    self
      .lib_dir
      .join(variant.arch.as_str())
      .join(config.as_str())
  }

  fn build_posix(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
    self.link_gyp()?;
    let mut invocation = Invocation::new(format!(
      "make -j{} native library=shared werror=no",
      ctx.jobs()
    ))
    .env("CXXFLAGS", "-Wno-error");
    match ctx.request.os {
      Os::Linux => {
        // The value passes through make expansion before reaching the
        // linker: make folds $$ to $ and the shell strips the backslash,
        // so the binary ends up with a literal $ORIGIN rpath.
        invocation = invocation.env("LDFLAGS", "-Wl,-rpath=\\$$ORIGIN");
      }
      Os::MacOs => {
        invocation = invocation.env("DYLD_LIBRARY_PATH", "out/native");
      }
      Os::Windows => {}
    }
    ctx.runner.run(&invocation)?;
    if ctx.request.os == Os::MacOs {
      self.fixup_install_names(ctx)?;
    }
    let out = self.build_dir.join("out").join("native");
    let lib_target = out.join("lib.target");
    let produced = if lib_target.is_dir() { lib_target } else { out };
    fsops::transfer_glob(&produced, "lib*", &self.lib_dir, Transfer::Copy)?;
    Ok(())
  }

  fn build_variant(&self, ctx: &BuildContext<'_>, variant: Variant) -> Result<(), BuildError> {
    let config = variant.config.unwrap_or(Config::Release);
    let mut env = ctx.toolchain.resolve(variant.arch, ctx.toolset()?)?;
    if let Some(python_dir) = locate_interpreter("python.exe", &python_candidates()) {
      prepend_path(&mut env, "PATH", &python_dir);
    }
    prepend_path(&mut env, "PYTHONPATH", &self.gyp_dir.join("pylib"));

    let generate = format!(
      "python {gyp_v8} -I{nocygwin} -Dtarget_arch={arch} -Dcomponent=shared_library --format=msvs",
      gyp_v8 = self.build_dir.join("build").join("gyp_v8.py").display(),
      nocygwin = self.nocygwin.display(),
      arch = variant.arch.gyp_arch()
    );
    ctx.runner.run(&Invocation::new(generate).envs(env.clone()))?;

    let build = format!(
      "msbuild {project} /m:{jobs} /p:Configuration={config} /p:Platform={platform}",
      project = self.build_dir.join("tools").join("gyp").join("v8.vcxproj").display(),
      jobs = ctx.jobs(),
      platform = variant.arch.msbuild_platform()
    );
    ctx.runner.run(&Invocation::new(build).envs(env))?;

    let dest = self.variant_stage_dir(variant);
    fsops::remove_tree(&dest)?;
    let produced = self.build_dir.join("build").join(config.as_str());
    fsops::transfer_glob(&produced.join("lib"), "v8.*", &dest, Transfer::Copy)?;
    fsops::transfer_glob(&produced, "v8.*", &dest, Transfer::Copy)?;
    fsops::transfer_glob(&produced, "icu*", &dest, Transfer::Copy)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::request::BuildRequest;
  use crate::util::testutil::{FakeToolchain, RecordingRunner};
  use crate::variant::Arch;

  fn context<'a>(
    request: &'a BuildRequest,
    runner: &'a RecordingRunner,
    toolchain: &'a FakeToolchain,
  ) -> BuildContext<'a> {
    BuildContext { request, runner, toolchain }
  }

  #[test]
  fn linux_build_sets_rpath_and_collects_libraries() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let out = layout.v8_dir().join("out").join("native").join("lib.target");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("libv8.so"), b"v8").unwrap();
    std::fs::write(out.join("libicuuc.so"), b"icu").unwrap();
    let v8 = V8::new(&layout);
    let mut request = BuildRequest::new(Os::Linux);
    request.jobs = 2;
    let runner = RecordingRunner::new();
    let toolchain = FakeToolchain::new();

    v8.build_posix(&context(&request, &runner, &toolchain)).unwrap();

    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].command, "make -j2 native library=shared werror=no");
    assert_eq!(invocations[0].env.get("CXXFLAGS").unwrap(), "-Wno-error");
    // Escaped so that make's $$ folding leaves a literal $ORIGIN rpath.
    assert_eq!(invocations[0].env.get("LDFLAGS").unwrap(), "-Wl,-rpath=\\$$ORIGIN");
    assert!(layout.v8_dir().join("lib").join("libv8.so").is_file());
    assert!(layout.v8_dir().join("lib").join("libicuuc.so").is_file());
  }

  #[test]
  fn macos_build_rewrites_install_names() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let v8 = V8::new(&layout);
    let request = BuildRequest::new(Os::MacOs);
    let runner = RecordingRunner::new();
    let toolchain = FakeToolchain::new();

    v8.build_posix(&context(&request, &runner, &toolchain)).unwrap();

    let commands = runner.commands();
    // One make, then -id plus two -change rewrites per library.
    assert_eq!(commands.len(), 10);
    assert!(commands[1].contains("install_name_tool -id @executable_path/libv8.dylib"));
    assert!(commands[2].contains("-change /usr/local/lib/libicui18n.dylib"));
    assert_eq!(runner.invocations()[0].env.get("DYLD_LIBRARY_PATH").unwrap(), "out/native");
  }

  #[cfg(unix)]
  #[test]
  fn gyp_symlink_is_created_once() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let v8 = V8::new(&layout);
    v8.link_gyp().unwrap();
    let link = layout.v8_dir().join("build").join("gyp");
    assert_eq!(std::fs::read_link(&link).unwrap(), layout.gyp_dir());
    // Re-linking over an existing (possibly dangling) link is a no-op.
    v8.link_gyp().unwrap();
  }

  #[test]
  fn windows_variant_generates_then_builds_with_msbuild() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let produced = layout.v8_dir().join("build").join("Debug");
    std::fs::create_dir_all(produced.join("lib")).unwrap();
    std::fs::write(produced.join("lib").join("v8.lib"), b"l").unwrap();
    std::fs::write(produced.join("v8.dll"), b"d").unwrap();
    std::fs::write(produced.join("icuuc.dll"), b"i").unwrap();
    let v8 = V8::new(&layout);
    let mut request = BuildRequest::new(Os::Windows);
    request.toolset = Some("14.2".to_string());
    request.jobs = 6;
    let runner = RecordingRunner::new();
    let toolchain = FakeToolchain::new();

    v8.build_variant(
      &context(&request, &runner, &toolchain),
      Variant { arch: Arch::X86, config: Some(Config::Debug) },
    )
    .unwrap();

    let commands = runner.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].contains("gyp_v8.py"));
    assert!(commands[0].contains("-Dtarget_arch=ia32"));
    assert!(commands[0].contains("--format=msvs"));
    assert!(commands[1].contains("/m:6"));
    assert!(commands[1].contains("/p:Configuration=Debug"));
    assert!(commands[1].contains("/p:Platform=Win32"));
    let pythonpath = runner.invocations()[0].env.get("PYTHONPATH").unwrap().clone();
    assert!(pythonpath.starts_with(&layout.gyp_dir().join("pylib").display().to_string()));

    let dest = layout.v8_dir().join("lib").join("x86").join("Debug");
    assert!(dest.join("v8.lib").is_file());
    assert!(dest.join("v8.dll").is_file());
    assert!(dest.join("icuuc.dll").is_file());
  }

  #[test]
  fn variant_stage_defaults_to_release() {
    let layout = ProjectLayout::new("/p");
    let v8 = V8::new(&layout);
    assert_eq!(
      v8.variant_stage_dir(Variant { arch: Arch::X64, config: None }),
      PathBuf::from("/p/extern/v8/lib/x64/Release")
    );
  }
}
