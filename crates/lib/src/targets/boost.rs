//! Boost build orchestration.
//!
//! Bootstraps b2 once per checkout (the engine binary is the bootstrap
//! marker), then stages static libraries. POSIX hosts build a single
//! position-independent stage; Windows builds one stage per architecture,
//! with debug and release layered into the same stage directory.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::layout::ProjectLayout;
use crate::process::Invocation;
use crate::target::{BuildContext, BuildError, Target};
use crate::variant::{Arch, Variant, VariantAxes};

/// Libraries excluded from every stage; the host project does not link
/// them and some of them drag in extra toolchain requirements.
const WITHOUT_LIBS: [&str; 14] = [
  "context",
  "coroutine",
  "graph",
  "graph_parallel",
  "locale",
  "log",
  "math",
  "mpi",
  "python",
  "serialization",
  "signals",
  "test",
  "timer",
  "wave",
];

pub struct Boost {
  prefix: PathBuf,
  include_dir: PathBuf,
  stage_dir: PathBuf,
  zlib_dir: PathBuf,
}

impl Boost {
  pub fn new(layout: &ProjectLayout) -> Self {
    let prefix = layout.boost_dir();
    Self {
      include_dir: prefix.join("boost"),
      stage_dir: prefix.join("stage"),
      zlib_dir: layout.zlib_dir(),
      prefix,
    }
  }

  /// Compose the full header + stage command line for one b2 run.
  fn b2_command(&self, b2: &str, extra: &str, stage_dir: &Path, jobs: usize) -> String {
    let without: Vec<String> = WITHOUT_LIBS
      .iter()
      .map(|lib| format!("--without-{lib}"))
      .collect();
    format!(
      "{b2} headers && {b2} -j{jobs} --stagedir={stage} {extra} -sNO_BZIP2=1 -sZLIB_SOURCE={zlib} \
       {without} link=static threading=multi release stage",
      stage = stage_dir.display(),
      zlib = self.zlib_dir.display(),
      without = without.join(" ")
    )
  }
}

impl Target for Boost {
  fn name(&self) -> &'static str {
    "boost"
  }

  fn source_dir(&self) -> PathBuf {
    self.prefix.clone()
  }

  fn clean_roots(&self) -> Vec<PathBuf> {
    vec![self.include_dir.clone(), self.stage_dir.clone()]
  }

  fn axes(&self) -> VariantAxes {
    VariantAxes::ARCH_ONLY
  }

  fn posix_stage_dir(&self) -> PathBuf {
    self.stage_dir.join("lib")
  }

  fn variant_stage_dir(&self, variant: Variant) -> PathBuf {
    self.stage_dir.join(variant.arch.as_str()).join("lib")
  }

  fn prepare_windows(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
    // vcvarsall needs an architecture even for the arch-neutral header
    // step; any installed one will do.
    let arch = ctx.request.arch.unwrap_or(Arch::X64);
    let env = ctx.toolchain.resolve(arch, ctx.toolset()?)?;
    if !self.prefix.join("b2.exe").is_file() {
      info!("bootstrapping b2");
      ctx
        .runner
        .run(&Invocation::new("bootstrap.bat").envs(env.clone()))?;
    }
    ctx.runner.run(&Invocation::new("b2.exe headers").envs(env))?;
    Ok(())
  }

  fn build_posix(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
    if !self.prefix.join("b2").is_file() {
      info!("bootstrapping b2");
      ctx.runner.run(&Invocation::new("./bootstrap.sh"))?;
    }
    let command = self.b2_command("./b2", "cxxflags=-fPIC", &self.stage_dir, ctx.jobs());
    ctx.runner.run(&Invocation::new(command))?;
    Ok(())
  }

  fn build_variant(&self, ctx: &BuildContext<'_>, variant: Variant) -> Result<(), BuildError> {
    let env = ctx.toolchain.resolve(variant.arch, ctx.toolset()?)?;
    let extra = format!(
      "debug toolset=msvc-{} address-model={}",
      ctx.toolset()?,
      variant.arch.address_model()
    );
    let stage = self.stage_dir.join(variant.arch.as_str());
    let command = self.b2_command("b2.exe", &extra, &stage, ctx.jobs());
    ctx.runner.run(&Invocation::new(command).envs(env))?;
    Ok(())
  }
}
