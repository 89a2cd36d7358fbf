//! OpenSSL build orchestration.
//!
//! POSIX hosts run the stock `config`/`make build_libs` flow and copy the
//! static archives into `lib/`. Windows runs the classic perl-driven
//! nmake flow once per architecture, moving the resulting import
//! libraries into `lib/<arch>/`.

use std::path::PathBuf;

use crate::fsops::{self, Transfer};
use crate::layout::ProjectLayout;
use crate::platform::Os;
use crate::process::Invocation;
use crate::target::{BuildContext, BuildError, Target};
use crate::toolchain::{locate_interpreter, perl_candidates, prepend_path};
use crate::variant::{Arch, Variant, VariantAxes};

pub struct OpenSsl {
  prefix: PathBuf,
  include_dir: PathBuf,
  lib_dir: PathBuf,
  copy_debug_symbols: bool,
}

impl OpenSsl {
  pub fn new(layout: &ProjectLayout) -> Self {
    let prefix = layout.openssl_dir();
    Self {
      include_dir: prefix.join("include"),
      lib_dir: prefix.join("lib"),
      prefix,
      copy_debug_symbols: true,
    }
  }

  /// Control copying `lib.pdb` next to the Windows import libraries.
  pub fn with_debug_symbols(mut self, copy: bool) -> Self {
    self.copy_debug_symbols = copy;
    self
  }
}

impl Target for OpenSsl {
  fn name(&self) -> &'static str {
    "openssl"
  }

  fn source_dir(&self) -> PathBuf {
    self.prefix.clone()
  }

  fn clean_roots(&self) -> Vec<PathBuf> {
    vec![self.include_dir.clone(), self.lib_dir.clone()]
  }

  fn axes(&self) -> VariantAxes {
    VariantAxes::ARCH_ONLY
  }

  fn posix_stage_dir(&self) -> PathBuf {
    self.lib_dir.clone()
  }

  fn variant_stage_dir(&self, variant: Variant) -> PathBuf {
    self.lib_dir.join(variant.arch.as_str())
  }

  fn build_posix(&self, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
    let configure = match ctx.request.os {
      Os::MacOs => "./Configure darwin64-x86_64-cc",
      _ => "./config",
    };
    let command = format!(
      "{configure} --prefix={} no-shared no-dso no-asm -DPIC -fPIC",
      self.prefix.display()
    );
    ctx.runner.run(&Invocation::new(command))?;
    ctx.runner.run(&Invocation::new("make build_libs"))?;
    // build_libs leaves the archives in the source root.
    fsops::transfer_glob(&self.prefix, "lib*.a", &self.lib_dir, Transfer::Copy)?;
    Ok(())
  }

  fn build_variant(&self, ctx: &BuildContext<'_>, variant: Variant) -> Result<(), BuildError> {
    let mut env = ctx.toolchain.resolve(variant.arch, ctx.toolset()?)?;
    // The perl Configure scripts choke on CRLF translation otherwise.
    env.insert("PERLIO".to_string(), ":unix:crlf".to_string());
    if let Some(perl_dir) = locate_interpreter("perl.exe", &perl_candidates()) {
      prepend_path(&mut env, "PATH", &perl_dir);
    }
    // Stale objects from the other architecture poison the build.
    fsops::remove_tree(&self.prefix.join("tmp32"))?;
    fsops::remove_tree(&self.prefix.join("out32"))?;

    let configure_target = match variant.arch {
      Arch::X86 => "VC-WIN32",
      Arch::X64 => "VC-WIN64A",
    };
    let command = format!(
      "perl Configure {configure_target} no-asm enable-static-engine --prefix={prefix} & \
       call ms\\do_nt.bat & nmake -f ms\\nt.mak install",
      prefix = self.prefix.display()
    );
    ctx.runner.run(&Invocation::new(command).envs(env))?;

    let dest = self.variant_stage_dir(variant);
    fsops::remove_tree(&dest)?;
    fsops::transfer_glob(&self.lib_dir, "*.lib", &dest, Transfer::Move)?;
    if self.copy_debug_symbols {
      fsops::copy_file(&self.prefix.join("tmp32").join("lib.pdb"), &dest)?;
    }
    Ok(())
  }
}
