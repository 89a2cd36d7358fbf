//! Per-target build dispatch.
//!
//! Applies forced cleanup, branches on the platform family, and wraps
//! every unit of work in a completion-marker guard: skip when the marker
//! exists, build otherwise, and record the marker only after success.

use tracing::info;

use crate::marker;
use crate::platform::PlatformFamily;
use crate::target::{BuildContext, BuildError, Target};
use crate::variant;

/// Build one target according to the request in `ctx`.
pub fn build_target(target: &dyn Target, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
  if ctx.request.wants_clean() {
    info!(dep = target.name(), "discarding previous outputs");
    for root in target.clean_roots() {
      marker::clear(&root)?;
    }
  }
  match ctx.request.family() {
    PlatformFamily::Posix => build_posix(target, ctx),
    PlatformFamily::Windows => build_windows(target, ctx),
  }
}

fn build_posix(target: &dyn Target, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
  let stage = target.posix_stage_dir();
  if marker::is_complete(&stage) {
    info!(dep = target.name(), "already built, skipping");
    return Ok(());
  }
  info!(dep = target.name(), "building");
  target.build_posix(ctx)?;
  marker::mark_complete(&stage)?;
  Ok(())
}

fn build_windows(target: &dyn Target, ctx: &BuildContext<'_>) -> Result<(), BuildError> {
  let variants = variant::matrix(target.axes(), ctx.request.arch, ctx.request.config);
  let pending: Vec<_> = variants
    .into_iter()
    .filter(|v| !marker::is_complete(&target.variant_stage_dir(*v)))
    .collect();
  if pending.is_empty() {
    info!(dep = target.name(), "all variants already built, skipping");
    return Ok(());
  }
  target.prepare_windows(ctx)?;
  for variant in pending {
    info!(dep = target.name(), %variant, "building variant");
    target.build_variant(ctx, variant)?;
    marker::mark_complete(&target.variant_stage_dir(variant))?;
  }
  Ok(())
}
