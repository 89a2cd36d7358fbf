//! depforge - build the external native dependencies.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use depforge_lib::layout::ProjectLayout;
use depforge_lib::pipeline;
use depforge_lib::platform::Os;
use depforge_lib::process::{ExecError, ShellRunner};
use depforge_lib::request::BuildRequest;
use depforge_lib::target::BuildError;
use depforge_lib::toolchain::MsvcResolver;
use depforge_lib::variant::{Arch, Config};
use owo_colors::OwoColorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Build Boost, OpenSSL and V8 for the host project.
#[derive(Parser)]
#[command(name = "depforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Build only this architecture (Windows): x86 or x64
  #[arg(long)]
  platform: Option<Arch>,

  /// Build only this configuration (Windows): Debug or Release
  #[arg(long)]
  config: Option<Config>,

  /// Discard all previous outputs and rebuild from scratch
  #[arg(short, long)]
  force: bool,

  /// Same as --force; kept for scripted callers
  #[arg(long = "force-external")]
  force_external: bool,

  /// MSVC toolset version, e.g. 14.2 (required on Windows)
  #[arg(long)]
  msvc: Option<String>,

  /// Parallel job count (default: one per hardware thread)
  #[arg(short, long)]
  jobs: Option<usize>,

  /// Project root directory (default: current directory)
  #[arg(long)]
  root: Option<PathBuf>,
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();
  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      report(&err);
      exit_code(&err)
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let started = Instant::now();
  let os = Os::current().context("unsupported host platform")?;
  let root = cli.root.unwrap_or_else(|| PathBuf::from("."));
  let root = dunce::canonicalize(&root)
    .with_context(|| format!("project root not found: {}", root.display()))?;

  let mut request = BuildRequest::new(os);
  request.arch = cli.platform;
  request.config = cli.config;
  request.force = cli.force;
  request.force_external = cli.force_external;
  request.toolset = cli.msvc;
  if let Some(jobs) = cli.jobs {
    request.jobs = jobs;
  }

  let layout = ProjectLayout::new(&root);
  info!(%os, root = %root.display(), jobs = request.jobs, "building external dependencies");
  pipeline::run(&request, &layout, &ShellRunner, &MsvcResolver)?;

  eprintln!(
    "{} external dependencies ready in {}",
    "done:".green().bold(),
    humantime::format_duration(started.elapsed())
  );
  Ok(())
}

fn report(err: &anyhow::Error) {
  eprintln!("{} {err:#}", "error:".red().bold());
}

/// Propagate a failing build command's own exit code where possible.
fn exit_code(err: &anyhow::Error) -> ExitCode {
  if let Some(BuildError::Exec(ExecError::CommandFailed { code: Some(code), .. })) =
    err.downcast_ref::<BuildError>()
  {
    if let Ok(code) = u8::try_from(*code) {
      return ExitCode::from(code);
    }
  }
  ExitCode::FAILURE
}
