use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use static_bundler::{Pipeline, ProjectConfig, logging};

/// Bundle, minify and flatten static assets declared in an HTML manifest.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
  /// Run a single task (`deploy`, a copy job name, or `cleanup`) instead of the full build
  task: Option<String>,

  /// Configuration file (default: bundler.config.{json,yaml,yml} in the project directory)
  #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
  config: Option<PathBuf>,

  /// Directory relative configuration paths are resolved against
  #[arg(short = 'C', long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
  project_dir: PathBuf,

  /// Increase log verbosity (repeatable)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  logging::init(cli.verbose);

  let config = match &cli.config {
    Some(path) => ProjectConfig::from_path(path)?,
    None => ProjectConfig::discover(&cli.project_dir)?,
  };
  let pipeline = Pipeline::new(config.into_layout(&cli.project_dir));

  let report = match cli.task.as_deref() {
    Some(name) => pipeline
      .run_task(name)
      .with_context(|| format!("task '{name}' failed"))?,
    None => pipeline.run().context("asset build failed")?,
  };

  info!(
    artifacts = report.artifacts().count(),
    removed = report.removed.len(),
    "done"
  );
  Ok(())
}
