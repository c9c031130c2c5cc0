//! Resolved project layout consumed by the pipeline operations.

use std::path::PathBuf;

use crate::models::{CssOptions, TemplateSubstitution};

/// Absolute view of the project configuration.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
  /// Directory relative paths were resolved against.
  pub project_dir: PathBuf,
  /// HTML manifest path.
  pub manifest: PathBuf,
  /// Ordered search roots for asset resolution.
  pub search_roots: Vec<PathBuf>,
  /// Destination directory.
  pub output_dir: PathBuf,
  /// Substitutions applied to the manifest text before parsing.
  pub substitutions: Vec<TemplateSubstitution>,
  /// URL prefixes stripped from references while expanding candidates.
  pub url_prefixes: Vec<String>,
  /// Whether bundles are minified.
  pub minify: bool,
  /// Stylesheet compaction options.
  pub css: CssOptions,
  /// Flattening copy jobs.
  pub copies: Vec<CopyJob>,
  /// Cleanup targets relative to [`ProjectLayout::output_dir`].
  pub cleanup: Vec<String>,
}

/// A resolved flattening copy job.
#[derive(Debug, Clone)]
pub struct CopyJob {
  /// Task name.
  pub name: String,
  /// Glob patterns, already joined onto the project directory.
  pub patterns: Vec<String>,
  /// Directory receiving the flattened copies.
  pub destination: PathBuf,
}
