//! Error taxonomy shared by every pipeline operation.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failures surfaced by `Deploy`, `CopyFlattened`, `Cleanup` and the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// The manifest could not be read from disk.
  #[error("failed to read manifest {}: {source}", .path.display())]
  ManifestRead {
    /// Manifest path that was requested.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// The manifest's reference blocks are malformed.
  #[error("malformed manifest {}:{line}: {message}", .path.display())]
  Manifest {
    /// Manifest path.
    path: PathBuf,
    /// One-based line of the offending marker.
    line: usize,
    /// Description of the problem.
    message: String,
  },

  /// A reference could not be located in any search root.
  #[error("cannot resolve '{reference}' (line {line}): {reason}")]
  Resolution {
    /// Reference as written in the manifest, after substitution.
    reference: String,
    /// One-based manifest line the reference came from.
    line: usize,
    /// Why the lookup failed.
    reason: String,
  },

  /// A resolved source asset could not be read.
  #[error("failed to read asset {}: {source}", .path.display())]
  AssetRead {
    /// Asset path on disk.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// A minifier rejected a bundle.
  #[error("failed to transform bundle '{bundle}': {message}")]
  Transform {
    /// Bundle target path.
    bundle: String,
    /// Diagnostic text from the minifier.
    message: String,
  },

  /// A glob pattern could not be compiled or walked.
  #[error("invalid pattern '{pattern}': {source}")]
  Pattern {
    /// Pattern as configured.
    pattern: String,
    /// Error reported by the glob matcher.
    source: ignore::Error,
  },

  /// A destination could not be created or written.
  #[error("failed to write {}: {source}", .path.display())]
  Write {
    /// Destination path.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// A cleanup target existed but could not be removed.
  #[error("failed to remove {}: {source}", .path.display())]
  Cleanup {
    /// Path that could not be removed.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// A cleanup target points at the output directory itself or outside of it.
  #[error("invalid cleanup target: {reason}")]
  CleanupTarget {
    /// Target as configured.
    target: String,
    /// Why the target was rejected.
    reason: String,
  },

  /// The requested task name is not part of the build graph.
  #[error("unknown task '{name}' (available: {available})")]
  UnknownTask {
    /// Requested task name.
    name: String,
    /// Comma separated list of known task names.
    available: String,
  },
}

impl PipelineError {
  pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Write {
      path: path.into(),
      source,
    }
  }
}
