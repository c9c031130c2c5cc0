//! Glob expansion shared by flattening copies and cleanup.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;

use crate::error::{PipelineError, PipelineResult};

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// A glob split into its literal walk base and the remaining pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
  /// Pattern as configured.
  pub raw: String,
  /// Longest literal directory prefix (the glob parent).
  pub base: PathBuf,
  /// Pattern relative to `base`, forward-slash separated.
  pub glob: String,
}

/// Whether `value` contains glob syntax.
pub fn has_glob_meta(value: &str) -> bool {
  value.contains(GLOB_META)
}

impl GlobPattern {
  /// Split `pattern` at its first segment containing glob syntax.
  ///
  /// A pattern without glob syntax is split into its parent directory and file name.
  pub fn parse(pattern: &str) -> Self {
    let normalized = pattern.replace('\\', "/");
    let segments: Vec<&str> = normalized.split('/').collect();
    let split_at = segments
      .iter()
      .position(|segment| has_glob_meta(segment))
      .unwrap_or(segments.len().saturating_sub(1));

    let base = segments[..split_at].join("/");
    let base = if base.is_empty() {
      if normalized.starts_with('/') { "/".to_string() } else { ".".to_string() }
    } else {
      base
    };

    Self {
      raw: pattern.to_string(),
      base: PathBuf::from(base),
      glob: segments[split_at..].join("/"),
    }
  }

  /// Enumerate matching regular files, sorted by name at every directory level.
  ///
  /// A missing base directory matches nothing.
  pub fn expand(&self) -> PipelineResult<Vec<PathBuf>> {
    if !self.base.is_dir() || self.glob.is_empty() {
      return Ok(Vec::new());
    }

    let pattern_error = |source: ignore::Error| PipelineError::Pattern {
      pattern: self.raw.clone(),
      source,
    };

    let mut overrides = OverrideBuilder::new(&self.base);
    overrides
      .add(&format!("/{}", self.glob))
      .map_err(pattern_error)?;
    let overrides = overrides.build().map_err(pattern_error)?;

    let walker = WalkBuilder::new(&self.base)
      .standard_filters(false)
      .follow_links(true)
      .overrides(overrides)
      .sort_by_file_name(|a, b| a.cmp(b))
      .build();

    let mut matches = Vec::new();
    for entry in walker {
      let entry = entry.map_err(pattern_error)?;
      if entry.depth() == 0 {
        continue;
      }
      if entry.file_type().is_some_and(|file_type| file_type.is_file()) {
        matches.push(entry.into_path());
      }
    }
    Ok(matches)
  }
}

/// Expand `pattern` (see [`GlobPattern::parse`]).
pub fn expand_pattern(pattern: &str) -> PipelineResult<Vec<PathBuf>> {
  GlobPattern::parse(pattern).expand()
}

/// Join a slash separated relative pattern onto `dir`, keeping forward slashes.
pub fn join_glob(dir: &Path, pattern: &str) -> String {
  format!(
    "{}/{}",
    dir.to_string_lossy().replace('\\', "/").trim_end_matches('/'),
    pattern.trim_start_matches('/')
  )
}
