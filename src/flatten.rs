//! Flattening copies: matched files land in one directory under their base names.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{ArtifactKind, OutputArtifact};
use crate::output::install_file;
use crate::pattern::GlobPattern;

/// One planned copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedCopy {
  /// Matched source file.
  pub source: PathBuf,
  /// Base name used in the destination directory.
  pub file_name: OsString,
}

/// Enumerate the copies `patterns` would produce, in enumeration order.
///
/// Patterns are expanded in order; a source matched by several patterns appears once. Two
/// different sources may share a `file_name`: the later one wins when the plan is executed.
pub fn plan_flattened(patterns: &[String]) -> PipelineResult<Vec<FlattenedCopy>> {
  let mut seen = BTreeSet::new();
  let mut plan = Vec::new();

  for raw in patterns {
    let pattern = GlobPattern::parse(raw);
    if !pattern.base.is_dir() {
      warn!(pattern = %raw, base = %pattern.base.display(), "pattern base directory does not exist");
      continue;
    }

    let matches = pattern.expand()?;
    if matches.is_empty() {
      warn!(pattern = %raw, "pattern matched no files");
    }

    for source in matches {
      let Some(file_name) = source.file_name().map(|name| name.to_os_string()) else {
        continue;
      };
      if seen.insert(source.clone()) {
        plan.push(FlattenedCopy { source, file_name });
      }
    }
  }

  Ok(plan)
}

/// Copy every file matched by `patterns` into `output_subdir`, discarding directory structure.
///
/// Base-name collisions are resolved last-write-wins and logged; the returned list holds one
/// artifact per destination file.
pub fn copy_flattened(patterns: &[String], output_subdir: &Path) -> PipelineResult<Vec<OutputArtifact>> {
  let plan = plan_flattened(patterns)?;

  fs::create_dir_all(output_subdir).map_err(|source| PipelineError::write(output_subdir, source))?;

  let mut written: BTreeMap<OsString, (usize, PathBuf)> = BTreeMap::new();
  let mut artifacts: Vec<OutputArtifact> = Vec::with_capacity(plan.len());

  for copy in plan {
    let destination = output_subdir.join(&copy.file_name);
    let bytes = install_file(&copy.source, &destination)
      .map_err(|source| PipelineError::write(&destination, source))?;
    debug!(source = %copy.source.display(), destination = %destination.display(), "copied");

    let artifact = OutputArtifact::new(destination, ArtifactKind::Copied, bytes);
    match written.get_mut(&copy.file_name) {
      Some((index, previous)) => {
        warn!(
          file = %copy.file_name.to_string_lossy(),
          overwritten = %previous.display(),
          winner = %copy.source.display(),
          "flattened file name collision"
        );
        artifacts[*index] = artifact;
        *previous = copy.source;
      }
      None => {
        written.insert(copy.file_name, (artifacts.len(), copy.source));
        artifacts.push(artifact);
      }
    }
  }

  Ok(artifacts)
}
