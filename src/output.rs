//! Writing artifacts into the destination tree.

use std::fs;
use std::path::{Component, Path};

use same_file::is_same_file;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{ArtifactKind, OutputArtifact};

/// Write `content` to `output_dir/relative`, creating parent directories.
pub fn write_artifact(
  output_dir: &Path,
  relative: &str,
  kind: ArtifactKind,
  content: &[u8],
) -> PipelineResult<OutputArtifact> {
  let destination = relative
    .split('/')
    .filter(|segment| !segment.is_empty() && *segment != ".")
    .fold(output_dir.to_path_buf(), |path, segment| path.join(segment));

  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent).map_err(|source| PipelineError::write(parent, source))?;
  }
  fs::write(&destination, content).map_err(|source| PipelineError::write(&destination, source))?;

  debug!(path = %destination.display(), bytes = content.len(), "wrote artifact");
  Ok(OutputArtifact::new(destination, kind, content.len() as u64))
}

/// Check that `target` names a file or directory strictly inside the output directory.
///
/// Absolute paths, `..` segments and paths without a final name (`""`, `.`) are rejected.
pub(crate) fn validate_target(target: &str) -> Result<(), String> {
  let path = Path::new(target);
  for component in path.components() {
    match component {
      Component::ParentDir => {
        return Err(format!("target '{target}' escapes the output directory"));
      }
      Component::RootDir | Component::Prefix(_) => {
        return Err(format!("target '{target}' must be a relative path"));
      }
      Component::CurDir | Component::Normal(_) => {}
    }
  }
  if path.file_name().is_none() {
    return Err(format!("target '{target}' does not name a file"));
  }
  Ok(())
}

/// Copy `source` to `destination`, overwriting any previous file.
///
/// When both paths already name the same file nothing is done. Returns the byte length.
pub fn install_file(source: &Path, destination: &Path) -> std::io::Result<u64> {
  if destination.exists() {
    if is_same_file(source, destination)? {
      return Ok(fs::metadata(destination)?.len());
    }
    fs::remove_file(destination)?;
  }

  fs::copy(source, destination)
}
