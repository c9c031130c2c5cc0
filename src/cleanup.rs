//! Removal of intermediate files from the output tree.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::output::validate_target;
use crate::pattern::{expand_pattern, has_glob_meta, join_glob};

/// Delete every target below `output_dir` and return the paths actually removed.
///
/// Targets are paths or globs relative to `output_dir`. Directories are removed recursively.
/// Targets that do not exist are skipped, so running the cleanup twice is a no-op. Every target
/// is checked before anything is removed: one naming the output directory itself or reaching
/// outside it fails the whole cleanup.
pub fn cleanup(output_dir: &Path, targets: &[String]) -> PipelineResult<Vec<PathBuf>> {
  for target in targets {
    validate_target(target).map_err(|reason| PipelineError::CleanupTarget {
      target: target.clone(),
      reason,
    })?;
  }

  let mut removed = Vec::new();

  for target in targets {
    let paths = if has_glob_meta(target) {
      expand_pattern(&join_glob(output_dir, target))?
    } else {
      vec![output_dir.join(target)]
    };

    for path in paths {
      if remove_path(&path)? {
        debug!(path = %path.display(), "removed");
        removed.push(path);
      }
    }
  }

  Ok(removed)
}

fn remove_path(path: &Path) -> PipelineResult<bool> {
  let metadata = match fs::symlink_metadata(path) {
    Ok(metadata) => metadata,
    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
    Err(source) => {
      return Err(PipelineError::Cleanup {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let result = if metadata.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  };

  match result {
    Ok(()) => Ok(true),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
    Err(source) => Err(PipelineError::Cleanup {
      path: path.to_path_buf(),
      source,
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn removes_intermediate_and_is_idempotent() {
    let temp = tempdir().unwrap();
    let dist = temp.path();
    fs::write(dist.join("base.html"), "<html>").unwrap();
    fs::write(dist.join("app.js"), "x()").unwrap();

    let targets = vec!["base.html".to_string()];
    let removed = cleanup(dist, &targets).unwrap();
    assert_eq!(removed, vec![dist.join("base.html")]);
    assert!(!dist.join("base.html").exists());
    assert!(dist.join("app.js").exists());

    let second = cleanup(dist, &targets).unwrap();
    assert!(second.is_empty());
  }

  #[test]
  fn removes_glob_matches_and_directories() {
    let temp = tempdir().unwrap();
    let dist = temp.path();
    fs::create_dir_all(dist.join("tmp/nested")).unwrap();
    fs::write(dist.join("tmp/nested/file.txt"), "x").unwrap();
    fs::write(dist.join("a.map"), "x").unwrap();
    fs::create_dir_all(dist.join("js")).unwrap();
    fs::write(dist.join("js/b.map"), "x").unwrap();
    fs::write(dist.join("js/app.js"), "x").unwrap();

    let removed = cleanup(dist, &["tmp".to_string(), "**/*.map".to_string()]).unwrap();
    assert_eq!(removed.len(), 3);
    assert!(!dist.join("tmp").exists());
    assert!(!dist.join("a.map").exists());
    assert!(!dist.join("js/b.map").exists());
    assert!(dist.join("js/app.js").exists());
  }

  #[test]
  fn rejects_targets_outside_the_output_tree() {
    let temp = tempdir().unwrap();
    let dist = temp.path().join("dist");
    fs::create_dir_all(&dist).unwrap();
    fs::write(dist.join("base.html"), "<html>").unwrap();
    fs::write(temp.path().join("x"), "keep").unwrap();

    for target in ["", ".", "../x"] {
      let targets = vec!["base.html".to_string(), target.to_string()];
      let err = cleanup(&dist, &targets).unwrap_err();
      match err {
        PipelineError::CleanupTarget { target: rejected, .. } => assert_eq!(rejected, target),
        other => panic!("unexpected error: {other}"),
      }
    }

    assert!(dist.join("base.html").is_file());
    assert!(temp.path().join("x").is_file());
  }

  #[test]
  fn missing_output_directory_is_not_an_error() {
    let temp = tempdir().unwrap();
    let removed = cleanup(&temp.path().join("never-built"), &["base.html".to_string(), "*.map".to_string()]).unwrap();
    assert!(removed.is_empty());
  }
}
