use std::path::{Path, PathBuf};

use tracing::debug;

use super::{generate_asset_candidates, is_external_reference};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{AssetReference, ResolvedAsset};

/// Ordered list of base directories used to locate referenced assets.
#[derive(Debug, Clone, Default)]
pub struct SearchRoots {
  roots: Vec<PathBuf>,
}

impl SearchRoots {
  /// Wrap an ordered list of directories.
  pub fn new(roots: Vec<PathBuf>) -> Self {
    Self { roots }
  }

  /// Roots in lookup order.
  pub fn roots(&self) -> &[PathBuf] {
    &self.roots
  }

  /// Prepend block-level alternate roots, resolved against `base`.
  pub fn with_alternates(&self, base: &Path, alternates: &[String]) -> Self {
    if alternates.is_empty() {
      return self.clone();
    }
    let mut roots: Vec<PathBuf> = alternates.iter().map(|root| base.join(root)).collect();
    for root in &self.roots {
      if !roots.contains(root) {
        roots.push(root.clone());
      }
    }
    Self { roots }
  }

  /// Resolve a reference to an existing file.
  ///
  /// Roots are tried in order and, within a root, candidates in the order produced by
  /// [`generate_asset_candidates`]. The first regular file wins.
  pub fn resolve(
    &self,
    reference: &AssetReference,
    url_prefixes: &[String],
  ) -> PipelineResult<ResolvedAsset> {
    let fail = |reason: String| PipelineError::Resolution {
      reference: reference.raw.clone(),
      line: reference.line,
      reason,
    };

    if is_external_reference(&reference.raw) {
      return Err(fail("external references cannot be bundled".into()));
    }
    if self.roots.is_empty() {
      return Err(fail("no search roots configured".into()));
    }

    let candidates = generate_asset_candidates(&reference.raw, url_prefixes);
    if candidates.is_empty() {
      return Err(fail("reference is empty".into()));
    }

    for root in &self.roots {
      for candidate in &candidates {
        let path = root.join(candidate);
        if path.is_file() {
          debug!(reference = %reference.raw, path = %path.display(), "resolved asset");
          return Ok(ResolvedAsset {
            reference: reference.clone(),
            path,
            root: root.clone(),
          });
        }
      }
    }

    let tried = self
      .roots
      .iter()
      .map(|root| root.display().to_string())
      .collect::<Vec<_>>()
      .join(", ");
    Err(fail(format!("not found in any search root ({tried})")))
  }
}
