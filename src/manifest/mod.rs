//! Loading and parsing the HTML manifest that declares bundles.

mod parser;
mod template;

use std::fs;
use std::path::Path;

pub use parser::parse_manifest;
pub use template::apply_substitutions;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{ManifestDocument, TemplateSubstitution};

/// Read a manifest from disk, strip template wrappers and parse its reference blocks.
pub fn load_manifest(
  path: &Path,
  substitutions: &[TemplateSubstitution],
) -> PipelineResult<ManifestDocument> {
  let text = fs::read_to_string(path).map_err(|source| PipelineError::ManifestRead {
    path: path.to_path_buf(),
    source,
  })?;
  let stripped = apply_substitutions(&text, substitutions);
  parse_manifest(path, &stripped)
}
