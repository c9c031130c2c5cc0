//! The `deploy` task: manifest in, bundles and rewritten manifest out.

use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::asset_paths::SearchRoots;
use crate::bundle::{RenderedBundle, collect_bundles, render_bundle};
use crate::error::{PipelineError, PipelineResult};
use crate::manifest::load_manifest;
use crate::models::{ArtifactKind, CssOptions, ManifestDocument, OutputArtifact, TemplateSubstitution};
use crate::output::write_artifact;
use crate::project::ProjectLayout;

/// Knobs for [`deploy`] beyond the manifest, search roots and output directory.
#[derive(Debug, Clone)]
pub struct DeployOptions {
  /// Directory block-level alternate roots are resolved against.
  pub project_dir: PathBuf,
  /// Substitutions applied to the manifest text.
  pub substitutions: Vec<TemplateSubstitution>,
  /// URL prefixes stripped from references during resolution.
  pub url_prefixes: Vec<String>,
  /// Minify bundles after concatenation.
  pub minify: bool,
  /// Stylesheet options.
  pub css: CssOptions,
}

impl Default for DeployOptions {
  fn default() -> Self {
    Self {
      project_dir: PathBuf::from("."),
      substitutions: vec![
        TemplateSubstitution::new("\"{% static ", ""),
        TemplateSubstitution::new(" %}\"", ""),
      ],
      url_prefixes: Vec::new(),
      minify: true,
      css: CssOptions::default(),
    }
  }
}

impl DeployOptions {
  /// Options taken from a resolved project layout.
  pub fn from_layout(layout: &ProjectLayout) -> Self {
    Self {
      project_dir: layout.project_dir.clone(),
      substitutions: layout.substitutions.clone(),
      url_prefixes: layout.url_prefixes.clone(),
      minify: layout.minify,
      css: layout.css.clone(),
    }
  }
}

/// Render every bundle declared by `document` without touching the output tree.
pub fn render_bundles(
  document: &ManifestDocument,
  roots: &SearchRoots,
  options: &DeployOptions,
) -> PipelineResult<Vec<RenderedBundle>> {
  let bundles = collect_bundles(document, roots, &options.project_dir, &options.url_prefixes)?;
  bundles
    .par_iter()
    .map(|bundle| render_bundle(bundle, options.minify, &options.css))
    .collect()
}

/// Build the bundles declared in `manifest` and write them, plus the rewritten manifest, into
/// `output_dir`.
///
/// The rewritten manifest is written before any reference is resolved, so it is present for
/// inspection even when resolution fails.
pub fn deploy(
  manifest: &Path,
  roots: &SearchRoots,
  output_dir: &Path,
  options: &DeployOptions,
) -> PipelineResult<Vec<OutputArtifact>> {
  let document = load_manifest(manifest, &options.substitutions)?;
  info!(
    manifest = %manifest.display(),
    blocks = document.blocks.len(),
    "parsed manifest"
  );

  let manifest_name = manifest
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| "index.html".to_string());
  reject_manifest_collision(manifest, &manifest_name, &document)?;

  let mut artifacts = vec![write_artifact(
    output_dir,
    &manifest_name,
    ArtifactKind::Markup,
    document.rewritten.as_bytes(),
  )?];

  for rendered in render_bundles(&document, roots, options)? {
    artifacts.push(write_artifact(
      output_dir,
      &rendered.target,
      rendered.kind,
      rendered.content.as_bytes(),
    )?);
  }

  Ok(artifacts)
}

/// A bundle written over the intermediate manifest would be deleted by cleanup.
fn reject_manifest_collision(
  manifest: &Path,
  manifest_name: &str,
  document: &ManifestDocument,
) -> PipelineResult<()> {
  let intermediate = Path::new(manifest_name);
  let collision = document.blocks.iter().find(|block| {
    block.kind.bundle_kind().is_some()
      && block.target.as_deref().is_some_and(|target| {
        Path::new(target)
          .components()
          .filter(|component| !matches!(component, Component::CurDir))
          .eq(intermediate.components())
      })
  });

  match collision {
    Some(block) => Err(PipelineError::Manifest {
      path: manifest.to_path_buf(),
      line: block.start_line,
      message: format!("bundle target '{manifest_name}' would overwrite the rewritten manifest"),
    }),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::BundleKind;
  use std::fs;
  use tempfile::tempdir;

  const MANIFEST: &str = r#"<html>
<head>
  <!-- build:css css/app.css -->
  <link rel="stylesheet" href="{% static "css/a.css" %}">
  <!-- endbuild -->
</head>
<body>
  <!-- build:js js/app.js -->
  <script src="{% static "js/a.js" %}"></script>
  <script src="{% static "js/b.js" %}"></script>
  <!-- endbuild -->
</body>
</html>
"#;

  fn fixture(root: &Path) -> (PathBuf, SearchRoots) {
    let statics = root.join("static");
    fs::create_dir_all(statics.join("js")).unwrap();
    fs::create_dir_all(statics.join("css")).unwrap();
    fs::write(statics.join("js/a.js"), "console.log(1)").unwrap();
    fs::write(statics.join("js/b.js"), "console.log(2)").unwrap();
    fs::write(statics.join("css/a.css"), "body {\n  margin: 0;\n}\n").unwrap();
    let manifest = root.join("templates/base.html");
    fs::create_dir_all(manifest.parent().unwrap()).unwrap();
    fs::write(&manifest, MANIFEST).unwrap();
    (manifest, SearchRoots::new(vec![statics]))
  }

  #[test]
  fn writes_bundles_and_rewritten_manifest() {
    let temp = tempdir().unwrap();
    let (manifest, roots) = fixture(temp.path());
    let dist = temp.path().join("dist");

    let artifacts = deploy(&manifest, &roots, &dist, &DeployOptions::default()).unwrap();
    let kinds: Vec<ArtifactKind> = artifacts.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ArtifactKind::Markup, ArtifactKind::Style, ArtifactKind::Script]);

    let script = fs::read_to_string(dist.join("js/app.js")).unwrap();
    let first = script.find("console.log(1)").unwrap();
    let second = script.find("console.log(2)").unwrap();
    assert!(first < second);
    assert!(!script.contains("{%"));

    assert_eq!(fs::read_to_string(dist.join("css/app.css")).unwrap(), "body{margin:0}");

    let html = fs::read_to_string(dist.join("base.html")).unwrap();
    assert!(html.contains("<script src=\"js/app.js\"></script>"));
    assert!(html.contains("<link rel=\"stylesheet\" href=\"css/app.css\">"));
    assert!(!html.contains("{% static"));
  }

  #[test]
  fn render_bundles_leaves_output_untouched() {
    let temp = tempdir().unwrap();
    let (manifest, roots) = fixture(temp.path());
    let options = DeployOptions::default();
    let document = load_manifest(&manifest, &options.substitutions).unwrap();

    let rendered = render_bundles(&document, &roots, &options).unwrap();
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[1].kind, ArtifactKind::from(BundleKind::Script));
    assert!(!temp.path().join("dist").exists());
  }

  #[test]
  fn unresolved_reference_fails_after_writing_manifest() {
    let temp = tempdir().unwrap();
    let (manifest, roots) = fixture(temp.path());
    fs::remove_file(temp.path().join("static/js/b.js")).unwrap();
    let dist = temp.path().join("dist");

    let err = deploy(&manifest, &roots, &dist, &DeployOptions::default()).unwrap_err();
    match err {
      PipelineError::Resolution { reference, line, .. } => {
        assert_eq!(reference, "js/b.js");
        assert_eq!(line, 10);
      }
      other => panic!("unexpected error: {other}"),
    }
    assert!(dist.join("base.html").exists());
    assert!(!dist.join("js/app.js").exists());
  }

  #[test]
  fn bundle_named_like_the_manifest_is_rejected() {
    let temp = tempdir().unwrap();
    let (manifest, roots) = fixture(temp.path());
    fs::write(
      &manifest,
      "<p></p>\n<!-- build:js ./base.html -->\n<script src=\"js/a.js\"></script>\n<!-- endbuild -->\n",
    )
    .unwrap();
    let dist = temp.path().join("dist");

    let err = deploy(&manifest, &roots, &dist, &DeployOptions::default()).unwrap_err();
    assert!(matches!(err, PipelineError::Manifest { line: 2, .. }));
    assert!(!dist.exists());
  }

  #[test]
  fn unminified_bundle_is_plain_concatenation() {
    let temp = tempdir().unwrap();
    let (manifest, roots) = fixture(temp.path());
    let dist = temp.path().join("dist");
    let options = DeployOptions {
      minify: false,
      ..DeployOptions::default()
    };

    deploy(&manifest, &roots, &dist, &options).unwrap();
    assert_eq!(
      fs::read_to_string(dist.join("js/app.js")).unwrap(),
      "console.log(1)\nconsole.log(2)"
    );
  }
}
