//! Grouping resolved references into bundles and rendering their contents.

pub mod minify;
pub mod rebase;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::asset_paths::SearchRoots;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{ArtifactKind, Bundle, BundleKind, CssOptions, ManifestDocument};

/// Separator inserted between concatenated members.
pub const MEMBER_SEPARATOR: &str = "\n";

/// In-memory output of a bundle, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBundle {
  /// Destination relative to the output directory.
  pub target: String,
  /// Artifact category.
  pub kind: ArtifactKind,
  /// Final bytes.
  pub content: String,
}

/// Resolve every reference in the document's `js`/`css` blocks into bundles, in document order.
///
/// Block-level alternate roots are resolved against `project_dir` and consulted before `roots`.
pub fn collect_bundles(
  document: &ManifestDocument,
  roots: &SearchRoots,
  project_dir: &Path,
  url_prefixes: &[String],
) -> PipelineResult<Vec<Bundle>> {
  let mut bundles = Vec::new();

  for block in &document.blocks {
    let (Some(kind), Some(target)) = (block.kind.bundle_kind(), block.target.as_ref()) else {
      continue;
    };

    let block_roots = roots.with_alternates(project_dir, &block.alternate_roots);
    let members = block
      .references
      .iter()
      .map(|reference| block_roots.resolve(reference, url_prefixes))
      .collect::<PipelineResult<Vec<_>>>()?;

    bundles.push(Bundle {
      target: target.clone(),
      kind,
      members,
    });
  }

  Ok(bundles)
}

/// Concatenate the members of `bundle` in declared order.
///
/// Stylesheet members have their `url()` references rebased first when `css.rebase` is set.
pub fn concat_members(bundle: &Bundle, css: &CssOptions) -> PipelineResult<String> {
  let mut parts = Vec::with_capacity(bundle.members.len());

  for member in &bundle.members {
    let content = fs::read_to_string(&member.path).map_err(|source| PipelineError::AssetRead {
      path: member.path.clone(),
      source,
    })?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let content = if bundle.kind == BundleKind::Style && css.rebase {
      let root = css.root.as_deref().unwrap_or(&member.root);
      rebase::rebase_css_urls(content, &member.path, root)
    } else {
      content.to_string()
    };
    parts.push(content);
  }

  Ok(parts.join(MEMBER_SEPARATOR))
}

/// Concatenate and, when `minify` is set, minify a bundle.
pub fn render_bundle(bundle: &Bundle, minify: bool, css: &CssOptions) -> PipelineResult<RenderedBundle> {
  let concatenated = concat_members(bundle, css)?;
  let content = if minify {
    minify::minify_bundle(bundle.kind, &bundle.target, &concatenated).map_err(|message| {
      PipelineError::Transform {
        bundle: bundle.target.clone(),
        message,
      }
    })?
  } else {
    concatenated
  };

  debug!(
    bundle = %bundle.target,
    members = bundle.members.len(),
    bytes = content.len(),
    "rendered bundle"
  );

  Ok(RenderedBundle {
    target: bundle.target.clone(),
    kind: bundle.kind.into(),
    content,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::manifest::parse_manifest;
  use crate::models::{AssetReference, ResolvedAsset};
  use std::path::PathBuf;
  use tempfile::tempdir;

  fn member(path: PathBuf, root: PathBuf) -> ResolvedAsset {
    ResolvedAsset {
      reference: AssetReference {
        raw: path.display().to_string(),
        line: 1,
      },
      path,
      root,
    }
  }

  #[test]
  fn collects_bundles_in_document_order() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("static");
    fs::create_dir_all(root.join("js")).unwrap();
    fs::create_dir_all(root.join("css")).unwrap();
    fs::write(root.join("js/a.js"), "a()").unwrap();
    fs::write(root.join("js/b.js"), "b()").unwrap();
    fs::write(root.join("css/a.css"), "a{}").unwrap();

    let html = "<!-- build:css css/app.css -->\n<link href=\"css/a.css\">\n<!-- endbuild -->\n<!-- build:remove -->\n<script src=\"dev.js\"></script>\n<!-- endbuild -->\n<!-- build:js js/app.js -->\n<script src=\"js/b.js\"></script>\n<script src=\"js/a.js\"></script>\n<!-- endbuild -->\n";
    let document = parse_manifest(Path::new("base.html"), html).unwrap();
    let roots = SearchRoots::new(vec![root.clone()]);

    let bundles = collect_bundles(&document, &roots, temp.path(), &[]).unwrap();
    assert_eq!(bundles.len(), 2);
    assert_eq!(bundles[0].kind, BundleKind::Style);
    assert_eq!(bundles[1].target, "js/app.js");
    let members: Vec<PathBuf> = bundles[1].members.iter().map(|m| m.path.clone()).collect();
    assert_eq!(members, vec![root.join("js/b.js"), root.join("js/a.js")]);
  }

  #[test]
  fn block_alternate_roots_take_precedence() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("static");
    let vendor = temp.path().join("vendor");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(&vendor).unwrap();
    fs::write(root.join("lib.js"), "static()").unwrap();
    fs::write(vendor.join("lib.js"), "vendor()").unwrap();

    let html = "<!-- build:js(vendor) lib.js -->\n<script src=\"lib.js\"></script>\n<!-- endbuild -->\n";
    let document = parse_manifest(Path::new("base.html"), html).unwrap();
    let bundles =
      collect_bundles(&document, &SearchRoots::new(vec![root]), temp.path(), &[]).unwrap();
    assert_eq!(bundles[0].members[0].path, vendor.join("lib.js"));
  }

  #[test]
  fn concatenates_members_with_separator_and_strips_bom() {
    let temp = tempdir().unwrap();
    let a = temp.path().join("a.js");
    let b = temp.path().join("b.js");
    fs::write(&a, "\u{feff}console.log(1)").unwrap();
    fs::write(&b, "console.log(2)").unwrap();

    let bundle = Bundle {
      target: "app.js".into(),
      kind: BundleKind::Script,
      members: vec![
        member(a, temp.path().to_path_buf()),
        member(b, temp.path().to_path_buf()),
      ],
    };
    let content = concat_members(&bundle, &CssOptions::default()).unwrap();
    assert_eq!(content, "console.log(1)\nconsole.log(2)");
  }

  #[test]
  fn rendered_bundle_equals_minified_concatenation() {
    let temp = tempdir().unwrap();
    let a = temp.path().join("a.css");
    let b = temp.path().join("b.css");
    fs::write(&a, "a {\n  color: red;\n}\n").unwrap();
    fs::write(&b, ".icon {\n  background: url(../img/x.png);\n}\n").unwrap();

    let bundle = Bundle {
      target: "css/app.css".into(),
      kind: BundleKind::Style,
      members: vec![
        member(a, temp.path().to_path_buf()),
        member(b, temp.path().to_path_buf()),
      ],
    };
    let css = CssOptions {
      root: Some(temp.path().to_path_buf()),
      rebase: false,
    };
    let rendered = render_bundle(&bundle, true, &css).unwrap();
    let expected =
      minify::minify_css(&concat_members(&bundle, &css).unwrap(), "css/app.css").unwrap();
    assert_eq!(rendered.content, expected);
    assert_eq!(rendered.kind, ArtifactKind::Style);
    assert!(rendered.content.contains("../img/x.png"));
  }

  #[test]
  fn rendered_script_equals_minified_concatenation() {
    let temp = tempdir().unwrap();
    let a = temp.path().join("a.js");
    let b = temp.path().join("b.js");
    fs::write(&a, "var first = 1;\nconsole.log(first);\n").unwrap();
    fs::write(&b, "function second(value) {\n  return value + 1;\n}\nconsole.log(second(2));\n").unwrap();

    let bundle = Bundle {
      target: "app.js".into(),
      kind: BundleKind::Script,
      members: vec![
        member(a, temp.path().to_path_buf()),
        member(b, temp.path().to_path_buf()),
      ],
    };
    let css = CssOptions::default();
    let rendered = render_bundle(&bundle, true, &css).unwrap();
    let expected = minify::minify_js(&concat_members(&bundle, &css).unwrap()).unwrap();
    assert_eq!(rendered.content, expected);
    assert_eq!(rendered.kind, ArtifactKind::Script);
  }

  #[test]
  fn rebases_stylesheet_members_when_enabled() {
    let temp = tempdir().unwrap();
    let skins = temp.path().join("skins");
    fs::create_dir_all(skins.join("flat")).unwrap();
    let green = skins.join("flat/green.css");
    fs::write(&green, ".g{background:url(green.png)}").unwrap();

    let bundle = Bundle {
      target: "css/app.css".into(),
      kind: BundleKind::Style,
      members: vec![member(green, temp.path().to_path_buf())],
    };
    let css = CssOptions {
      root: Some(skins),
      rebase: true,
    };
    let content = concat_members(&bundle, &css).unwrap();
    assert_eq!(content, ".g{background:url(/flat/green.png)}");
  }

  #[test]
  fn transform_failures_name_the_bundle() {
    let temp = tempdir().unwrap();
    let broken = temp.path().join("broken.js");
    fs::write(&broken, "function (").unwrap();
    let bundle = Bundle {
      target: "js/broken.js".into(),
      kind: BundleKind::Script,
      members: vec![member(broken, temp.path().to_path_buf())],
    };

    let err = render_bundle(&bundle, true, &CssOptions::default()).unwrap_err();
    match err {
      PipelineError::Transform { bundle, .. } => assert_eq!(bundle, "js/broken.js"),
      other => panic!("unexpected error: {other}"),
    }

    let passthrough = render_bundle(&bundle, false, &CssOptions::default()).unwrap();
    assert_eq!(passthrough.content, "function (");
  }
}
