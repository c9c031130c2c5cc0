//! Data structures produced while parsing the manifest and emitting artifacts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Literal text replacement applied to the manifest before it is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TemplateSubstitution {
  /// Text to search for.
  pub find: String,
  /// Replacement text.
  #[serde(default)]
  pub replace: String,
}

impl TemplateSubstitution {
  /// Build a substitution from borrowed strings.
  pub fn new(find: &str, replace: &str) -> Self {
    Self {
      find: find.to_string(),
      replace: replace.to_string(),
    }
  }
}

/// Stylesheet compaction options.
#[derive(Debug, Clone, Default)]
pub struct CssOptions {
  /// Root used for rebasing relative URLs; falls back to the member's search root.
  pub root: Option<PathBuf>,
  /// When false, `url()` references are emitted exactly as authored.
  pub rebase: bool,
}

/// Block type named in a `build:<type>` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
  /// `build:js`, concatenated and minified script bundle.
  Js,
  /// `build:css`, concatenated and compacted stylesheet bundle.
  Css,
  /// `build:remove`, dropped from the rewritten manifest.
  Remove,
}

impl BlockKind {
  /// Parse the marker keyword.
  pub fn from_marker(value: &str) -> Option<Self> {
    match value {
      "js" => Some(Self::Js),
      "css" => Some(Self::Css),
      "remove" => Some(Self::Remove),
      _ => None,
    }
  }

  /// Output type produced by this block, if any.
  pub fn bundle_kind(self) -> Option<BundleKind> {
    match self {
      Self::Js => Some(BundleKind::Script),
      Self::Css => Some(BundleKind::Style),
      Self::Remove => None,
    }
  }
}

/// Output type shared by every member of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
  /// JavaScript.
  Script,
  /// CSS.
  Style,
}

/// A single asset path declared inside a reference block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
  /// Attribute value as it appears after template substitution.
  pub raw: String,
  /// One-based manifest line.
  pub line: usize,
}

/// A parsed `build:` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceBlock {
  /// Block type.
  pub kind: BlockKind,
  /// Destination path relative to the output directory.
  pub target: Option<String>,
  /// Additional search roots listed in the marker, consulted first.
  pub alternate_roots: Vec<String>,
  /// References in declared order.
  pub references: Vec<AssetReference>,
  /// One-based line of the start marker.
  pub start_line: usize,
}

/// Result of parsing a manifest: its blocks plus the rewritten document.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
  /// Blocks in document order.
  pub blocks: Vec<ReferenceBlock>,
  /// Manifest text with every block replaced by its single output tag.
  pub rewritten: String,
}

/// A reference paired with the file it resolved to.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
  /// The declaring reference.
  pub reference: AssetReference,
  /// Existing file on disk.
  pub path: PathBuf,
  /// Search root the file was found under.
  pub root: PathBuf,
}

/// Named group of resolved assets written to one output file.
#[derive(Debug, Clone)]
pub struct Bundle {
  /// Destination relative to the output directory.
  pub target: String,
  /// Output type.
  pub kind: BundleKind,
  /// Members in concatenation order.
  pub members: Vec<ResolvedAsset>,
}

/// Category of a written output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
  /// Minified script bundle.
  Script,
  /// Compacted stylesheet bundle.
  Style,
  /// Rewritten manifest.
  Markup,
  /// Flattened copy of a matched source file.
  Copied,
}

impl From<BundleKind> for ArtifactKind {
  fn from(kind: BundleKind) -> Self {
    match kind {
      BundleKind::Script => Self::Script,
      BundleKind::Style => Self::Style,
    }
  }
}

/// A file written to the destination tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
  /// Destination path.
  pub path: PathBuf,
  /// Artifact category.
  pub kind: ArtifactKind,
  /// MIME type guessed from the destination extension.
  pub mime: &'static str,
  /// Size in bytes.
  pub bytes: u64,
}

impl OutputArtifact {
  /// Describe a file that has just been written.
  pub fn new(path: PathBuf, kind: ArtifactKind, bytes: u64) -> Self {
    let mime = mime_for_path(&path);
    Self {
      path,
      kind,
      mime,
      bytes,
    }
  }
}

/// Guess a MIME type from a file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_ascii_lowercase);
  match ext.as_deref() {
    Some("js" | "mjs") => "text/javascript; charset=utf-8",
    Some("css") => "text/css; charset=utf-8",
    Some("html" | "htm") => "text/html; charset=utf-8",
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("svg") => "image/svg+xml",
    Some("woff") => "font/woff",
    Some("woff2") => "font/woff2",
    Some("ttf") => "font/ttf",
    Some("otf") => "font/otf",
    Some("eot") => "application/vnd.ms-fontobject",
    _ => "application/octet-stream",
  }
}
