//! Reference block parser.
//!
//! Grammar, one marker per line:
//!
//! ```text
//! <!-- build:<js|css|remove>[(<root>,<root>...)] [<target>] -->
//!   ...lines; `<script src>` (js) or `<link href>` (css) attributes are references...
//! <!-- endbuild -->
//! ```
//!
//! Each `js`/`css` block is replaced in the rewritten document by a single tag pointing at its
//! target; `remove` blocks are dropped. Lines outside blocks are copied through untouched.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{AssetReference, BlockKind, ManifestDocument, ReferenceBlock};
use crate::output::validate_target;

fn start_marker() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^(\s*)<!--\s*build:([A-Za-z0-9_-]+)(?:\(([^)]*)\))?(?:\s+(\S+))?\s*-->\s*$")
      .expect("invalid build marker regex")
  })
}

fn end_marker() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"^\s*<!--\s*endbuild\s*-->\s*$").expect("invalid endbuild regex"))
}

fn script_source() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"(?i)<script\b[^>]*?\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
      .expect("invalid script regex")
  })
}

fn stylesheet_href() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"(?i)<link\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
      .expect("invalid link regex")
  })
}

struct OpenBlock {
  block: ReferenceBlock,
  indent: String,
  line_ending: String,
}

/// Parse `text` (already stripped of template wrappers) into blocks and the rewritten document.
///
/// `path` is only used for error reporting.
pub fn parse_manifest(path: &Path, text: &str) -> PipelineResult<ManifestDocument> {
  let malformed = |line: usize, message: String| PipelineError::Manifest {
    path: path.to_path_buf(),
    line,
    message,
  };

  let mut blocks: Vec<ReferenceBlock> = Vec::new();
  let mut rewritten = String::with_capacity(text.len());
  let mut targets: BTreeMap<String, usize> = BTreeMap::new();
  let mut open: Option<OpenBlock> = None;

  for (index, raw_line) in text.split_inclusive('\n').enumerate() {
    let line_number = index + 1;
    let content = raw_line.trim_end_matches(['\n', '\r']);
    let line_ending = &raw_line[content.len()..];

    if end_marker().is_match(content) {
      let Some(current) = open.take() else {
        return Err(malformed(
          line_number,
          "endbuild marker without a matching build marker".into(),
        ));
      };
      if let Some(tag) = replacement_tag(&current.block) {
        rewritten.push_str(&current.indent);
        rewritten.push_str(&tag);
        rewritten.push_str(&current.line_ending);
      }
      blocks.push(current.block);
      continue;
    }

    if let Some(caps) = start_marker().captures(content) {
      if let Some(current) = &open {
        return Err(malformed(
          line_number,
          format!(
            "nested build marker (block opened on line {} is not closed)",
            current.block.start_line
          ),
        ));
      }

      let keyword = caps.get(2).map_or("", |m| m.as_str());
      let kind = BlockKind::from_marker(keyword)
        .ok_or_else(|| malformed(line_number, format!("unknown block type '{keyword}'")))?;

      let target = caps.get(4).map(|m| m.as_str().to_string());
      match (&target, kind) {
        (None, BlockKind::Js | BlockKind::Css) => {
          return Err(malformed(
            line_number,
            format!("build:{keyword} block is missing a target path"),
          ));
        }
        (Some(target), _) => {
          validate_target(target).map_err(|message| malformed(line_number, message))?;
          if kind != BlockKind::Remove {
            if let Some(previous) = targets.insert(target.clone(), line_number) {
              return Err(malformed(
                line_number,
                format!("target '{target}' already declared on line {previous}"),
              ));
            }
          }
        }
        (None, BlockKind::Remove) => {}
      }

      let alternate_roots = caps
        .get(3)
        .map(|m| {
          m.as_str()
            .split(',')
            .map(str::trim)
            .filter(|root| !root.is_empty())
            .map(str::to_string)
            .collect()
        })
        .unwrap_or_default();

      open = Some(OpenBlock {
        block: ReferenceBlock {
          kind,
          target,
          alternate_roots,
          references: Vec::new(),
          start_line: line_number,
        },
        indent: caps.get(1).map_or("", |m| m.as_str()).to_string(),
        line_ending: line_ending.to_string(),
      });
      continue;
    }

    match open.as_mut() {
      Some(current) => {
        let pattern = match current.block.kind {
          BlockKind::Js => script_source(),
          BlockKind::Css => stylesheet_href(),
          BlockKind::Remove => continue,
        };
        for caps in pattern.captures_iter(content) {
          if let Some(value) = caps.get(1).or_else(|| caps.get(2)) {
            current.block.references.push(AssetReference {
              raw: value.as_str().to_string(),
              line: line_number,
            });
          }
        }
      }
      None => rewritten.push_str(raw_line),
    }
  }

  if let Some(current) = open {
    return Err(malformed(
      current.block.start_line,
      "build block is never closed with an endbuild marker".into(),
    ));
  }

  Ok(ManifestDocument { blocks, rewritten })
}

fn replacement_tag(block: &ReferenceBlock) -> Option<String> {
  let target = block.target.as_deref()?;
  match block.kind {
    BlockKind::Js => Some(format!("<script src=\"{target}\"></script>")),
    BlockKind::Css => Some(format!("<link rel=\"stylesheet\" href=\"{target}\">")),
    BlockKind::Remove => None,
  }
}
