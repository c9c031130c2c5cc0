//! Optional rewriting of relative `url()` references in stylesheets.

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::asset_paths::is_external_reference;

fn url_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^"'\s)][^\s)]*))\s*\)"#)
      .expect("invalid url() regex")
  })
}

/// Rewrite relative `url()` references found in `css` (read from `source`) into paths absolute
/// from `root`, e.g. `url(../img/a.png)` in `root/skins/flat/x.css` becomes `url(/skins/img/a.png)`.
///
/// External, `data:`, fragment-only and already absolute URLs are left alone, as are URLs that
/// resolve outside `root`.
pub fn rebase_css_urls(css: &str, source: &Path, root: &Path) -> String {
  let base = normalize(source.parent().unwrap_or_else(|| Path::new("")));
  let root = normalize(root);

  url_pattern()
    .replace_all(css, |caps: &Captures| {
      let (value, quote) = match (caps.get(1), caps.get(2), caps.get(3)) {
        (Some(m), _, _) => (m.as_str(), "\""),
        (_, Some(m), _) => (m.as_str(), "'"),
        (_, _, Some(m)) => (m.as_str(), ""),
        _ => return caps[0].to_string(),
      };
      match rebase_value(value, &base, &root) {
        Some(rebased) => format!("url({quote}{rebased}{quote})"),
        None => caps[0].to_string(),
      }
    })
    .into_owned()
}

fn rebase_value(value: &str, base: &Path, root: &Path) -> Option<String> {
  let value = value.trim();
  if value.is_empty()
    || value.starts_with('/')
    || value.starts_with('#')
    || is_external_reference(value)
  {
    return None;
  }

  let split = value.find(['?', '#']).unwrap_or(value.len());
  let (path_part, suffix) = value.split_at(split);

  let resolved = normalize(&base.join(path_part));
  let relative = resolved.strip_prefix(root).ok()?;
  let segments: Vec<String> = relative
    .components()
    .map(|component| component.as_os_str().to_string_lossy().into_owned())
    .collect();
  Some(format!("/{}{}", segments.join("/"), suffix))
}

fn normalize(path: &Path) -> PathBuf {
  let mut result = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        let can_pop = matches!(result.components().next_back(), Some(Component::Normal(_)));
        if can_pop {
          result.pop();
        } else {
          result.push("..");
        }
      }
      other => result.push(other.as_os_str()),
    }
  }
  result
}
