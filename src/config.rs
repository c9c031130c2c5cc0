//! Project configuration loader describing where the manifest, sources and outputs live.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::models::{CssOptions, TemplateSubstitution};
use crate::project::{CopyJob, ProjectLayout};

/// Configuration file names probed by [`ProjectConfig::discover`], in order.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = [
  "bundler.config.json",
  "bundler.config.yaml",
  "bundler.config.yml",
];

/// Discoverable project configuration. Every field falls back to the g3w-admin
/// layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
  /// HTML manifest containing the reference blocks.
  pub manifest: String,
  /// Ordered directories searched for referenced assets.
  pub search_roots: Vec<String>,
  /// Destination directory for bundles and flattened copies.
  pub output_dir: String,
  /// Literal text substitutions applied to the manifest before parsing.
  pub substitutions: Vec<TemplateSubstitution>,
  /// URL prefixes that may be stripped from references during resolution.
  pub url_prefixes: Vec<String>,
  /// Whether bundles are minified after concatenation.
  pub minify: bool,
  /// Stylesheet compaction options.
  pub css: CssConfig,
  /// Flattening copy jobs.
  pub copies: Vec<CopyConfig>,
  /// Paths or globs under the output directory removed after a full run.
  pub cleanup: Vec<String>,
}

/// Stylesheet options as written in the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CssConfig {
  /// Root directory used when rebasing relative `url()` references.
  pub root: Option<String>,
  /// Rewrite relative `url()` references to root-absolute paths.
  pub rebase: bool,
}

/// A flattening copy job as written in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyConfig {
  /// Task name, usable from the command line.
  pub name: String,
  /// Glob patterns selecting source files.
  pub patterns: Vec<String>,
  /// Subdirectory of the output directory receiving the copies.
  pub destination: String,
}

/// Errors raised while reading an explicit configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The file exists but could not be read.
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    /// Configuration path.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
  /// The JSON document is invalid.
  #[error("failed to parse {}: {source}", .path.display())]
  Json {
    /// Configuration path.
    path: PathBuf,
    /// Parser error.
    source: serde_json::Error,
  },
  /// The YAML document is invalid.
  #[error("failed to parse {}: {source}", .path.display())]
  Yaml {
    /// Configuration path.
    path: PathBuf,
    /// Parser error.
    source: serde_yaml::Error,
  },
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      manifest: "g3w-admin/templates/base.html".into(),
      search_roots: vec!["g3w-admin/core/static".into()],
      output_dir: "g3w-admin/core/static/dist".into(),
      substitutions: vec![
        TemplateSubstitution::new("\"{% static ", ""),
        TemplateSubstitution::new(" %}\"", ""),
      ],
      url_prefixes: Vec::new(),
      minify: true,
      css: CssConfig {
        root: Some("g3w-admin/core/static/bower_components/icheck/skins".into()),
        rebase: false,
      },
      copies: vec![
        CopyConfig {
          name: "icheck_png".into(),
          patterns: vec![
            "g3w-admin/core/static/bower_components/icheck/skins/flat/green*.png".into(),
          ],
          destination: "css".into(),
        },
        CopyConfig {
          name: "fonts".into(),
          patterns: vec!["g3w-admin/core/static/bower_components/**/*.{eot,ttf,woff,woff2}".into()],
          destination: "fonts".into(),
        },
      ],
      cleanup: vec!["base.html".into()],
    }
  }
}

impl ProjectConfig {
  /// Look for a configuration file in `project_dir`.
  ///
  /// A missing file yields the defaults; a file that exists but cannot be read or parsed is an
  /// error rather than a silent fallback.
  pub fn discover(project_dir: &Path) -> Result<Self, ConfigError> {
    for name in DEFAULT_CONFIG_FILES {
      let candidate = project_dir.join(name);
      if candidate.is_file() {
        return Self::from_path(&candidate);
      }
    }
    Ok(Self::default())
  }

  /// Read configuration from a specific JSON or YAML file, chosen by extension.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    let is_yaml = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
      serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
      })
    } else {
      serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
      })
    }
  }

  /// Resolve every relative path against `project_dir`.
  pub fn into_layout(self, project_dir: &Path) -> ProjectLayout {
    let output_dir = project_dir.join(&self.output_dir);
    let copies = self
      .copies
      .into_iter()
      .map(|copy| CopyJob {
        name: copy.name,
        patterns: copy
          .patterns
          .iter()
          .map(|pattern| join_pattern(project_dir, pattern))
          .collect(),
        destination: output_dir.join(&copy.destination),
      })
      .collect();

    ProjectLayout {
      project_dir: project_dir.to_path_buf(),
      manifest: project_dir.join(&self.manifest),
      search_roots: self
        .search_roots
        .iter()
        .map(|root| project_dir.join(root))
        .collect(),
      output_dir,
      substitutions: self.substitutions,
      url_prefixes: self.url_prefixes,
      minify: self.minify,
      css: CssOptions {
        root: self.css.root.map(|root| project_dir.join(root)),
        rebase: self.css.rebase,
      },
      copies,
      cleanup: self.cleanup,
    }
  }
}

fn join_pattern(project_dir: &Path, pattern: &str) -> String {
  if Path::new(pattern).is_absolute() {
    return pattern.to_string();
  }
  project_dir
    .join(pattern)
    .to_string_lossy()
    .replace('\\', "/")
}
