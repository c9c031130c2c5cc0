//! Bundle minification.
//!
//! Scripts go through oxc (parse, compress, mangle, minified codegen); stylesheets through
//! lightningcss. Neither rewrites `url()` references.

use std::sync::{Arc, RwLock};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use tracing::warn;

use crate::models::BundleKind;

/// Minify JavaScript parsed as a classic script, so top-level declarations stay global.
pub fn minify_js(source: &str) -> Result<String, String> {
  let allocator = Allocator::default();
  let source_type = SourceType::cjs();
  let ret = Parser::new(&allocator, source, source_type).parse();
  if !ret.errors.is_empty() {
    let messages: Vec<String> = ret.errors.iter().map(|error| error.to_string()).collect();
    return Err(messages.join("; "));
  }
  let mut program = ret.program;
  let options = MinifierOptions {
    mangle: Some(MangleOptions::default()),
    compress: Some(CompressOptions::default()),
  };
  let ret = Minifier::new(options).minify(&allocator, &mut program);
  let code = Codegen::new()
    .with_options(CodegenOptions {
      minify: true,
      comments: CommentOptions::disabled(),
      ..CodegenOptions::default()
    })
    .with_scoping(ret.scoping)
    .build(&program)
    .code;
  Ok(code)
}

/// Compact CSS. `filename` only appears in diagnostics.
///
/// Declarations the parser cannot understand (legacy hacks such as `*zoom:1`) are dropped with a
/// warning instead of failing the whole stylesheet.
pub fn minify_css(source: &str, filename: &str) -> Result<String, String> {
  let warnings = Arc::new(RwLock::new(Vec::new()));
  let mut stylesheet = StyleSheet::parse(
    source,
    ParserOptions {
      filename: filename.to_string(),
      error_recovery: true,
      warnings: Some(Arc::clone(&warnings)),
      ..ParserOptions::default()
    },
  )
  .map_err(|error| error.to_string())?;

  if let Ok(warnings) = warnings.read() {
    for warning in warnings.iter() {
      warn!(file = filename, %warning, "skipped unparsable css");
    }
  }

  stylesheet
    .minify(MinifyOptions::default())
    .map_err(|error| error.to_string())?;
  let result = stylesheet
    .to_css(PrinterOptions {
      minify: true,
      ..PrinterOptions::default()
    })
    .map_err(|error| error.to_string())?;
  Ok(result.code)
}

/// Minify `source` according to the bundle kind.
pub fn minify_bundle(kind: BundleKind, target: &str, source: &str) -> Result<String, String> {
  match kind {
    BundleKind::Script => minify_js(source),
    BundleKind::Style => minify_css(source, target),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minifies_concatenated_scripts_in_order() {
    let code = minify_js("console.log(1)\nconsole.log(2)\n").unwrap();
    let first = code.find("console.log(1)").unwrap();
    let second = code.find("console.log(2)").unwrap();
    assert!(first < second);
  }

  #[test]
  fn rejects_invalid_javascript() {
    assert!(minify_js("function (").is_err());
  }

  #[test]
  fn compacts_css_without_rewriting_urls() {
    let code = minify_css(
      ".icheckbox_flat-green {\n  background: url(../flat/green.png) no-repeat;\n}\n",
      "app.css",
    )
    .unwrap();
    assert!(code.contains("../flat/green.png"));
    assert!(!code.contains('\n'));
  }

  #[test]
  fn tolerates_legacy_property_hacks() {
    let code = minify_css(".clearfix{*zoom:1;color:red}", "app.css").unwrap();
    assert!(code.starts_with(".clearfix{"));
    assert!(code.contains("color:red"));
  }

  #[test]
  fn compacts_simple_rules() {
    let code = minify_css("a {\n  color: red;\n}\n", "app.css").unwrap();
    assert_eq!(code, "a{color:red}");
  }
}
