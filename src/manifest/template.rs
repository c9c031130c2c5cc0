//! Template wrapper stripping applied before the manifest is parsed.

use crate::models::TemplateSubstitution;

/// Apply every substitution in order, replacing all occurrences of each.
///
/// Substitutions with an empty search string are skipped.
pub fn apply_substitutions(text: &str, substitutions: &[TemplateSubstitution]) -> String {
  let mut output = text.to_string();
  for substitution in substitutions {
    if substitution.find.is_empty() {
      continue;
    }
    output = output.replace(&substitution.find, &substitution.replace);
  }
  output
}
