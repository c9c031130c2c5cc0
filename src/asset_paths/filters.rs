use regex::Regex;

fn external_reference_patterns() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"(?i)^[a-z][a-z0-9+.-]*://").expect("invalid scheme regex"),
                Regex::new(r"^//").expect("invalid protocol-relative regex"),
                Regex::new(r"(?i)^data:").expect("invalid data URI regex"),
                Regex::new(r"(?i)^mailto:").expect("invalid mailto regex"),
            ]
        })
        .as_slice()
}

/// Determine whether a reference points outside the local filesystem.
///
/// Such references cannot be read from a search root, so bundling them is an error and CSS
/// rebasing leaves them untouched.
pub fn is_external_reference(value: &str) -> bool {
    let value = value.trim();
    external_reference_patterns()
        .iter()
        .any(|pattern| pattern.is_match(value))
}
