use std::collections::BTreeSet;

/// Generate candidate relative paths for a manifest reference.
///
/// The query string and fragment are dropped, backslashes become forward slashes and leading
/// slashes are trimmed so the result can be joined onto a search root. Each configured URL prefix
/// that the path starts with yields an additional, shorter candidate. The order is deterministic:
/// the full path first, then prefix-stripped variants in configuration order.
pub fn generate_asset_candidates(reference: &str, url_prefixes: &[String]) -> Vec<String> {
    let mut builder = CandidateBuilder::new(reference);

    builder.add_trimmed_candidate();
    builder.add_prefix_candidates(url_prefixes);

    builder.finish()
}

struct CandidateBuilder {
    trimmed: Option<String>,
    seen: BTreeSet<String>,
    result: Vec<String>,
}

impl CandidateBuilder {
    fn new(reference: &str) -> Self {
        let without_suffix = reference
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim()
            .replace('\\', "/");
        let trimmed_value = without_suffix.trim_start_matches('/');
        let trimmed = if trimmed_value.is_empty() {
            None
        } else {
            Some(trimmed_value.to_string())
        };

        Self {
            trimmed,
            seen: BTreeSet::new(),
            result: Vec::new(),
        }
    }

    fn add_trimmed_candidate(&mut self) {
        if let Some(path) = self.trimmed.clone() {
            self.push(path);
        }
    }

    fn add_prefix_candidates(&mut self, url_prefixes: &[String]) {
        let Some(path) = self.trimmed.clone() else {
            return;
        };

        for prefix in url_prefixes {
            let prefix = prefix.trim_matches('/');
            if prefix.is_empty() {
                continue;
            }
            let stripped = path
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty());
            if let Some(rest) = stripped {
                self.push(rest.to_string());
            }
        }
    }

    fn finish(self) -> Vec<String> {
        self.result
    }

    fn push(&mut self, candidate: String) {
        if self.seen.insert(candidate.clone()) {
            self.result.push(candidate);
        }
    }
}
