//! CODEOWNERS text → ordered ownership rules.

use std::collections::BTreeSet;

use globset::{GlobBuilder, GlobSetBuilder};

use super::owner::normalize_owner;
use super::types::{OwnershipRule, RulePattern};

/// Parse CODEOWNERS text into rules, preserving file order.
///
/// Blank lines and `#` comment lines are skipped, and a `#` token ends the
/// owner list of a rule. A line whose pattern `globset` rejects is logged and
/// skipped; the rest of the file still applies.
pub fn parse_codeowners(content: &str) -> Vec<OwnershipRule> {
    let mut rules = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        let Some(raw_pattern) = tokens.next() else {
            continue;
        };

        let pattern = match compile_pattern(raw_pattern) {
            Ok(p) => p,
            Err(e) => {
                log::warn!(
                    "CODEOWNERS line {line_no}: invalid pattern {raw_pattern:?} ({e}), skipping"
                );
                continue;
            }
        };

        let owners: BTreeSet<_> = tokens
            .take_while(|t| !t.starts_with('#'))
            .filter_map(normalize_owner)
            .collect();

        if owners.is_empty() {
            log::debug!("CODEOWNERS line {line_no}: {raw_pattern} has no owners");
        }

        rules.push(OwnershipRule {
            pattern,
            owners,
            line: line_no,
        });
    }

    rules
}

/// Compile a single CODEOWNERS pattern.
///
/// `*` is the global pattern. Anything else is a path glob: a leading `/`
/// anchors it at the repository root, otherwise it matches at any depth.
/// A trailing `/` matches everything beneath that directory. Without one, a
/// literal final segment matches the path itself or everything beneath a
/// directory of that name, while a wildcard final segment matches only at
/// its own level.
pub fn compile_pattern(raw: &str) -> Result<RulePattern, globset::Error> {
    if raw == "*" {
        return Ok(RulePattern::Global);
    }

    let globs = expand_pattern(raw);
    let mut builder = GlobSetBuilder::new();
    for glob in &globs {
        builder.add(GlobBuilder::new(glob).literal_separator(true).build()?);
    }

    Ok(RulePattern::Path {
        source: raw.to_string(),
        set: builder.build()?,
        globs,
    })
}

/// Rewrite a CODEOWNERS pattern into the rooted globs that implement it.
fn expand_pattern(raw: &str) -> Vec<String> {
    let rooted = raw.starts_with('/');
    let body = raw.trim_start_matches('/');
    let dir_only = body.ends_with('/');
    let body = body.trim_end_matches('/');

    if body.is_empty() {
        return vec!["**".to_string()];
    }

    let base = if rooted || body == "**" || body.starts_with("**/") {
        body.to_string()
    } else {
        format!("**/{body}")
    };

    let last = base.rsplit('/').next().unwrap_or(&base);
    if dir_only {
        vec![format!("{base}/**")]
    } else if last.contains(['*', '?', '[', '{']) {
        // `docs/*` covers direct children only
        vec![base]
    } else {
        let nested = format!("{base}/**");
        vec![base, nested]
    }
}
